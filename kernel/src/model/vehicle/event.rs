use crate::model::{id::UnitId, plate::Plate, vehicle::VehicleCategory};
use derive_new::new;

#[derive(new, Debug)]
pub struct CreateVehicle {
    pub plate: Plate,
    pub category: VehicleCategory,
    pub owning_unit: UnitId,
}

#[derive(new, Debug)]
pub struct RegisterVisitorVehicle {
    pub plate: Plate,
    pub category: VehicleCategory,
}

#[derive(new, Debug)]
pub struct UpdateVehicle {
    pub plate: Plate,
    pub category: VehicleCategory,
    pub requested_unit: UnitId,
}

#[derive(new, Debug)]
pub struct DeleteVehicle {
    pub plate: Plate,
    pub requested_unit: UnitId,
}
