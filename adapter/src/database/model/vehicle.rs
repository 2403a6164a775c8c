use kernel::model::{
    id::{UnitId, VehicleId},
    plate::Plate,
    vehicle::{Vehicle, VehicleCategory},
};

#[derive(sqlx::FromRow)]
pub struct VehicleRow {
    pub vehicle_id: VehicleId,
    pub plate: Plate,
    pub category: VehicleCategory,
    pub unit_id: Option<UnitId>,
}

impl From<VehicleRow> for Vehicle {
    fn from(value: VehicleRow) -> Self {
        let VehicleRow {
            vehicle_id,
            plate,
            category,
            unit_id,
        } = value;
        Vehicle {
            vehicle_id,
            plate,
            category,
            owning_unit: unit_id,
        }
    }
}
