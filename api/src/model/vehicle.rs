use derive_new::new;
use garde::Validate;
use kernel::model::{
    id::{UnitId, VehicleId},
    plate::Plate,
    vehicle::{
        event::{CreateVehicle, RegisterVisitorVehicle},
        Vehicle, VehicleCategory,
    },
};
use serde::{Deserialize, Serialize};
use shared::error::AppError;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicleRequest {
    #[garde(length(min = 1, max = 16))]
    pub plate: String,
    #[garde(range(min = 1))]
    pub category: i32,
}

#[derive(new)]
pub struct CreateVehicleRequestWithUnit(pub UnitId, pub CreateVehicleRequest);

impl TryFrom<CreateVehicleRequestWithUnit> for CreateVehicle {
    type Error = AppError;

    fn try_from(value: CreateVehicleRequestWithUnit) -> Result<Self, Self::Error> {
        let CreateVehicleRequestWithUnit(owning_unit, CreateVehicleRequest { plate, category }) =
            value;
        Ok(CreateVehicle {
            plate: Plate::parse(&plate)?,
            category: VehicleCategory::new(category),
            owning_unit,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterVisitorVehicleRequest {
    #[garde(length(min = 1, max = 16))]
    pub plate: String,
    #[garde(range(min = 1))]
    pub category: i32,
}

impl TryFrom<RegisterVisitorVehicleRequest> for RegisterVisitorVehicle {
    type Error = AppError;

    fn try_from(value: RegisterVisitorVehicleRequest) -> Result<Self, Self::Error> {
        Ok(RegisterVisitorVehicle {
            plate: Plate::parse(&value.plate)?,
            category: VehicleCategory::new(value.category),
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehicleRequest {
    #[garde(range(min = 1))]
    pub category: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleIdResponse {
    pub vehicle_id: VehicleId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclesResponse {
    pub items: Vec<VehicleResponse>,
}

impl From<Vec<Vehicle>> for VehiclesResponse {
    fn from(value: Vec<Vehicle>) -> Self {
        Self {
            items: value.into_iter().map(VehicleResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleResponse {
    pub vehicle_id: VehicleId,
    pub plate: String,
    pub category: i32,
}

impl From<Vehicle> for VehicleResponse {
    fn from(value: Vehicle) -> Self {
        let Vehicle {
            vehicle_id,
            plate,
            category,
            ..
        } = value;
        Self {
            vehicle_id,
            plate: plate.into(),
            category: category.raw(),
        }
    }
}
