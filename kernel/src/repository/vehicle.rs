use async_trait::async_trait;
use shared::error::AppResult;

use crate::model::{
    id::{UnitId, VehicleId},
    vehicle::{
        event::{CreateVehicle, DeleteVehicle, RegisterVisitorVehicle, UpdateVehicle},
        Vehicle,
    },
};

#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn create(&self, event: CreateVehicle) -> AppResult<VehicleId>;
    // 訪問者車両の事前登録。すでに登録済みのナンバーはそのまま返す
    async fn register_visitor(&self, event: RegisterVisitorVehicle) -> AppResult<VehicleId>;
    async fn find_by_unit(&self, unit_id: &UnitId) -> AppResult<Vec<Vehicle>>;
    async fn update(&self, event: UpdateVehicle) -> AppResult<()>;
    async fn delete(&self, event: DeleteVehicle) -> AppResult<()>;
}
