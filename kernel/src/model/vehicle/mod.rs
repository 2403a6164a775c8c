use crate::model::{
    id::{UnitId, VehicleId},
    plate::Plate,
};
use serde::{Deserialize, Serialize};

pub mod event;

/// Vehicle type code as stored by the administration (1 = car, 2 = pickup, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct VehicleCategory(i32);

impl VehicleCategory {
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    pub fn raw(self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for VehicleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vehicle {
    pub vehicle_id: VehicleId,
    pub plate: Plate,
    pub category: VehicleCategory,
    // 居住者の車両であれば所属する住戸が入る。訪問者の事前登録車両は None
    pub owning_unit: Option<UnitId>,
}

impl Vehicle {
    pub fn is_resident(&self) -> bool {
        self.owning_unit.is_some()
    }
}
