use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::error::AppResult;

use crate::model::{
    access::{
        event::{RegisterEntry, RegisterExit},
        AccessEvent, AccessOutcome,
    },
    id::{AccessEventId, UnitId},
    plate::Plate,
    vehicle::VehicleCategory,
};

#[async_trait]
pub trait AccessRepository: Send + Sync {
    // 失敗も AccessOutcome::ResolutionFailed として返すので Result ではない
    async fn resolve(
        &self,
        plate: &Plate,
        category: VehicleCategory,
        now: DateTime<Utc>,
    ) -> AccessOutcome;
    // 入庫を記録する。resolve 時点の認可が失われていれば StaleAuthorization
    async fn register_entry(&self, event: RegisterEntry) -> AppResult<AccessEventId>;
    // 入庫中の車両の出庫を記録する
    async fn register_exit(&self, event: RegisterExit) -> AppResult<AccessEventId>;
}

#[derive(Debug, Clone)]
pub struct AccessHistoryQuery {
    pub plate_contains: Option<String>,
    pub limit: i64,
}

impl AccessHistoryQuery {
    pub const DEFAULT_LIMIT: i64 = 200;
    pub const MAX_LIMIT: i64 = 1000;

    pub fn new(plate_contains: Option<String>, limit: Option<i64>) -> Self {
        let plate_contains = plate_contains
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());
        let limit = limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT);
        Self {
            plate_contains,
            limit,
        }
    }
}

#[async_trait]
pub trait AccessHistoryRepository: Send + Sync {
    // 住戸の車両・予約に紐づく入出庫記録を新しい順に取得する
    async fn find_by_unit(
        &self,
        unit_id: &UnitId,
        query: AccessHistoryQuery,
    ) -> AppResult<Vec<AccessEvent>>;
}
