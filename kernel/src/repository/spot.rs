use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::error::AppResult;

use crate::model::spot::{event::UpdateOccupancy, Availability};

#[async_trait]
pub trait SpotRepository: Send + Sync {
    async fn availability(&self, now: DateTime<Utc>) -> AppResult<Availability>;
    async fn update_occupancy(&self, event: UpdateOccupancy) -> AppResult<()>;
}
