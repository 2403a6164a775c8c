use async_trait::async_trait;
use shared::error::AppResult;

use crate::model::{
    id::{ReservationId, UnitId},
    reservation::{
        event::{AssignSpot, CancelReservation, CreateReservation, UnassignSpot, UpdateReservation},
        Reservation, ReservationState,
    },
};

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    // 予約を作成し、保存された状態を返す
    async fn create(&self, event: CreateReservation)
        -> AppResult<(ReservationId, ReservationState)>;
    // 住戸の予約一覧を取得する
    async fn find_by_unit(&self, unit_id: &UnitId) -> AppResult<Vec<Reservation>>;
    // 他の住戸の予約は存在しないものとして扱う
    async fn find_by_id(
        &self,
        reservation_id: ReservationId,
        unit_id: &UnitId,
    ) -> AppResult<Reservation>;
    async fn update(&self, event: UpdateReservation) -> AppResult<ReservationState>;
    async fn cancel(&self, event: CancelReservation) -> AppResult<()>;
    async fn assign_spot(&self, event: AssignSpot) -> AppResult<()>;
    async fn unassign_spot(&self, event: UnassignSpot) -> AppResult<()>;
}

