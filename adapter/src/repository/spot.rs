use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_new::new;
use kernel::model::{
    id::{ReservationId, SpotNumber},
    spot::{event::UpdateOccupancy, Availability, Booking, SpotSchedule},
};
use kernel::repository::spot::SpotRepository;
use shared::error::{AppError, AppResult};

use crate::database::{
    model::{
        reservation::BookingRow,
        spot::{SpotOccupancyRow, SPOT_OCCUPANCY_SELECT},
    },
    set_transaction_read_only_snapshot, ConnectionPool,
};

#[derive(new)]
pub struct SpotRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl SpotRepository for SpotRepositoryImpl {
    async fn availability(&self, now: DateTime<Utc>) -> AppResult<Availability> {
        let mut tx = self.db.begin().await?;
        set_transaction_read_only_snapshot(&mut tx).await?;

        let spots: Vec<SpotOccupancyRow> = sqlx::query_as(SPOT_OCCUPANCY_SELECT)
            .bind(None::<ReservationId>)
            .fetch_all(&mut *tx)
            .await
            .map_err(AppError::SpecificOperationError)?;

        let bookings: Vec<BookingRow> = sqlx::query_as(
            r#"
                SELECT reservation_id, spot_number, start_time, end_time, state
                FROM reservations
                WHERE spot_number IS NOT NULL AND state IN ('pending', 'active')
            "#,
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        tx.commit().await.map_err(AppError::TransactionError)?;

        let mut by_spot: HashMap<SpotNumber, Vec<Booking>> = HashMap::new();
        for row in bookings {
            let spot = row.spot_number;
            by_spot.entry(spot).or_default().push(Booking::try_from(row)?);
        }

        let schedules: Vec<SpotSchedule> = spots
            .into_iter()
            .map(|row| SpotSchedule {
                spot: row.spot_number,
                occupied: row.occupied,
                bookings: by_spot.remove(&row.spot_number).unwrap_or_default(),
            })
            .collect();

        Ok(Availability::from_schedules(&schedules, now))
    }

    async fn update_occupancy(&self, event: UpdateOccupancy) -> AppResult<()> {
        sqlx::query(
            r#"
                INSERT INTO parking_spots (spot_number, occupied, updated_at)
                VALUES ($1, $2, CURRENT_TIMESTAMP)
                ON CONFLICT (spot_number) DO UPDATE
                SET occupied = EXCLUDED.occupied, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(event.spot)
        .bind(event.occupied)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        tracing::debug!(spot = %event.spot, occupied = event.occupied, "Occupancy updated");
        Ok(())
    }
}
