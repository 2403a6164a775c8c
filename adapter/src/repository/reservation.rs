use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    id::{ReservationId, SpotNumber, UnitId},
    plate::Plate,
    reservation::{
        conflict::ReservationCandidate,
        event::{AssignSpot, CancelReservation, CreateReservation, UnassignSpot, UpdateReservation},
        Reservation, ReservationState,
    },
    spot::{Booking, SpotSchedule},
};
use kernel::repository::reservation::ReservationRepository;
use shared::error::{AppError, AppResult};
use sqlx::{Postgres, Transaction};

use crate::database::{
    model::{
        reservation::{BookingRow, ReservationRow, RESERVATION_COLUMNS},
        spot::{SpotOccupancyRow, SPOT_OCCUPANCY_SELECT},
    },
    set_transaction_serializable, ConnectionPool,
};

#[derive(new)]
pub struct ReservationRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl ReservationRepository for ReservationRepositoryImpl {
    // 予約を作成する。重複チェックと書き込みは一つのトランザクションで行う
    async fn create(
        &self,
        event: CreateReservation,
    ) -> AppResult<(ReservationId, ReservationState)> {
        let mut tx = self.db.begin().await?;
        set_transaction_serializable(&mut tx).await?;

        let visitor_registered = is_vehicle_registered(&mut tx, &event.plate).await?;
        let schedule = match event.spot {
            Some(spot) => Some(load_schedule(&mut tx, spot, None).await?),
            None => None,
        };
        let admission = ReservationCandidate {
            plate: &event.plate,
            start_time: event.start_time,
            end_time: event.end_time,
            visitor_registered,
            spot: schedule.as_ref(),
            excluding: None,
        }
        .check(event.requested_at)?;

        let reservation_id = ReservationId::new();
        let res = sqlx::query(
            r#"
                INSERT INTO reservations
                (reservation_id, plate, visitor_identity, unit_id,
                start_time, end_time, state, spot_number, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(reservation_id)
        .bind(&event.plate)
        .bind(&event.visitor_identity)
        .bind(&event.unit_id)
        .bind(admission.window.start())
        .bind(admission.window.end())
        .bind(admission.state.as_ref())
        .bind(event.spot)
        .bind(event.requested_at)
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No reservation record has been created".into(),
            ));
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        tracing::info!(
            reservation_id = %reservation_id,
            plate = %event.plate,
            unit_id = %event.unit_id,
            state = %admission.state,
            "Reservation created"
        );
        Ok((reservation_id, admission.state))
    }

    async fn find_by_unit(&self, unit_id: &UnitId) -> AppResult<Vec<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations \
             WHERE unit_id = $1 ORDER BY start_time DESC"
        );
        let rows: Vec<ReservationRow> = sqlx::query_as(&sql)
            .bind(unit_id)
            .fetch_all(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(Reservation::try_from).collect()
    }

    async fn find_by_id(
        &self,
        reservation_id: ReservationId,
        unit_id: &UnitId,
    ) -> AppResult<Reservation> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations \
             WHERE reservation_id = $1 AND unit_id = $2"
        );
        let row: Option<ReservationRow> = sqlx::query_as(&sql)
            .bind(reservation_id)
            .bind(unit_id)
            .fetch_optional(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        row.ok_or_else(|| not_found(reservation_id))?.try_into()
    }

    // 予約内容を変更する。自分自身とは重複しないものとしてチェックし直す
    async fn update(&self, event: UpdateReservation) -> AppResult<ReservationState> {
        let mut tx = self.db.begin().await?;
        set_transaction_serializable(&mut tx).await?;

        let current = find_owned(&mut tx, event.reservation_id, &event.requested_unit).await?;
        if current.state == ReservationState::Cancelled {
            return Err(AppError::UnprocessableEntity(format!(
                "reservation {} has been cancelled",
                event.reservation_id
            )));
        }

        let visitor_registered = is_vehicle_registered(&mut tx, &event.plate).await?;
        let schedule = match event.spot {
            Some(spot) => Some(load_schedule(&mut tx, spot, Some(event.reservation_id)).await?),
            None => None,
        };
        let admission = ReservationCandidate {
            plate: &event.plate,
            start_time: event.start_time,
            end_time: event.end_time,
            visitor_registered,
            spot: schedule.as_ref(),
            excluding: Some(event.reservation_id),
        }
        .check(event.requested_at)?;

        let res = sqlx::query(
            r#"
                UPDATE reservations
                SET plate = $1,
                    visitor_identity = $2,
                    start_time = $3,
                    end_time = $4,
                    state = $5,
                    spot_number = $6
                WHERE reservation_id = $7 AND unit_id = $8
            "#,
        )
        .bind(&event.plate)
        .bind(&event.visitor_identity)
        .bind(admission.window.start())
        .bind(admission.window.end())
        .bind(admission.state.as_ref())
        .bind(event.spot)
        .bind(event.reservation_id)
        .bind(&event.requested_unit)
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No reservation record has been updated".into(),
            ));
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(admission.state)
    }

    async fn cancel(&self, event: CancelReservation) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        set_transaction_serializable(&mut tx).await?;

        let current = find_owned(&mut tx, event.reservation_id, &event.requested_unit).await?;
        if current.state == ReservationState::Cancelled {
            return Err(AppError::UnprocessableEntity(format!(
                "reservation {} is already cancelled",
                event.reservation_id
            )));
        }

        // 取り消した予約は駐車枠を解放する
        let res = sqlx::query(
            r#"
                UPDATE reservations
                SET state = 'cancelled', spot_number = NULL
                WHERE reservation_id = $1 AND unit_id = $2
            "#,
        )
        .bind(event.reservation_id)
        .bind(&event.requested_unit)
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No reservation record has been cancelled".into(),
            ));
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        tracing::info!(reservation_id = %event.reservation_id, "Reservation cancelled");
        Ok(())
    }

    async fn assign_spot(&self, event: AssignSpot) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        set_transaction_serializable(&mut tx).await?;

        let current = find_owned(&mut tx, event.reservation_id, &event.requested_unit).await?;
        if !current.effective_state(event.requested_at).is_open() {
            return Err(AppError::UnprocessableEntity(format!(
                "reservation {} is no longer pending or active",
                event.reservation_id
            )));
        }

        let visitor_registered = is_vehicle_registered(&mut tx, &current.plate).await?;
        let schedule = load_schedule(&mut tx, event.spot, Some(current.reservation_id)).await?;
        ReservationCandidate {
            plate: &current.plate,
            start_time: current.window.start(),
            end_time: current.window.end(),
            visitor_registered,
            spot: Some(&schedule),
            excluding: Some(current.reservation_id),
        }
        .check(event.requested_at)?;

        let res = sqlx::query(
            r#"
                UPDATE reservations
                SET spot_number = $1
                WHERE reservation_id = $2 AND unit_id = $3
            "#,
        )
        .bind(event.spot)
        .bind(event.reservation_id)
        .bind(&event.requested_unit)
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No reservation record has been updated".into(),
            ));
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        tracing::info!(
            reservation_id = %event.reservation_id,
            spot = %event.spot,
            "Spot assigned"
        );
        Ok(())
    }

    async fn unassign_spot(&self, event: UnassignSpot) -> AppResult<()> {
        let res = sqlx::query(
            r#"
                UPDATE reservations
                SET spot_number = NULL
                WHERE reservation_id = $1 AND unit_id = $2
            "#,
        )
        .bind(event.reservation_id)
        .bind(&event.requested_unit)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(not_found(event.reservation_id));
        }
        Ok(())
    }
}

// 他の住戸の予約と存在しない予約は区別しない
fn not_found(reservation_id: ReservationId) -> AppError {
    AppError::EntityNotFound(format!("reservation {reservation_id} not found"))
}

async fn find_owned(
    tx: &mut Transaction<'_, Postgres>,
    reservation_id: ReservationId,
    unit_id: &UnitId,
) -> AppResult<Reservation> {
    let sql = format!(
        "SELECT {RESERVATION_COLUMNS} FROM reservations \
         WHERE reservation_id = $1 AND unit_id = $2"
    );
    let row: Option<ReservationRow> = sqlx::query_as(&sql)
        .bind(reservation_id)
        .bind(unit_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

    row.ok_or_else(|| not_found(reservation_id))?.try_into()
}

async fn is_vehicle_registered(
    tx: &mut Transaction<'_, Postgres>,
    plate: &Plate,
) -> AppResult<bool> {
    let (exists,): (bool,) =
        sqlx::query_as("SELECT EXISTS (SELECT 1 FROM vehicles WHERE plate = $1)")
            .bind(plate)
            .fetch_one(&mut **tx)
            .await
            .map_err(AppError::SpecificOperationError)?;
    Ok(exists)
}

// 編集中の予約自身の入庫は在車として数えない
pub(crate) async fn load_schedule(
    tx: &mut Transaction<'_, Postgres>,
    spot: SpotNumber,
    excluding: Option<ReservationId>,
) -> AppResult<SpotSchedule> {
    let sql = format!("{SPOT_OCCUPANCY_SELECT} WHERE p.spot_number = $2");
    let occupancy: SpotOccupancyRow = sqlx::query_as(&sql)
        .bind(excluding)
        .bind(spot)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::SpecificOperationError)?
        .ok_or_else(|| AppError::EntityNotFound(format!("parking spot {spot} not found")))?;

    let rows: Vec<BookingRow> = sqlx::query_as(
        r#"
            SELECT reservation_id, spot_number, start_time, end_time, state
            FROM reservations
            WHERE spot_number = $1 AND state IN ('pending', 'active')
        "#,
    )
    .bind(spot)
    .fetch_all(&mut **tx)
    .await
    .map_err(AppError::SpecificOperationError)?;

    Ok(SpotSchedule {
        spot: occupancy.spot_number,
        occupied: occupancy.occupied,
        bookings: rows
            .into_iter()
            .map(Booking::try_from)
            .collect::<AppResult<Vec<_>>>()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use kernel::model::access::{event::RegisterEntry, AccessKind, AccessMethod};
    use kernel::model::spot::SpotStatus;
    use kernel::repository::{access::AccessRepository, spot::SpotRepository};

    use crate::repository::{access::AccessRepositoryImpl, spot::SpotRepositoryImpl};

    fn plate(raw: &str) -> Plate {
        Plate::parse(raw).unwrap()
    }

    fn create(
        plate_text: &str,
        unit: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        spot: Option<i32>,
        now: DateTime<Utc>,
    ) -> CreateReservation {
        CreateReservation::new(
            plate(plate_text),
            "Ana Perez".into(),
            UnitId::new(unit),
            start,
            end,
            spot.map(SpotNumber::new),
            now,
        )
    }

    #[sqlx::test(
        migrations = "./migrations",
        fixtures(path = "../../fixtures", scripts("parking"))
    )]
    #[ignore]
    async fn overlapping_reservation_on_same_spot_is_rejected(
        pool: sqlx::PgPool,
    ) -> anyhow::Result<()> {
        let repo = ReservationRepositoryImpl::new(ConnectionPool::new(pool));
        let now = Utc::now();
        let start = now + Duration::hours(1);

        let (_, state) = repo
            .create(create("VIS111", "204", start, start + Duration::hours(1), Some(5), now))
            .await?;
        assert_eq!(state, ReservationState::Pending);

        // 終了時刻ちょうどに始まる予約は重ならない
        let adjacent = repo
            .create(create(
                "VIS222",
                "204",
                start + Duration::hours(1),
                start + Duration::hours(2),
                Some(5),
                now,
            ))
            .await;
        assert!(adjacent.is_ok());

        let nested = repo
            .create(create(
                "VIS222",
                "101",
                start + Duration::minutes(30),
                start + Duration::minutes(45),
                Some(5),
                now,
            ))
            .await;
        assert!(matches!(nested, Err(AppError::OverlapConflict(5))));
        Ok(())
    }

    #[sqlx::test(
        migrations = "./migrations",
        fixtures(path = "../../fixtures", scripts("parking"))
    )]
    #[ignore]
    async fn occupied_spot_accepts_only_future_windows(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = ReservationRepositoryImpl::new(ConnectionPool::new(pool));
        let now = Utc::now();

        let immediate = repo
            .create(create("VIS111", "204", now, now + Duration::hours(1), Some(3), now))
            .await;
        assert!(matches!(immediate, Err(AppError::CurrentlyOccupiedConflict(3))));

        let (_, state) = repo
            .create(create(
                "VIS111",
                "204",
                now + Duration::hours(2),
                now + Duration::hours(3),
                Some(3),
                now,
            ))
            .await?;
        assert_eq!(state, ReservationState::Pending);
        Ok(())
    }

    #[sqlx::test(
        migrations = "./migrations",
        fixtures(path = "../../fixtures", scripts("parking"))
    )]
    #[ignore]
    async fn unknown_visitor_vehicle_is_rejected(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = ReservationRepositoryImpl::new(ConnectionPool::new(pool));
        let now = Utc::now();
        let res = repo
            .create(create("NEW999", "204", now, now + Duration::hours(1), None, now))
            .await;
        assert!(matches!(res, Err(AppError::UnknownVisitorVehicle(p)) if p == "NEW999"));
        Ok(())
    }

    #[sqlx::test(
        migrations = "./migrations",
        fixtures(path = "../../fixtures", scripts("parking"))
    )]
    #[ignore]
    async fn other_units_cannot_see_or_cancel(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = ReservationRepositoryImpl::new(ConnectionPool::new(pool));
        let now = Utc::now();
        let (id, state) = repo
            .create(create("VIS111", "204", now, now + Duration::hours(1), None, now))
            .await?;
        assert_eq!(state, ReservationState::Active);

        let res = repo.find_by_id(id, &UnitId::new("101")).await;
        assert!(matches!(res, Err(AppError::EntityNotFound(_))));
        let res = repo
            .cancel(CancelReservation::new(id, UnitId::new("101")))
            .await;
        assert!(matches!(res, Err(AppError::EntityNotFound(_))));

        repo.assign_spot(AssignSpot::new(id, UnitId::new("204"), SpotNumber::new(5), now))
            .await?;
        let stored = repo.find_by_id(id, &UnitId::new("204")).await?;
        assert_eq!(stored.spot, Some(SpotNumber::new(5)));

        repo.cancel(CancelReservation::new(id, UnitId::new("204")))
            .await?;
        let stored = repo.find_by_id(id, &UnitId::new("204")).await?;
        assert_eq!(stored.state, ReservationState::Cancelled);
        assert_eq!(stored.spot, None);
        Ok(())
    }

    #[sqlx::test(
        migrations = "./migrations",
        fixtures(path = "../../fixtures", scripts("parking"))
    )]
    #[ignore]
    async fn edit_does_not_conflict_with_itself(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = ReservationRepositoryImpl::new(ConnectionPool::new(pool));
        let now = Utc::now();
        let start = now + Duration::hours(1);
        let (id, _) = repo
            .create(create("VIS111", "204", start, start + Duration::hours(1), Some(5), now))
            .await?;

        let state = repo
            .update(UpdateReservation::new(
                id,
                UnitId::new("204"),
                plate("VIS111"),
                "Ana Perez".into(),
                start + Duration::minutes(30),
                start + Duration::minutes(90),
                Some(SpotNumber::new(5)),
                now,
            ))
            .await?;
        assert_eq!(state, ReservationState::Pending);
        Ok(())
    }

    #[sqlx::test(
        migrations = "./migrations",
        fixtures(path = "../../fixtures", scripts("parking"))
    )]
    #[ignore]
    async fn parked_visitor_can_extend_own_reservation(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let db = ConnectionPool::new(pool);
        let repo = ReservationRepositoryImpl::new(db.clone());
        let access = AccessRepositoryImpl::new(db.clone());
        let spots = SpotRepositoryImpl::new(db);
        let now = Utc::now();
        let start = now - Duration::minutes(10);
        let end = now + Duration::hours(1);

        let (id, _) = repo
            .create(create("VIS111", "204", start, end, Some(5), now))
            .await?;
        access
            .register_entry(RegisterEntry::new(
                AccessKind::Visitor,
                plate("VIS111"),
                AccessMethod::Automatic,
                now,
            ))
            .await?;

        let state = repo
            .update(UpdateReservation::new(
                id,
                UnitId::new("204"),
                plate("VIS111"),
                "Ana Perez".into(),
                start,
                end + Duration::hours(1),
                Some(SpotNumber::new(5)),
                now,
            ))
            .await?;
        assert_eq!(state, ReservationState::Active);

        // 空き状況では在車のまま
        let availability = spots.availability(now).await?;
        let spot = availability
            .spots
            .iter()
            .find(|s| s.spot == SpotNumber::new(5))
            .unwrap();
        assert_eq!(spot.status, SpotStatus::Ocupado);
        Ok(())
    }

    #[sqlx::test(
        migrations = "./migrations",
        fixtures(path = "../../fixtures", scripts("parking"))
    )]
    #[ignore]
    async fn concurrent_overlapping_creates_admit_at_most_one(
        pool: sqlx::PgPool,
    ) -> anyhow::Result<()> {
        let db = ConnectionPool::new(pool);
        let first = ReservationRepositoryImpl::new(db.clone());
        let second = ReservationRepositoryImpl::new(db);
        let now = Utc::now();

        for round in 0..10 {
            let start = now + Duration::hours(2 * round + 1);
            let (a, b) = tokio::join!(
                first.create(create("VIS111", "204", start, start + Duration::hours(1), Some(5), now)),
                second.create(create(
                    "VIS222",
                    "101",
                    start + Duration::minutes(30),
                    start + Duration::minutes(90),
                    Some(5),
                    now,
                )),
            );
            assert!(
                !(a.is_ok() && b.is_ok()),
                "both overlapping reservations were accepted in round {round}"
            );
        }
        Ok(())
    }
}
