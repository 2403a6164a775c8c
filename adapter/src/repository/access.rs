use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_new::new;
use kernel::model::{
    access::{
        event::{RegisterEntry, RegisterExit},
        resolution::{decide, revalidate},
        AccessEvent, AccessLink, AccessMethod, AccessOutcome, EventType,
    },
    id::{AccessEventId, ReservationId, UnitId},
    plate::Plate,
    reservation::Reservation,
    vehicle::{Vehicle, VehicleCategory},
};
use kernel::repository::access::{AccessHistoryQuery, AccessHistoryRepository, AccessRepository};
use shared::error::{AppError, AppResult};
use sqlx::{Postgres, Transaction};

use crate::database::{
    model::{
        access::{AccessEventRow, AccessLinkColumns},
        reservation::{ReservationRow, RESERVATION_COLUMNS},
        vehicle::VehicleRow,
    },
    set_transaction_read_only_snapshot, set_transaction_serializable, ConnectionPool,
};

#[derive(new)]
pub struct AccessRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl AccessRepository for AccessRepositoryImpl {
    async fn resolve(
        &self,
        plate: &Plate,
        category: VehicleCategory,
        now: DateTime<Utc>,
    ) -> AccessOutcome {
        match self.snapshot(plate).await {
            Ok((resident, reservations)) => {
                decide(category, resident.as_ref(), &reservations, now)
            }
            Err(e) => {
                tracing::error!(plate = %plate, error = %e, "Failed to resolve plate");
                AccessOutcome::ResolutionFailed {
                    cause: e.to_string(),
                }
            }
        }
    }

    async fn register_entry(&self, event: RegisterEntry) -> AppResult<AccessEventId> {
        let mut tx = self.db.begin().await?;
        set_transaction_serializable(&mut tx).await?;

        // resolve の後に状態が変わっていないかをトランザクション内で再確認する
        let resident = find_resident_vehicle(&mut tx, &event.plate).await?;
        let reservations = find_open_reservations(&mut tx, &event.plate).await?;
        let link = revalidate(
            event.kind,
            &event.plate,
            resident.as_ref(),
            &reservations,
            event.occurred_at,
        )?;

        let access_event_id = insert_event(
            &mut tx,
            EventType::Entry,
            event.method,
            &event.plate,
            event.occurred_at,
            link,
        )
        .await?;

        tx.commit().await.map_err(AppError::TransactionError)?;

        tracing::info!(
            plate = %event.plate,
            kind = %event.kind,
            access_event_id = %access_event_id,
            "Entry registered"
        );
        Ok(access_event_id)
    }

    async fn register_exit(&self, event: RegisterExit) -> AppResult<AccessEventId> {
        let mut tx = self.db.begin().await?;
        set_transaction_serializable(&mut tx).await?;

        let link = match find_resident_vehicle(&mut tx, &event.plate).await? {
            Some(vehicle) => AccessLink::Vehicle(vehicle.vehicle_id),
            None => find_open_visit(&mut tx, &event.plate)
                .await?
                .map(AccessLink::Reservation)
                .ok_or_else(|| {
                    AppError::EntityNotFound(format!(
                        "no resident vehicle or open visit found for plate {}",
                        event.plate
                    ))
                })?,
        };

        let access_event_id = insert_event(
            &mut tx,
            EventType::Exit,
            event.method,
            &event.plate,
            event.occurred_at,
            link,
        )
        .await?;

        tx.commit().await.map_err(AppError::TransactionError)?;

        tracing::info!(plate = %event.plate, access_event_id = %access_event_id, "Exit registered");
        Ok(access_event_id)
    }
}

#[async_trait]
impl AccessHistoryRepository for AccessRepositoryImpl {
    async fn find_by_unit(
        &self,
        unit_id: &UnitId,
        query: AccessHistoryQuery,
    ) -> AppResult<Vec<AccessEvent>> {
        let rows: Vec<AccessEventRow> = sqlx::query_as(
            r#"
                SELECT
                    e.access_event_id,
                    e.occurred_at,
                    e.event_type,
                    e.method,
                    e.detected_plate,
                    e.vehicle_id,
                    e.reservation_id
                FROM access_events e
                LEFT JOIN vehicles v ON v.vehicle_id = e.vehicle_id
                LEFT JOIN reservations r ON r.reservation_id = e.reservation_id
                WHERE (v.unit_id = $1 OR r.unit_id = $1)
                  AND ($2::TEXT IS NULL OR strpos(upper(e.detected_plate), upper($2)) > 0)
                ORDER BY e.occurred_at DESC
                LIMIT $3
            "#,
        )
        .bind(unit_id)
        .bind(query.plate_contains)
        .bind(query.limit)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(AccessEvent::try_from).collect()
    }
}

impl AccessRepositoryImpl {
    async fn snapshot(&self, plate: &Plate) -> AppResult<(Option<Vehicle>, Vec<Reservation>)> {
        let mut tx = self.db.begin().await?;
        set_transaction_read_only_snapshot(&mut tx).await?;
        let resident = find_resident_vehicle(&mut tx, plate).await?;
        let reservations = find_open_reservations(&mut tx, plate).await?;
        tx.commit().await.map_err(AppError::TransactionError)?;
        Ok((resident, reservations))
    }
}

async fn find_resident_vehicle(
    tx: &mut Transaction<'_, Postgres>,
    plate: &Plate,
) -> AppResult<Option<Vehicle>> {
    let row: Option<VehicleRow> = sqlx::query_as(
        r#"
            SELECT vehicle_id, plate, category, unit_id
            FROM vehicles
            WHERE plate = $1 AND unit_id IS NOT NULL
        "#,
    )
    .bind(plate)
    .fetch_optional(&mut **tx)
    .await
    .map_err(AppError::SpecificOperationError)?;

    Ok(row.map(Vehicle::from))
}

// 取り消し済みを除いた予約。有効かどうかの判断は呼び出し側で時刻をもとに行う
async fn find_open_reservations(
    tx: &mut Transaction<'_, Postgres>,
    plate: &Plate,
) -> AppResult<Vec<Reservation>> {
    let sql = format!(
        "SELECT {RESERVATION_COLUMNS} FROM reservations \
         WHERE plate = $1 AND state IN ('pending', 'active') \
         ORDER BY start_time"
    );
    let rows: Vec<ReservationRow> = sqlx::query_as(&sql)
        .bind(plate)
        .fetch_all(&mut **tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

    rows.into_iter().map(Reservation::try_from).collect()
}

// 出庫記録のない訪問者の入庫のうち最新のもの
async fn find_open_visit(
    tx: &mut Transaction<'_, Postgres>,
    plate: &Plate,
) -> AppResult<Option<ReservationId>> {
    let row: Option<(ReservationId,)> = sqlx::query_as(
        r#"
            SELECT e.reservation_id
            FROM access_events e
            WHERE e.detected_plate = $1
              AND e.event_type = 'entry'
              AND e.reservation_id IS NOT NULL
              AND NOT EXISTS (
                  SELECT 1
                  FROM access_events x
                  WHERE x.reservation_id = e.reservation_id
                    AND x.event_type = 'exit'
                    AND x.occurred_at >= e.occurred_at
              )
            ORDER BY e.occurred_at DESC
            LIMIT 1
        "#,
    )
    .bind(plate)
    .fetch_optional(&mut **tx)
    .await
    .map_err(AppError::SpecificOperationError)?;

    Ok(row.map(|(reservation_id,)| reservation_id))
}

async fn insert_event(
    tx: &mut Transaction<'_, Postgres>,
    event_type: EventType,
    method: AccessMethod,
    plate: &Plate,
    occurred_at: DateTime<Utc>,
    link: AccessLink,
) -> AppResult<AccessEventId> {
    let access_event_id = AccessEventId::new();
    let AccessLinkColumns {
        vehicle_id,
        reservation_id,
    } = link.into();

    let res = sqlx::query(
        r#"
            INSERT INTO access_events
            (access_event_id, occurred_at, event_type, method, detected_plate, vehicle_id, reservation_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(access_event_id)
    .bind(occurred_at)
    .bind(event_type.as_ref())
    .bind(method.as_ref())
    .bind(plate)
    .bind(vehicle_id)
    .bind(reservation_id)
    .execute(&mut **tx)
    .await
    .map_err(AppError::SpecificOperationError)?;

    if res.rows_affected() < 1 {
        return Err(AppError::NoRowsAffectedError(
            "No access event record has been created".into(),
        ));
    }

    Ok(access_event_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::model::{
        access::{AccessKind, Authorization, DenialReason},
        id::SpotNumber,
        reservation::event::{CancelReservation, CreateReservation},
    };
    use kernel::repository::reservation::ReservationRepository;

    use crate::repository::reservation::ReservationRepositoryImpl;

    fn plate(raw: &str) -> Plate {
        Plate::parse(raw).unwrap()
    }

    #[sqlx::test(
        migrations = "./migrations",
        fixtures(path = "../../fixtures", scripts("parking"))
    )]
    #[ignore]
    async fn resident_entry_and_exit_are_logged(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = AccessRepositoryImpl::new(ConnectionPool::new(pool));
        let now = Utc::now();

        let outcome = repo.resolve(&plate("abc123"), VehicleCategory::new(1), now).await;
        assert_eq!(
            outcome,
            AccessOutcome::Authorized(Authorization::Resident {
                unit_id: UnitId::new("101")
            })
        );
        let outcome = repo.resolve(&plate("ABC123"), VehicleCategory::new(2), now).await;
        assert!(matches!(
            outcome,
            AccessOutcome::Unauthorized(DenialReason::CategoryMismatch { .. })
        ));
        let outcome = repo.resolve(&plate("ZZZ999"), VehicleCategory::new(1), now).await;
        assert_eq!(outcome, AccessOutcome::Unauthorized(DenialReason::NotFound));

        let entry = repo
            .register_entry(RegisterEntry::new(
                AccessKind::Resident,
                plate("ABC123"),
                AccessMethod::Automatic,
                now,
            ))
            .await?;
        let exit = repo
            .register_exit(RegisterExit::new(plate("ABC123"), AccessMethod::Manual, now))
            .await?;
        assert_ne!(entry, exit);

        let history = repo
            .find_by_unit(&UnitId::new("101"), AccessHistoryQuery::new(Some("abc".into()), None))
            .await?;
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|e| e.link.kind() == AccessKind::Resident));

        let other_unit = repo
            .find_by_unit(&UnitId::new("204"), AccessHistoryQuery::new(None, None))
            .await?;
        assert!(other_unit.is_empty());
        Ok(())
    }

    #[sqlx::test(
        migrations = "./migrations",
        fixtures(path = "../../fixtures", scripts("parking"))
    )]
    #[ignore]
    async fn cancelled_reservation_between_resolve_and_register_is_stale(
        pool: sqlx::PgPool,
    ) -> anyhow::Result<()> {
        let db = ConnectionPool::new(pool);
        let access = AccessRepositoryImpl::new(db.clone());
        let reservations = ReservationRepositoryImpl::new(db);
        let now = Utc::now();

        let (reservation_id, _) = reservations
            .create(CreateReservation::new(
                plate("VIS111"),
                "Ana Perez".into(),
                UnitId::new("204"),
                now - chrono::Duration::minutes(5),
                now + chrono::Duration::hours(1),
                Some(SpotNumber::new(5)),
                now,
            ))
            .await?;

        let outcome = access.resolve(&plate("VIS111"), VehicleCategory::new(1), now).await;
        assert_eq!(
            outcome,
            AccessOutcome::Authorized(Authorization::Visitor {
                reservation_id,
                unit_id: UnitId::new("204"),
            })
        );

        reservations
            .cancel(CancelReservation::new(reservation_id, UnitId::new("204")))
            .await?;

        let res = access
            .register_entry(RegisterEntry::new(
                AccessKind::Visitor,
                plate("VIS111"),
                AccessMethod::Automatic,
                now,
            ))
            .await;
        assert!(matches!(res, Err(AppError::StaleAuthorization { .. })));
        Ok(())
    }

    #[sqlx::test(
        migrations = "./migrations",
        fixtures(path = "../../fixtures", scripts("parking"))
    )]
    #[ignore]
    async fn exit_without_open_visit_is_not_found(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = AccessRepositoryImpl::new(ConnectionPool::new(pool));
        let res = repo
            .register_exit(RegisterExit::new(plate("VIS222"), AccessMethod::Manual, Utc::now()))
            .await;
        assert!(matches!(res, Err(AppError::EntityNotFound(_))));
        Ok(())
    }
}
