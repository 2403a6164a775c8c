use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    id::{UnitId, VehicleId},
    vehicle::{
        event::{CreateVehicle, DeleteVehicle, RegisterVisitorVehicle, UpdateVehicle},
        Vehicle,
    },
};
use kernel::repository::vehicle::VehicleRepository;
use shared::error::{AppError, AppResult};

use crate::database::{
    model::vehicle::VehicleRow, set_transaction_serializable, ConnectionPool,
};

#[derive(new)]
pub struct VehicleRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl VehicleRepository for VehicleRepositoryImpl {
    async fn create(&self, event: CreateVehicle) -> AppResult<VehicleId> {
        // 訪問者として事前登録されていたナンバーは住戸の車両として引き取る
        let row: Option<(VehicleId,)> = sqlx::query_as(
            r#"
                INSERT INTO vehicles (vehicle_id, plate, category, unit_id)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (plate) DO UPDATE
                SET category = EXCLUDED.category, unit_id = EXCLUDED.unit_id
                WHERE vehicles.unit_id IS NULL
                RETURNING vehicle_id
            "#,
        )
        .bind(VehicleId::new())
        .bind(&event.plate)
        .bind(event.category)
        .bind(&event.owning_unit)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        let (vehicle_id,) = row.ok_or_else(|| {
            AppError::UnprocessableEntity(format!(
                "plate {} is already registered to a unit",
                event.plate
            ))
        })?;
        tracing::info!(plate = %event.plate, unit_id = %event.owning_unit, "Resident vehicle registered");
        Ok(vehicle_id)
    }

    async fn register_visitor(&self, event: RegisterVisitorVehicle) -> AppResult<VehicleId> {
        let mut tx = self.db.begin().await?;
        set_transaction_serializable(&mut tx).await?;

        let inserted: Option<(VehicleId,)> = sqlx::query_as(
            r#"
                INSERT INTO vehicles (vehicle_id, plate, category, unit_id)
                VALUES ($1, $2, $3, NULL)
                ON CONFLICT (plate) DO NOTHING
                RETURNING vehicle_id
            "#,
        )
        .bind(VehicleId::new())
        .bind(&event.plate)
        .bind(event.category)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let vehicle_id = match inserted {
            Some((vehicle_id,)) => vehicle_id,
            None => {
                let (vehicle_id,): (VehicleId,) =
                    sqlx::query_as("SELECT vehicle_id FROM vehicles WHERE plate = $1")
                        .bind(&event.plate)
                        .fetch_one(&mut *tx)
                        .await
                        .map_err(AppError::SpecificOperationError)?;
                vehicle_id
            }
        };

        tx.commit().await.map_err(AppError::TransactionError)?;
        Ok(vehicle_id)
    }

    async fn find_by_unit(&self, unit_id: &UnitId) -> AppResult<Vec<Vehicle>> {
        let rows: Vec<VehicleRow> = sqlx::query_as(
            r#"
                SELECT vehicle_id, plate, category, unit_id
                FROM vehicles
                WHERE unit_id = $1
                ORDER BY plate
            "#,
        )
        .bind(unit_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(rows.into_iter().map(Vehicle::from).collect())
    }

    async fn update(&self, event: UpdateVehicle) -> AppResult<()> {
        let res = sqlx::query(
            r#"
                UPDATE vehicles
                SET category = $1
                WHERE plate = $2 AND unit_id = $3
            "#,
        )
        .bind(event.category)
        .bind(&event.plate)
        .bind(&event.requested_unit)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(format!(
                "vehicle {} not found",
                event.plate
            )));
        }
        Ok(())
    }

    async fn delete(&self, event: DeleteVehicle) -> AppResult<()> {
        let res = sqlx::query(
            r#"
                DELETE FROM vehicles
                WHERE plate = $1 AND unit_id = $2
            "#,
        )
        .bind(&event.plate)
        .bind(&event.requested_unit)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(format!(
                "vehicle {} not found",
                event.plate
            )));
        }
        Ok(())
    }
}
