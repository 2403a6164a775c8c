use std::sync::Arc;

use adapter::redis::RedisClient;
use adapter::repository::{
    access::AccessRepositoryImpl, auth::AuthRepositoryImpl, health::HealthCheckRepositoryImpl,
    reservation::ReservationRepositoryImpl, spot::SpotRepositoryImpl,
    vehicle::VehicleRepositoryImpl,
};
use adapter::database::ConnectionPool;
use kernel::repository::{
    access::{AccessHistoryRepository, AccessRepository},
    auth::AuthRepository,
    health::HealthCheckRepository,
    reservation::ReservationRepository,
    spot::SpotRepository,
    vehicle::VehicleRepository,
};
use shared::config::AppConfig;

#[derive(Clone)]
pub struct AppRegistry {
    health_check_repository: Arc<dyn HealthCheckRepository>,
    access_repository: Arc<dyn AccessRepository>,
    access_history_repository: Arc<dyn AccessHistoryRepository>,
    reservation_repository: Arc<dyn ReservationRepository>,
    vehicle_repository: Arc<dyn VehicleRepository>,
    spot_repository: Arc<dyn SpotRepository>,
    auth_repository: Arc<dyn AuthRepository>,
}

impl AppRegistry {
    pub fn new(pool: ConnectionPool, redis_client: Arc<RedisClient>, app_config: AppConfig) -> Self {
        let health_check_repository = Arc::new(HealthCheckRepositoryImpl::new(pool.clone()));
        // 入出庫の判定・記録と履歴は同じ実装を共有する
        let access = Arc::new(AccessRepositoryImpl::new(pool.clone()));
        let reservation_repository = Arc::new(ReservationRepositoryImpl::new(pool.clone()));
        let vehicle_repository = Arc::new(VehicleRepositoryImpl::new(pool.clone()));
        let spot_repository = Arc::new(SpotRepositoryImpl::new(pool.clone()));
        let auth_repository = Arc::new(AuthRepositoryImpl::new(
            pool.clone(),
            redis_client.clone(),
            app_config.auth.ttl,
        ));
        Self {
            health_check_repository,
            access_repository: access.clone(),
            access_history_repository: access,
            reservation_repository,
            vehicle_repository,
            spot_repository,
            auth_repository,
        }
    }

    pub fn health_check_repository(&self) -> Arc<dyn HealthCheckRepository> {
        self.health_check_repository.clone()
    }

    pub fn access_repository(&self) -> Arc<dyn AccessRepository> {
        self.access_repository.clone()
    }

    pub fn access_history_repository(&self) -> Arc<dyn AccessHistoryRepository> {
        self.access_history_repository.clone()
    }

    pub fn reservation_repository(&self) -> Arc<dyn ReservationRepository> {
        self.reservation_repository.clone()
    }

    pub fn vehicle_repository(&self) -> Arc<dyn VehicleRepository> {
        self.vehicle_repository.clone()
    }

    pub fn spot_repository(&self) -> Arc<dyn SpotRepository> {
        self.spot_repository.clone()
    }

    pub fn auth_repository(&self) -> Arc<dyn AuthRepository> {
        self.auth_repository.clone()
    }
}
