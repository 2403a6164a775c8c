use super::{
    access::build_access_routers, auth::build_auth_routers, health::build_health_check_routers,
    reservation::build_reservation_routers, spot::build_spot_routers,
    vehicle::build_vehicle_routers,
};
use axum::Router;
use registry::AppRegistry;

pub fn routes() -> Router<AppRegistry> {
    let router = Router::new()
        .merge(build_health_check_routers())
        .merge(build_auth_routers())
        .merge(build_access_routers())
        .merge(build_reservation_routers())
        .merge(build_vehicle_routers())
        .merge(build_spot_routers());
    Router::new().nest("/api/v1", router)
}
