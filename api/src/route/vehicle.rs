use axum::{
    routing::{delete, get, post, put},
    Router,
};
use registry::AppRegistry;

use crate::handler::vehicle::{
    delete_vehicle, register_vehicle, register_visitor_vehicle, show_vehicle_list,
    update_vehicle,
};

pub fn build_vehicle_routers() -> Router<AppRegistry> {
    let vehicle_routers = Router::new()
        .route("/", post(register_vehicle))
        .route("/", get(show_vehicle_list))
        .route("/:plate", put(update_vehicle))
        .route("/:plate", delete(delete_vehicle));

    Router::new()
        .nest("/vehicles", vehicle_routers)
        .route("/visitor-vehicles", post(register_visitor_vehicle))
}
