use axum::{
    routing::{get, put},
    Router,
};
use registry::AppRegistry;

use crate::handler::spot::{show_availability, update_occupancy};

pub fn build_spot_routers() -> Router<AppRegistry> {
    Router::new()
        .route("/availability", get(show_availability))
        .route("/spots/:spot_number/occupancy", put(update_occupancy))
}
