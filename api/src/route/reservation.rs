use axum::{
    routing::{delete, get, post, put},
    Router,
};
use registry::AppRegistry;

use crate::handler::reservation::{
    assign_spot, cancel_reservation, create_reservation, show_reservation,
    show_reservation_list, unassign_spot, update_reservation,
};

pub fn build_reservation_routers() -> Router<AppRegistry> {
    let reservation_routers = Router::new()
        .route("/", post(create_reservation))
        .route("/", get(show_reservation_list))
        .route("/:reservation_id", get(show_reservation))
        .route("/:reservation_id", put(update_reservation))
        .route("/:reservation_id", delete(cancel_reservation))
        .route("/:reservation_id/spot", put(assign_spot))
        .route("/:reservation_id/spot", delete(unassign_spot));

    Router::new().nest("/reservations", reservation_routers)
}
