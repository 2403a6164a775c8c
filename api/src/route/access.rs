use axum::{
    routing::{get, post},
    Router,
};
use registry::AppRegistry;

use crate::handler::access::{
    register_entry_resident, register_entry_visitor, register_exit, show_access_events,
    verify_plate,
};

pub fn build_access_routers() -> Router<AppRegistry> {
    // 検出ループから呼ばれるエンドポイントは認証なし
    Router::new()
        .route("/verify-plate/:plate/:category", get(verify_plate))
        .route("/register-entry-resident/:plate", post(register_entry_resident))
        .route("/register-entry-visitor/:plate", post(register_entry_visitor))
        .route("/register-exit/:plate", post(register_exit))
        .route("/access-events", get(show_access_events))
}
