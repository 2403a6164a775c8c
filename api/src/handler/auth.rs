use axum::{extract::State, http::StatusCode, Json};
use garde::Validate;
use kernel::model::auth::event::CreateToken;
use registry::AppRegistry;
use shared::error::AppResult;

use crate::{
    extractor::AuthorizedUnit,
    model::auth::{AccessTokenResponse, LoginRequest},
};

pub async fn login(
    State(registry): State<AppRegistry>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<AccessTokenResponse>> {
    req.validate(&())?;

    let unit_id = registry
        .auth_repository()
        .verify_unit(&req.email, &req.password)
        .await?;
    let access_token = registry
        .auth_repository()
        .create_token(CreateToken::new(unit_id.clone()))
        .await?;

    tracing::info!(unit_id = %unit_id, "Unit logged in");
    Ok(Json(AccessTokenResponse::new(unit_id, access_token)))
}

pub async fn logout(
    unit: AuthorizedUnit,
    State(registry): State<AppRegistry>,
) -> AppResult<StatusCode> {
    registry
        .auth_repository()
        .delete_token(unit.access_token)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
