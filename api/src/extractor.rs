use axum::{async_trait, extract::FromRequestParts, http::request::Parts, RequestPartsExt};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use kernel::model::{auth::AccessToken, id::UnitId};
use registry::AppRegistry;
use shared::error::AppError;

// リクエストの前処理で認証済みの住戸を取り出す
pub struct AuthorizedUnit {
    pub access_token: AccessToken,
    pub unit_id: UnitId,
}

impl AuthorizedUnit {
    pub fn id(&self) -> UnitId {
        self.unit_id.clone()
    }
}

#[async_trait]
impl FromRequestParts<AppRegistry> for AuthorizedUnit {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        registry: &AppRegistry,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::UnauthorizedError)?;
        let access_token = AccessToken(bearer.token().to_string());

        let unit_id = registry
            .auth_repository()
            .fetch_unit_id_from_token(&access_token)
            .await?
            .ok_or(AppError::UnauthenticatedError)?;

        Ok(Self {
            access_token,
            unit_id,
        })
    }
}
