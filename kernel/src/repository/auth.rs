use async_trait::async_trait;
use shared::error::AppResult;

use crate::model::{
    auth::{event::CreateToken, AccessToken},
    id::UnitId,
};

#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn fetch_unit_id_from_token(&self, access_token: &AccessToken)
        -> AppResult<Option<UnitId>>;
    async fn verify_unit(&self, email: &str, password: &str) -> AppResult<UnitId>;
    async fn create_token(&self, event: CreateToken) -> AppResult<AccessToken>;
    async fn delete_token(&self, access_token: AccessToken) -> AppResult<()>;
}
