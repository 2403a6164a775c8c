use kernel::model::{
    auth::{event::CreateToken, AccessToken},
    id::UnitId,
};
use shared::error::{AppError, AppResult};

use crate::redis::model::{RedisKey, RedisValue};

pub struct AuthorizationKey(String);
pub struct AuthorizedUnitId(UnitId);

pub fn from(event: CreateToken) -> (AuthorizationKey, AuthorizedUnitId) {
    (
        AuthorizationKey(event.access_token),
        AuthorizedUnitId(event.unit_id),
    )
}

impl From<AuthorizationKey> for AccessToken {
    fn from(key: AuthorizationKey) -> Self {
        Self(key.0)
    }
}

impl From<AccessToken> for AuthorizationKey {
    fn from(token: AccessToken) -> Self {
        Self(token.0)
    }
}

impl From<&AccessToken> for AuthorizationKey {
    fn from(token: &AccessToken) -> Self {
        Self(token.0.to_string())
    }
}

impl RedisKey for AuthorizationKey {
    type Value = AuthorizedUnitId;

    fn inner(&self) -> String {
        format!("parking-gate:token:{}", self.0)
    }
}

impl RedisValue for AuthorizedUnitId {
    fn inner(&self) -> String {
        self.0.to_string()
    }
}

impl TryFrom<String> for AuthorizedUnitId {
    type Error = AppError;

    fn try_from(s: String) -> AppResult<Self> {
        if s.trim().is_empty() {
            return Err(AppError::ConversionEntityError(
                "stored unit id is empty".into(),
            ));
        }
        Ok(Self(UnitId::new(s)))
    }
}

impl AuthorizedUnitId {
    pub fn into_inner(self) -> UnitId {
        self.0
    }
}
