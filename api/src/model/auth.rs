use garde::Validate;
use kernel::model::{auth::AccessToken, id::UnitId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub unit_id: String,
    pub access_token: String,
}

impl AccessTokenResponse {
    pub fn new(unit_id: UnitId, access_token: AccessToken) -> Self {
        Self {
            unit_id: unit_id.to_string(),
            access_token: access_token.0,
        }
    }
}
