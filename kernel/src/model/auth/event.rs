use super::AccessToken;
use crate::model::id::UnitId;

pub struct CreateToken {
    pub unit_id: UnitId,
    pub access_token: String,
}

impl CreateToken {
    pub fn new(unit_id: UnitId) -> Self {
        Self {
            unit_id,
            access_token: AccessToken::issue().0,
        }
    }
}
