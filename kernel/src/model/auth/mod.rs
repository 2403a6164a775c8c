pub mod event;

/// Opaque bearer token handed to a residential unit after login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken(pub String);

impl AccessToken {
    pub fn issue() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }
}

