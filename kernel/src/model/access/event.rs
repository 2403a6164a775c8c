use super::{AccessKind, AccessMethod};
use crate::model::plate::Plate;
use chrono::{DateTime, Utc};
use derive_new::new;

#[derive(new, Debug, Clone)]
pub struct RegisterEntry {
    pub kind: AccessKind,
    pub plate: Plate,
    pub method: AccessMethod,
    pub occurred_at: DateTime<Utc>,
}

#[derive(new, Debug, Clone)]
pub struct RegisterExit {
    pub plate: Plate,
    pub method: AccessMethod,
    pub occurred_at: DateTime<Utc>,
}
