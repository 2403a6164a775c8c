use serde::{Deserialize, Serialize};
use shared::error::AppError;
use std::str::FromStr;

/// Normalized licence plate: trimmed and upper-cased, never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "String", into = "String")]
#[sqlx(transparent)]
pub struct Plate(String);

impl Plate {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(AppError::ConversionEntityError(
                "plate must not be empty".into(),
            ));
        }
        if normalized.chars().any(char::is_whitespace) {
            return Err(AppError::ConversionEntityError(format!(
                "plate {normalized} must not contain whitespace"
            )));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Plate {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Plate {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Plate> for String {
    fn from(value: Plate) -> Self {
        value.0
    }
}

impl std::fmt::Display for Plate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_surrounding_whitespace() {
        let plate = Plate::parse("  abc123 ").unwrap();
        assert_eq!(plate.as_str(), "ABC123");
        assert_eq!(plate, "ABC123".parse().unwrap());
    }

    #[test]
    fn rejects_blank_and_inner_whitespace() {
        assert!(Plate::parse("   ").is_err());
        assert!(Plate::parse("AB C123").is_err());
    }
}
