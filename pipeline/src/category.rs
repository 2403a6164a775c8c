use std::collections::HashMap;

use kernel::model::vehicle::VehicleCategory;
use shared::error::{AppError, AppResult};

/// Maps detector labels such as `car` to the category codes the access
/// database stores. Numeric labels pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct CategoryMap {
    labels: HashMap<String, VehicleCategory>,
}

impl CategoryMap {
    /// Parses `label=code` pairs separated by commas, e.g. `car=1,auto=1`.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let mut labels = HashMap::new();
        for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (label, code) = pair.split_once('=').ok_or_else(|| {
                AppError::ConversionEntityError(format!("category mapping {pair} has no '='"))
            })?;
            let code = code.trim().parse::<i32>().map_err(|e| {
                AppError::ConversionEntityError(format!("category mapping {pair}: {e}"))
            })?;
            labels.insert(label.trim().to_lowercase(), VehicleCategory::new(code));
        }
        Ok(Self { labels })
    }

    pub fn resolve(&self, label: &str) -> Option<VehicleCategory> {
        let label = label.trim();
        if let Ok(code) = label.parse::<i32>() {
            return Some(VehicleCategory::new(code));
        }
        self.labels.get(&label.to_lowercase()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_labels_and_numbers_are_mapped() {
        let map = CategoryMap::parse("car=1, auto=1,pickup=2").unwrap();
        assert_eq!(map.resolve("car"), Some(VehicleCategory::new(1)));
        assert_eq!(map.resolve(" Auto "), Some(VehicleCategory::new(1)));
        assert_eq!(map.resolve("2"), Some(VehicleCategory::new(2)));
        assert_eq!(map.resolve("truck"), None);
    }

    #[test]
    fn malformed_pairs_are_rejected() {
        assert!(CategoryMap::parse("car").is_err());
        assert!(CategoryMap::parse("car=one").is_err());
        assert!(CategoryMap::parse("").unwrap().resolve("car").is_none());
    }
}
