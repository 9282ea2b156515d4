use serde::{Deserialize, Serialize};

/// A country listing entry: lowercase alpha-2 code plus English short name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryInfo {
    pub code: String,
    pub name: String,
}
