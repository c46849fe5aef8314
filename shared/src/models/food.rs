//! Food Model

use serde::{Deserialize, Serialize};

use super::LocalizedText;

/// Menu item entity fragment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Food {
    pub id: String,
    pub name: LocalizedText,
    pub price: f64,
}
