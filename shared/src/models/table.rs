//! Dining Table Model

use serde::{Deserialize, Serialize};

use super::LocalizedText;

/// Dining table entity fragment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: String,
    pub name: LocalizedText,
}
