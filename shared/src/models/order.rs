//! Order Model

use serde::{Deserialize, Serialize};

use super::{Food, Table};

/// Order entity with the relations the backend joins in for printing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    /// "pending" | "in_progress" | "done"
    pub status: String,
    /// Unix epoch millis
    pub created_at: i64,
    pub table: Option<Table>,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
}

/// Order line item with its joined food
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub quantity: u32,
    pub special_instructions: Option<String>,
    pub food: Option<Food>,
}

impl Order {
    /// Order total across all items (missing food prices count as zero)
    pub fn subtotal(&self) -> f64 {
        self.order_items
            .iter()
            .map(|item| item.food.as_ref().map_or(0.0, |f| f.price) * item.quantity as f64)
            .sum()
    }

    /// Total item count
    pub fn total_items(&self) -> u32 {
        self.order_items.iter().map(|item| item.quantity).sum()
    }
}
