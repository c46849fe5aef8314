//! Backend model fragments carried inside print job payloads
//!
//! These mirror the ordering backend's JSON shapes (camelCase on the
//! wire). The printer core treats them as opaque renderer input.

mod food;
mod localized;
mod order;
mod restaurant;
mod table;

pub use food::Food;
pub use localized::LocalizedText;
pub use order::{Order, OrderItem};
pub use restaurant::Restaurant;
pub use table::Table;
