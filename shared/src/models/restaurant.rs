//! Restaurant Model

use serde::{Deserialize, Serialize};

use super::LocalizedText;

/// Restaurant entity fragment, as the backend sends it with print jobs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: String,
    pub name: LocalizedText,
    pub logo_url: Option<String>,
    /// Pre-rendered payment QR image, if the restaurant uploaded one
    pub qr_code_image_url: Option<String>,
    /// PromptPay account for generated payment QRs
    pub prompt_pay: Option<String>,
}
