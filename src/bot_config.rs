use serde::{Deserialize, Serialize};

/// Bot configuration as stored on the Kik platform (`/config`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,
    #[serde(default)]
    pub features: Features,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    #[serde(default)]
    pub receive_read_receipts: bool,
    #[serde(default)]
    pub receive_is_typing: bool,
    #[serde(default)]
    pub manually_send_read_receipts: bool,
    #[serde(default)]
    pub receive_delivery_receipts: bool,
}
