use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InitiatePaymentRequest {
    /// What is being paid for, e.g. a course id.
    #[validate(length(min = 1, max = 128))]
    pub purpose: String,
    #[validate(range(min = 1))]
    pub amount: i64,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 6, max = 20))]
    pub phone: Option<String>,
    /// Mobile-money channel for a direct charge, e.g. `cm.mobile`. Absent means hosted checkout.
    pub channel: Option<String>,
    #[validate(length(max = 255))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotchPayWebhookEvent {
    pub event: String,
    pub data: NotchPayWebhookData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotchPayWebhookData {
    pub reference: String,
    #[serde(default)]
    pub merchant_reference: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
    pub matched: bool,
}
