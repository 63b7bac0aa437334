use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializePayment {
    pub amount: i64,
    pub currency: String,
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitializedPayment {
    pub reference: String,
    pub authorization_url: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub channel: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChargeResponse {
    pub status: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedPayment {
    pub reference: String,
    pub status: String,
    pub amount: Option<i64>,
}

/// Third-party payment gateway: initialize a transaction, charge it directly
/// on a mobile-money channel, and verify it by reference.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize(&self, request: InitializePayment) -> Result<InitializedPayment>;

    async fn charge(&self, reference: String, request: ChargeRequest) -> Result<ChargeResponse>;

    async fn verify(&self, reference: String) -> Result<VerifiedPayment>;
}
