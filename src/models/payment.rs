use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Canceled,
    Expired,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Canceled => "canceled",
            PaymentStatus::Expired => "expired",
        }
    }

    /// Maps a status string reported by the gateway onto the local status set.
    pub fn from_gateway(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "complete" | "completed" | "success" => PaymentStatus::Completed,
            "failed" => PaymentStatus::Failed,
            "canceled" | "cancelled" => PaymentStatus::Canceled,
            "expired" => PaymentStatus::Expired,
            "processing" => PaymentStatus::Processing,
            _ => PaymentStatus::Pending,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Completed
                | PaymentStatus::Failed
                | PaymentStatus::Canceled
                | PaymentStatus::Expired
        )
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "processing" => Ok(PaymentStatus::Processing),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "canceled" => Ok(PaymentStatus::Canceled),
            "expired" => Ok(PaymentStatus::Expired),
            other => Err(format!("unknown payment status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFlow {
    DirectCharge,
    HostedCheckout,
}

impl PaymentFlow {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentFlow::DirectCharge => "direct_charge",
            PaymentFlow::HostedCheckout => "hosted_checkout",
        }
    }
}

impl FromStr for PaymentFlow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct_charge" => Ok(PaymentFlow::DirectCharge),
            "hosted_checkout" => Ok(PaymentFlow::HostedCheckout),
            other => Err(format!("unknown payment flow '{}'", other)),
        }
    }
}

/// Local mirror of a gateway transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub purpose: String,
    pub amount: i64,
    pub currency: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub channel: Option<String>,
    pub merchant_reference: String,
    pub gateway_reference: Option<String>,
    pub checkout_url: Option<String>,
    pub status: PaymentStatus,
    pub flow: Option<PaymentFlow>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct PaymentPatch {
    pub status: Option<PaymentStatus>,
    pub gateway_reference: Option<String>,
    pub checkout_url: Option<String>,
    pub flow: Option<PaymentFlow>,
    pub message: Option<String>,
}

impl PaymentPatch {
    pub fn status(status: PaymentStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn apply(&self, payment: &mut Payment, now: DateTime<Utc>) {
        if let Some(status) = self.status {
            payment.status = status;
        }
        if let Some(ref reference) = self.gateway_reference {
            payment.gateway_reference = Some(reference.clone());
        }
        if let Some(ref url) = self.checkout_url {
            payment.checkout_url = Some(url.clone());
        }
        if let Some(flow) = self.flow {
            payment.flow = Some(flow);
        }
        if let Some(ref message) = self.message {
            payment.message = Some(message.clone());
        }
        payment.updated_at = now;
    }
}
