use crate::error::{Error, Result};
use crate::services::payment_gateway::{
    ChargeRequest, ChargeResponse, InitializePayment, InitializedPayment, PaymentGateway,
    VerifiedPayment,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
struct NotchPayTransaction {
    reference: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    amount: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
struct InitializeResponse {
    transaction: NotchPayTransaction,
    #[serde(default)]
    authorization_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct ChargeBody<'a> {
    channel: &'a str,
    data: ChargeData<'a>,
}

#[derive(Debug, Clone, Serialize)]
struct ChargeData<'a> {
    phone: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct ChargeResult {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    transaction: Option<NotchPayTransaction>,
}

#[derive(Debug, Clone, Deserialize)]
struct VerifyResponse {
    transaction: NotchPayTransaction,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone)]
pub struct NotchPayService {
    client: Client,
    base_url: String,
    public_key: String,
}

impl NotchPayService {
    pub fn new(base_url: String, public_key: String) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client for NotchPay service");

        let base_url = base_url.trim_end_matches('/').to_string();
        info!("NotchPay gateway configured at {}", base_url);

        Self {
            client,
            base_url,
            public_key,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .header(reqwest::header::AUTHORIZATION, &self.public_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| format!("NotchPay returned HTTP {}", status));
            warn!(%status, "NotchPay request failed: {}", message);
            return Err(Error::Gateway(message));
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::Gateway(format!("Unexpected NotchPay response: {}", e)))
    }
}

#[async_trait]
impl PaymentGateway for NotchPayService {
    async fn initialize(&self, request: InitializePayment) -> Result<InitializedPayment> {
        let url = format!("{}/payments/initialize", self.base_url);
        let response: InitializeResponse = self.send(self.client.post(&url).json(&request)).await?;

        Ok(InitializedPayment {
            reference: response.transaction.reference,
            authorization_url: response.authorization_url,
            status: response
                .transaction
                .status
                .unwrap_or_else(|| "pending".to_string()),
        })
    }

    async fn charge(&self, reference: String, request: ChargeRequest) -> Result<ChargeResponse> {
        let url = format!("{}/payments/{}", self.base_url, reference);
        let body = ChargeBody {
            channel: &request.channel,
            data: ChargeData {
                phone: &request.phone,
            },
        };
        let response: ChargeResult = self.send(self.client.post(&url).json(&body)).await?;

        let status = response
            .transaction
            .and_then(|t| t.status)
            .or(response.status)
            .unwrap_or_else(|| "processing".to_string());

        Ok(ChargeResponse {
            status,
            message: response.message,
        })
    }

    async fn verify(&self, reference: String) -> Result<VerifiedPayment> {
        let url = format!("{}/payments/{}", self.base_url, reference);
        let response: VerifyResponse = self.send(self.client.get(&url)).await?;

        Ok(VerifiedPayment {
            reference: response.transaction.reference,
            status: response
                .transaction
                .status
                .unwrap_or_else(|| "pending".to_string()),
            amount: response.transaction.amount,
        })
    }
}
