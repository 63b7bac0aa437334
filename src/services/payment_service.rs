use crate::database::change_feed::{ChangeFeed, Subscription, Table};
use crate::database::store::PaymentStore;
use crate::dto::payment_dto::{InitiatePaymentRequest, NotchPayWebhookEvent};
use crate::error::{Error, Result};
use crate::models::payment::{Payment, PaymentFlow, PaymentPatch, PaymentStatus};
use crate::services::payment_gateway::{ChargeRequest, InitializePayment, PaymentGateway};
use crate::utils::token::generate_merchant_reference;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentNextAction {
    /// The customer confirms the charge on their phone.
    AwaitConfirmation,
    RedirectToCheckout { url: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub payment: Payment,
    pub next_action: PaymentNextAction,
}

#[derive(Clone)]
pub struct PaymentService {
    store: Arc<dyn PaymentStore>,
    gateway: Arc<dyn PaymentGateway>,
    feed: ChangeFeed,
    currency: String,
    callback_url: Option<String>,
}

impl PaymentService {
    pub fn new(
        store: Arc<dyn PaymentStore>,
        gateway: Arc<dyn PaymentGateway>,
        feed: ChangeFeed,
        currency: String,
        callback_url: Option<String>,
    ) -> Self {
        Self {
            store,
            gateway,
            feed,
            currency,
            callback_url,
        }
    }

    /// Creates the local record, initializes the gateway transaction, then tries a
    /// direct mobile-money charge. When the charge cannot be started the customer
    /// is sent to the hosted checkout page instead.
    pub async fn initiate_payment(
        &self,
        user_id: Uuid,
        req: InitiatePaymentRequest,
    ) -> Result<PaymentOutcome> {
        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4(),
            user_id,
            purpose: req.purpose.clone(),
            amount: req.amount,
            currency: self.currency.clone(),
            email: req.email.clone(),
            phone: req.phone.clone(),
            channel: req.channel.clone(),
            merchant_reference: generate_merchant_reference(),
            gateway_reference: None,
            checkout_url: None,
            status: PaymentStatus::Pending,
            flow: None,
            message: None,
            created_at: now,
            updated_at: now,
        };
        let payment = self.store.insert_payment(&payment).await?;

        let init_request = InitializePayment {
            amount: req.amount,
            currency: self.currency.clone(),
            reference: payment.merchant_reference.clone(),
            email: req.email.clone(),
            phone: req.phone.clone(),
            description: req.description.clone(),
            callback: self.callback_url.clone(),
        };

        let initialized = match self.gateway.initialize(init_request).await {
            Ok(initialized) => initialized,
            Err(e) => {
                warn!(payment_id = %payment.id, "payment initialization failed: {}", e);
                self.store
                    .update_payment(
                        payment.id,
                        &PaymentPatch::status(PaymentStatus::Failed).with_message(e.to_string()),
                    )
                    .await?;
                return Err(e);
            }
        };

        let payment = self
            .store
            .update_payment(
                payment.id,
                &PaymentPatch {
                    gateway_reference: Some(initialized.reference.clone()),
                    checkout_url: initialized.authorization_url.clone(),
                    ..Default::default()
                },
            )
            .await?;

        let charge_error = match (req.channel.as_deref(), req.phone.as_deref()) {
            (Some(channel), Some(phone)) => {
                let charge = ChargeRequest {
                    channel: channel.to_string(),
                    phone: phone.to_string(),
                };
                match self.gateway.charge(initialized.reference.clone(), charge).await {
                    Ok(response) => {
                        let payment = self
                            .store
                            .update_payment(
                                payment.id,
                                &PaymentPatch {
                                    status: Some(charge_status(&response.status)),
                                    flow: Some(PaymentFlow::DirectCharge),
                                    message: response.message,
                                    ..Default::default()
                                },
                            )
                            .await?;
                        info!(payment_id = %payment.id, reference = %initialized.reference, "direct charge started");
                        return Ok(PaymentOutcome {
                            payment,
                            next_action: PaymentNextAction::AwaitConfirmation,
                        });
                    }
                    Err(e) => {
                        warn!(
                            payment_id = %payment.id,
                            reference = %initialized.reference,
                            "direct charge failed, falling back to hosted checkout: {}",
                            e
                        );
                        Some(e)
                    }
                }
            }
            _ => None,
        };

        self.fall_back_to_checkout(payment, charge_error).await
    }

    async fn fall_back_to_checkout(
        &self,
        payment: Payment,
        charge_error: Option<Error>,
    ) -> Result<PaymentOutcome> {
        let Some(url) = payment.checkout_url.clone() else {
            let reason = charge_error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Gateway returned no checkout URL".to_string());
            self.store
                .update_payment(
                    payment.id,
                    &PaymentPatch::status(PaymentStatus::Failed).with_message(reason.clone()),
                )
                .await?;
            return Err(charge_error.unwrap_or(Error::Gateway(reason)));
        };

        let mut patch = PaymentPatch {
            flow: Some(PaymentFlow::HostedCheckout),
            ..Default::default()
        };
        if let Some(ref e) = charge_error {
            patch.message = Some(e.to_string());
        }
        let payment = self.store.update_payment(payment.id, &patch).await?;
        info!(payment_id = %payment.id, "payment redirected to hosted checkout");

        Ok(PaymentOutcome {
            payment,
            next_action: PaymentNextAction::RedirectToCheckout { url },
        })
    }

    pub async fn get_payment(&self, user_id: Uuid, payment_id: Uuid) -> Result<Payment> {
        let payment = self.store.get_payment(payment_id).await?;
        if payment.user_id != user_id {
            return Err(Error::NotFound(format!("Payment {} not found", payment_id)));
        }
        Ok(payment)
    }

    /// Asks the gateway for the current state and mirrors it locally.
    pub async fn verify_payment(&self, user_id: Uuid, payment_id: Uuid) -> Result<Payment> {
        let payment = self.get_payment(user_id, payment_id).await?;
        let Some(reference) = payment.gateway_reference.clone() else {
            return Err(Error::BadRequest(
                "Payment was never initialized with the gateway".to_string(),
            ));
        };

        let verified = self.gateway.verify(reference).await?;
        let status = PaymentStatus::from_gateway(&verified.status);
        if status == payment.status {
            return Ok(payment);
        }
        if payment.status.is_final() {
            warn!(
                payment_id = %payment.id,
                current = %payment.status,
                reported = %status,
                "gateway status ignored for payment already in a final state"
            );
            return Ok(payment);
        }

        let updated = self
            .store
            .update_payment(payment.id, &PaymentPatch::status(status))
            .await?;
        info!(payment_id = %payment.id, status = %status, "payment status verified");
        Ok(updated)
    }

    /// Applies a gateway webhook. Returns `None` when no local payment matches.
    pub async fn apply_webhook(&self, event: NotchPayWebhookEvent) -> Result<Option<Payment>> {
        let mut found = self
            .store
            .find_payment_by_reference(&event.data.reference)
            .await?;
        if found.is_none() {
            if let Some(ref merchant_reference) = event.data.merchant_reference {
                found = self.store.find_payment_by_reference(merchant_reference).await?;
            }
        }
        let Some(payment) = found else {
            warn!(reference = %event.data.reference, event = %event.event, "webhook for unknown payment");
            return Ok(None);
        };

        let raw_status = event
            .data
            .status
            .clone()
            .unwrap_or_else(|| event.event.trim_start_matches("payment.").to_string());
        let status = PaymentStatus::from_gateway(&raw_status);

        if payment.status.is_final() && payment.status != status {
            warn!(
                payment_id = %payment.id,
                current = %payment.status,
                incoming = %status,
                "ignoring webhook for payment already in a final state"
            );
            return Ok(Some(payment));
        }

        let updated = self
            .store
            .update_payment(payment.id, &PaymentPatch::status(status))
            .await?;
        info!(payment_id = %payment.id, event = %event.event, status = %status, "payment webhook applied");
        Ok(Some(updated))
    }

    /// Realtime updates for one payment row.
    pub fn watch_payment(&self, payment_id: Uuid) -> Subscription {
        self.feed.subscribe(Table::Payments, Some(payment_id))
    }
}

fn charge_status(raw: &str) -> PaymentStatus {
    match PaymentStatus::from_gateway(raw) {
        PaymentStatus::Pending => PaymentStatus::Processing,
        other => other,
    }
}
