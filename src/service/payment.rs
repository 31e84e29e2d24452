//! Card payment gateway.

use std::time::Duration;

use async_trait::async_trait;
use derive_more::Display;
use serde::Deserialize;

use crate::money::Money;

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// The gateway answered and refused the charge.
    #[display(fmt = "{}", _0)]
    Declined(String),

    #[display(fmt = "payment gateway timed out")]
    Timeout,

    #[display(fmt = "payment gateway unavailable: {}", _0)]
    Unavailable(String),
}

impl std::error::Error for PaymentError {}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charges `amount` and returns the gateway's charge identifier once it
    /// is confirmed.
    async fn charge(&self, amount: Money, currency: &str, payment_method: &str) -> Result<String, PaymentError>;
}

/// Stripe PaymentIntents, created and confirmed in one call.
pub struct StripeGateway {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

#[derive(Deserialize)]
struct PaymentIntent {
    id: String,
    status: String,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
    code: Option<String>,
}

impl StripeGateway {
    pub fn new(api_base: &str, secret_key: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        })
    }
}

fn transport_error(err: reqwest::Error) -> PaymentError {
    if err.is_timeout() {
        PaymentError::Timeout
    } else {
        PaymentError::Unavailable(err.to_string())
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn charge(&self, amount: Money, currency: &str, payment_method: &str) -> Result<String, PaymentError> {
        let amount = amount.cents().to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", currency),
            ("payment_method", payment_method),
            ("confirm", "true"),
            ("automatic_payment_methods[enabled]", "true"),
            ("automatic_payment_methods[allow_redirects]", "never"),
        ];
        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_client_error() {
            let reason = match response.json::<StripeErrorBody>().await {
                Ok(body) => body
                    .error
                    .message
                    .or(body.error.code)
                    .unwrap_or_else(|| status.to_string()),
                Err(_) => status.to_string(),
            };
            return Err(PaymentError::Declined(reason));
        }
        if !status.is_success() {
            return Err(PaymentError::Unavailable(format!("gateway answered {status}")));
        }

        let intent: PaymentIntent = response.json().await.map_err(transport_error)?;
        if intent.status != "succeeded" {
            return Err(PaymentError::Declined(format!("payment {} is {}", intent.id, intent.status)));
        }
        log::info!("payment {} confirmed", intent.id);
        Ok(intent.id)
    }
}
