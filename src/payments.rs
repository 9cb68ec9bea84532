use std::sync::Arc;

use async_trait::async_trait;

const STRIPE_INTENTS_URL: &str = "https://api.stripe.com/v1/payment_intents";

/// amount_cents
///
/// Converts a plan price in dollars to the integer cent amount the processor
/// expects. Truncates toward zero, matching integer parsing of the scaled
/// value.
pub fn amount_cents(price: f64) -> i64 {
    (price * 100.0) as i64
}

/// PaymentProcessor Trait
///
/// Abstraction over the card-payment backend so handlers can be tested
/// without touching the network. The only operation the server needs is
/// creating a payment intent and handing its client secret back to the
/// browser; settlement is reported by the client afterwards.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Creates a payment intent for the given amount in cents and returns
    /// its client secret.
    async fn create_intent(&self, amount_cents: i64) -> Result<String, String>;
}

/// Shared, thread-safe handle to whichever processor the app was built with.
pub type PaymentState = Arc<dyn PaymentProcessor>;

/// StripeClient
///
/// Real processor implementation over the Stripe REST API. Authenticates
/// with the secret key as a bearer token and posts form-encoded intent
/// parameters. All charges are in USD.
pub struct StripeClient {
    http: reqwest::Client,
    secret: String,
}

impl StripeClient {
    pub fn new(secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret,
        }
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_intent(&self, amount_cents: i64) -> Result<String, String> {
        let response = self
            .http
            .post(STRIPE_INTENTS_URL)
            .bearer_auth(&self.secret)
            .form(&[
                ("amount", amount_cents.to_string()),
                ("currency", "usd".to_string()),
                ("payment_method_types[]", "card".to_string()),
            ])
            .send()
            .await
            .map_err(|e| format!("Failed to reach payment processor: {}", e))?;

        if !response.status().is_success() {
            return Err(format!(
                "Payment processor rejected the request with status: {}",
                response.status()
            ));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse payment processor response: {}", e))?;

        body.get("client_secret")
            .and_then(|secret| secret.as_str())
            .map(str::to_string)
            .ok_or_else(|| "Payment processor response missing client_secret".to_string())
    }
}

/// MockPaymentProcessor
///
/// In-memory stand-in for tests. Returns a deterministic secret derived
/// from the amount, or a canned failure when `should_fail` is set.
pub struct MockPaymentProcessor {
    pub should_fail: bool,
}

#[async_trait]
impl PaymentProcessor for MockPaymentProcessor {
    async fn create_intent(&self, amount_cents: i64) -> Result<String, String> {
        if self.should_fail {
            return Err("Mock processor failure".to_string());
        }
        Ok(format!("pi_mock_{}_secret_test", amount_cents))
    }
}
