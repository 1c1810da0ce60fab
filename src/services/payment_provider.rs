// src/services/payment_provider.rs

use async_trait::async_trait;

use crate::{
    config::RazorpayConfig,
    error::AppError,
    models::payment::{OrderRequest, PaymentOrder},
};

/// External payment provider that creates checkout orders.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Public key the client-side checkout is opened with.
    fn key_id(&self) -> &str;

    async fn create_order(&self, order: &OrderRequest) -> Result<PaymentOrder, AppError>;
}

/// Razorpay Orders API client.
pub struct RazorpayClient {
    http: reqwest::Client,
    key_id: String,
    key_secret: String,
    api_base: String,
}

impl RazorpayClient {
    pub fn new(config: &RazorpayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PaymentProvider for RazorpayClient {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    async fn create_order(&self, order: &OrderRequest) -> Result<PaymentOrder, AppError> {
        let response = self
            .http
            .post(format!("{}/v1/orders", self.api_base))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(order)
            .send()
            .await
            .map_err(|e| AppError::Downstream(format!("Payment provider unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Downstream(format!(
                "Payment provider rejected order for {} ({}): {}",
                order.receipt, status, body
            )));
        }

        response
            .json::<PaymentOrder>()
            .await
            .map_err(|e| AppError::Downstream(format!("Malformed order response: {}", e)))
    }
}
