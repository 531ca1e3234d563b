// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outbound SMS delivery channel.
//!
//! One batched "send text to N numbers" call per fan-out invocation, with a
//! bounded timeout. Credentials and endpoint come from deployment
//! configuration; delivery is best-effort and never retried here.

use serde::Serialize;
use std::future::Future;
use std::time::Duration;

/// Hard ceiling on one delivery call; a timeout is a delivery failure.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Batched text delivery capability.
pub trait SmsChannel {
    fn send_batch(
        &self,
        text: &str,
        numbers: &[String],
    ) -> impl Future<Output = Result<(), SmsError>> + Send;
}

/// Client for an SMS-gate style HTTP gateway.
#[derive(Clone)]
pub struct SmsGateClient {
    http: reqwest::Client,
    api_url: String,
    username: String,
    password: String,
}

#[derive(Serialize)]
struct GatewayRequest<'a> {
    #[serde(rename = "textMessage")]
    text_message: TextMessage<'a>,
    #[serde(rename = "phoneNumbers")]
    phone_numbers: &'a [String],
    #[serde(rename = "simNumber")]
    sim_number: u8,
}

#[derive(Serialize)]
struct TextMessage<'a> {
    text: &'a str,
}

impl SmsGateClient {
    pub fn new(api_url: String, username: String, password: String) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(DELIVERY_TIMEOUT)
                .build()
                .expect("reqwest client"),
            api_url,
            username,
            password,
        }
    }
}

impl SmsChannel for SmsGateClient {
    async fn send_batch(&self, text: &str, numbers: &[String]) -> Result<(), SmsError> {
        let body = GatewayRequest {
            text_message: TextMessage { text },
            phone_numbers: numbers,
            sim_number: 1,
        };

        let response = self
            .http
            .post(&self.api_url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| SmsError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(SmsError::Gateway(format!("HTTP {}: {}", status, detail)));
        }

        tracing::info!(count = numbers.len(), "SMS batch accepted by gateway");
        Ok(())
    }
}

/// Errors from the delivery channel. Reported to the fan-out caller as a
/// failed batch; never retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    #[error("SMS request failed: {0}")]
    Request(String),

    #[error("SMS gateway error: {0}")]
    Gateway(String),
}

/// Normalize a contact number to `+63…` international format.
///
/// Deterministic and locale-specific (Philippine numbering plan). Returns
/// `None` for numbers that cannot be normalized; the fan-out excludes those
/// recipients without failing the batch.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    if let Some(rest) = cleaned.strip_prefix('+') {
        // Already international; keep only if digits remain
        if rest.is_empty() || rest.contains('+') {
            return None;
        }
        return Some(cleaned);
    }

    if cleaned.contains('+') {
        return None;
    }

    if let Some(rest) = cleaned.strip_prefix('0') {
        return Some(format!("+63{rest}"));
    }

    if let Some(rest) = cleaned.strip_prefix("63") {
        return Some(format!("+63{rest}"));
    }

    // Bare 10-digit mobile number (9xxxxxxxxx)
    if cleaned.len() == 10 && cleaned.starts_with('9') {
        return Some(format!("+63{cleaned}"));
    }

    if cleaned.len() >= 10 {
        return Some(format!("+63{cleaned}"));
    }

    None
}
