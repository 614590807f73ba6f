use crate::domain::ports::{Channel, ConnectivityState, SendOutcome};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Immutable settings of a gateway channel adapter.
///
/// Reconnecting with different settings means constructing a new adapter;
/// an existing adapter is never reconfigured in place.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the legacy messaging gateway.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: ConnectivityState,
}

#[derive(Debug, Serialize)]
struct PhoneSendRequest<'a> {
    number: &'a str,
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct JidSendRequest<'a> {
    #[serde(rename = "targetJID")]
    target_jid: &'a str,
    #[serde(rename = "transactionData")]
    transaction_data: &'a str,
}

/// Shared HTTP plumbing of the two gateway adapters.
struct GatewayClient {
    config: GatewayConfig,
    client: reqwest::Client,
}

impl GatewayClient {
    fn new(config: GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn fetch_status(&self, path: &str) -> Result<ConnectivityState> {
        let response: StatusResponse = self
            .client
            .get(self.url(path))
            .send()
            .await?
            .json()
            .await?;
        Ok(response.status)
    }

    /// Posts a send request and maps the gateway's reply to an outcome.
    ///
    /// The gateway answers delivery rejections with a non-2xx status but
    /// still carries `{"success": false, "message": ...}` in the body, so
    /// the body is parsed regardless of the HTTP status. Only transport
    /// faults surface as errors.
    async fn post_send<B: Serialize>(&self, path: &str, body: &B) -> Result<SendOutcome> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        let http_status = response.status();
        match response.json::<SendOutcome>().await {
            Ok(outcome) => Ok(outcome),
            Err(_) => Ok(SendOutcome {
                success: false,
                message: Some(format!("gateway returned {http_status}")),
            }),
        }
    }
}

/// Phone-number-addressed channel over the gateway's messaging endpoint.
///
/// Destinations are phone-number-like strings, normalized by the caller
/// before dispatch; the adapter forwards them untouched.
pub struct PhoneChannel {
    inner: GatewayClient,
}

impl PhoneChannel {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        Ok(Self { inner: GatewayClient::new(config)? })
    }
}

#[async_trait]
impl Channel for PhoneChannel {
    async fn status(&self) -> Result<ConnectivityState> {
        self.inner.fetch_status("/api/status").await
    }

    async fn send(&self, destination: &str, payload: &str) -> Result<SendOutcome> {
        debug!(destination, "sending over phone channel");
        let body = PhoneSendRequest { number: destination, message: payload };
        self.inner.post_send("/api/send-message", &body).await
    }
}

/// JID-addressed channel over the gateway's XMPP endpoint.
///
/// Destinations are `user@domain` protocol addresses, assumed
/// pre-validated by the caller.
pub struct JidChannel {
    inner: GatewayClient,
}

impl JidChannel {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        Ok(Self { inner: GatewayClient::new(config)? })
    }
}

#[async_trait]
impl Channel for JidChannel {
    async fn status(&self) -> Result<ConnectivityState> {
        self.inner.fetch_status("/api/jabber/status").await
    }

    async fn send(&self, destination: &str, payload: &str) -> Result<SendOutcome> {
        debug!(destination, "sending over jid channel");
        let body = JidSendRequest { target_jid: destination, transaction_data: payload };
        self.inner.post_send("/api/jabber/send-transaction", &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_bodies_match_gateway_wire_format() {
        let phone = PhoneSendRequest { number: "628123", message: "S5.0812.5000.1234" };
        assert_eq!(
            serde_json::to_value(&phone).unwrap(),
            serde_json::json!({"number": "628123", "message": "S5.0812.5000.1234"})
        );

        let jid = JidSendRequest { target_jid: "server@host.tld", transaction_data: "S5.0812.5000.1234" };
        assert_eq!(
            serde_json::to_value(&jid).unwrap(),
            serde_json::json!({"targetJID": "server@host.tld", "transactionData": "S5.0812.5000.1234"})
        );
    }

    #[test]
    fn test_status_response_parses_lowercase_states() {
        let parsed: StatusResponse = serde_json::from_str(r#"{"status": "connecting"}"#).unwrap();
        assert_eq!(parsed.status, ConnectivityState::Connecting);
    }

    #[test]
    fn test_send_outcome_parses_with_and_without_message() {
        let ok: SendOutcome = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(ok.success);
        assert!(ok.message.is_none());

        let failed: SendOutcome =
            serde_json::from_str(r#"{"success": false, "message": "Bot not connected"}"#).unwrap();
        assert!(!failed.success);
        assert_eq!(failed.message.as_deref(), Some("Bot not connected"));
    }

    #[test]
    fn test_base_url_trailing_slash_is_tolerated() {
        let client = GatewayClient::new(GatewayConfig::new("http://localhost:3000/")).unwrap();
        assert_eq!(client.url("/api/status"), "http://localhost:3000/api/status");
    }
}
