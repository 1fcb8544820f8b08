//! HTTP client for the credential exchange service.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info_span, Instrument};

use crate::federation::{CredentialExchange, ExchangeError, LoginAssertion};
use crate::{endpoint_url, APP_USER_AGENT};

/// Temporary credentials issued by the exchange.
#[derive(Clone, Debug)]
pub struct FederatedCredentials {
    pub key_id: String,
    pub secret: SecretString,
    pub expires_in: u64,
}

/// Credential exchange reached over HTTP.
///
/// The value owns the credential slot that `refresh` fills. Flows sharing one
/// instance also share the slot; keep one instance per independent flow when
/// concurrent logins must not overwrite each other.
#[derive(Debug)]
pub struct HttpCredentialExchange {
    base_url: String,
    credentials: RwLock<Option<FederatedCredentials>>,
}

fn exchange_error_message(json_response: &Value) -> &str {
    json_response
        .get("errors")
        .and_then(|v| v.get(0))
        .and_then(Value::as_str)
        .unwrap_or("")
}

impl HttpCredentialExchange {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            credentials: RwLock::new(None),
        }
    }

    /// Credentials from the most recent successful refresh, if any.
    pub async fn credentials(&self) -> Option<FederatedCredentials> {
        self.credentials.read().await.clone()
    }
}

#[async_trait]
impl CredentialExchange for HttpCredentialExchange {
    async fn refresh(
        &self,
        identity_pool_id: &str,
        assertion: &LoginAssertion,
    ) -> Result<(), ExchangeError> {
        let client = Client::builder().user_agent(APP_USER_AGENT).build()?;

        let refresh_url = endpoint_url(
            &self.base_url,
            &format!("/v1/identities/{identity_pool_id}/credentials"),
        )
        .map_err(|err| ExchangeError::new(err.to_string()))?;

        let mut logins = serde_json::Map::new();
        logins.insert(
            assertion.provider.clone(),
            Value::String(assertion.token.expose_secret().to_string()),
        );

        let payload = json!({
            "logins": logins,
            "login_hint": assertion.login_hint,
        });

        let span = info_span!("exchange.refresh", http.method = "POST", url = %refresh_url);
        let response = client
            .post(&refresh_url)
            .json(&payload)
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let json_response: Value = response.json().await?;

            let message = match exchange_error_message(&json_response) {
                "" => status.to_string(),
                message => message.to_string(),
            };

            return Err(ExchangeError::new(message));
        }

        let json_response: Value = response.json().await?;
        let key_id = json_response
            .get("data")
            .and_then(|v| v.get("key_id"))
            .and_then(Value::as_str)
            .ok_or_else(|| ExchangeError::new("Error parsing JSON response: no key_id found"))?;
        let secret = json_response
            .get("data")
            .and_then(|v| v.get("secret"))
            .and_then(Value::as_str)
            .ok_or_else(|| ExchangeError::new("Error parsing JSON response: no secret found"))?;
        let expires_in = json_response
            .get("data")
            .and_then(|v| v.get("expires_in"))
            .and_then(Value::as_u64)
            .unwrap_or(900);

        *self.credentials.write().await = Some(FederatedCredentials {
            key_id: key_id.to_string(),
            secret: SecretString::from(secret.to_string()),
            expires_in,
        });

        debug!("refreshed credentials for {}", assertion.login_hint);

        Ok(())
    }
}
