//! Credential federation: exchanging a directory session token for
//! pool-scoped temporary credentials.

pub mod http;

use async_trait::async_trait;
use secrecy::SecretString;
use std::fmt;
use thiserror::Error;
use tracing::instrument;

/// Configuration for one login/registration flow. Immutable once built.
#[derive(Clone, Debug)]
pub struct FederationConfig {
    region: String,
    user_pool_id: String,
    identity_pool_id: String,
    mandatory_email_verification: Option<bool>,
}

impl FederationConfig {
    /// Email verification defaults to mandatory until explicitly disabled.
    #[must_use]
    pub fn new(
        region: impl Into<String>,
        user_pool_id: impl Into<String>,
        identity_pool_id: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            user_pool_id: user_pool_id.into(),
            identity_pool_id: identity_pool_id.into(),
            mandatory_email_verification: None,
        }
    }

    #[must_use]
    pub fn with_mandatory_email_verification(mut self, mandatory: bool) -> Self {
        self.mandatory_email_verification = Some(mandatory);
        self
    }

    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    #[must_use]
    pub fn user_pool_id(&self) -> &str {
        &self.user_pool_id
    }

    #[must_use]
    pub fn identity_pool_id(&self) -> &str {
        &self.identity_pool_id
    }

    /// Key for the login assertion: `{directory_host}/{user_pool_id}`.
    #[must_use]
    pub fn provider_id(&self) -> String {
        format!("directory.{}.identita.dev/{}", self.region, self.user_pool_id)
    }
}

/// Whether a login must pass email verification before completing.
///
/// Fails closed: a missing config or an unset flag means mandatory; only an
/// explicit `false` disables the gate.
#[must_use]
pub fn email_verification_is_mandatory(config: Option<&FederationConfig>) -> bool {
    config.map_or(true, |config| {
        config.mandatory_email_verification.unwrap_or(true)
    })
}

/// A rejection from the credential exchange service.
#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub struct ExchangeError {
    /// The exchange service's message, passed through verbatim.
    pub message: String,
}

impl ExchangeError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Login assertion handed to the credential exchange.
#[derive(Clone, Debug)]
pub struct LoginAssertion {
    pub provider: String,
    pub token: SecretString,
    pub login_hint: String,
}

/// Credential exchange capability. Implementations own the credential slot
/// that a successful refresh mutates.
#[async_trait]
pub trait CredentialExchange: fmt::Debug + Send + Sync {
    /// Issue or refresh temporary credentials for the assertion.
    async fn refresh(
        &self,
        identity_pool_id: &str,
        assertion: &LoginAssertion,
    ) -> Result<(), ExchangeError>;
}

/// Exchange a directory session token for pool-scoped temporary credentials.
///
/// Resolves with no payload; the credentials land in the slot owned by
/// `exchange`. That slot is shared mutable state: a later federation call
/// through the same exchange value overwrites it, last write wins. Callers
/// running concurrent logins must serialize them or use separate exchanges.
#[instrument(skip(exchange, token, config))]
pub async fn federate(
    exchange: &dyn CredentialExchange,
    username: &str,
    token: &SecretString,
    config: &FederationConfig,
) -> Result<(), ExchangeError> {
    let assertion = LoginAssertion {
        provider: config.provider_id(),
        token: token.clone(),
        // The exchange cannot disambiguate identities with several logins
        // without the hint.
        login_hint: username.to_string(),
    };

    exchange.refresh(config.identity_pool_id(), &assertion).await
}
