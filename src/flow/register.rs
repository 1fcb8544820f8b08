//! Account registration.

use anyhow::Result;
use secrecy::SecretString;
use tracing::{debug, instrument};

use crate::directory::attributes::{self, AttributeMap};
use crate::directory::DirectoryPool;
use crate::federation::{CredentialExchange, FederationConfig};
use crate::flow::{login, Outcome};

/// Create a directory account and, unless it still needs confirmation, log it
/// in right away.
///
/// A freshly auto-confirmed account passes the same verification gate as any
/// other login.
///
/// # Errors
/// Returns an error when the sign-up request itself is rejected, carrying the
/// directory's message.
#[instrument(skip(pool, exchange, password, attributes))]
pub async fn register(
    pool: &dyn DirectoryPool,
    exchange: &dyn CredentialExchange,
    config: &FederationConfig,
    username: &str,
    password: &SecretString,
    attributes: AttributeMap,
) -> Result<Outcome> {
    let encoded = attributes::encode(&attributes);
    let signup = pool.sign_up(username, password, encoded).await?;

    if !signup.confirmed {
        debug!("account {username} requires confirmation");
        return Ok(Outcome::ConfirmationRequired { user: signup.user });
    }

    login::authenticate(pool, exchange, username, password, config).await
}
