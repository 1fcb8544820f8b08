//! The primary login flow.

use anyhow::{bail, Result};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::directory::{AuthenticationAck, DirectoryPool, DirectoryUser};
use crate::federation::{federate, CredentialExchange, FederationConfig};
use crate::flow::{verification, Outcome};

/// Fixed message for the programming error of continuing a login with no
/// authenticated user.
pub const NO_AUTHENTICATED_USER: &str = "cannot complete login: no authenticated user";

/// Authenticate against the directory, federate the session token and run the
/// verification gate.
///
/// Every remote failure maps to exactly one [`Outcome`]; nothing escapes as a
/// stray rejection except the gate's attribute fetch, which has no variant.
///
/// # Errors
/// Returns an error only when the verification gate cannot fetch attributes.
#[instrument(skip(pool, exchange, password))]
pub async fn authenticate(
    pool: &dyn DirectoryPool,
    exchange: &dyn CredentialExchange,
    username: &str,
    password: &SecretString,
    config: &FederationConfig,
) -> Result<Outcome> {
    let user = pool.user(username);

    match user.authenticate(password).await {
        Ok(AuthenticationAck::Authenticated) => {}
        Ok(AuthenticationAck::MfaRequired) => return Ok(Outcome::MfaRequired { user }),
        Ok(AuthenticationAck::NewPasswordRequired) => {
            return Ok(Outcome::NewPasswordRequired { user })
        }
        Err(err) if err.is_unconfirmed() => return Ok(Outcome::ConfirmationRequired { user }),
        Err(err) => {
            return Ok(Outcome::LoginFailure {
                user: Some(user),
                reason: err.message,
            })
        }
    }

    complete_login(Some(user), exchange, config).await
}

/// Continue a login for an already-authenticated user: fetch the session,
/// federate its token and run the verification gate.
///
/// # Errors
/// Passing `None` is a caller bug and rejects immediately with
/// [`NO_AUTHENTICATED_USER`] instead of producing an Outcome. Otherwise only
/// the gate's attribute fetch can reject.
#[instrument(skip(user, exchange))]
pub async fn complete_login(
    user: Option<Arc<dyn DirectoryUser>>,
    exchange: &dyn CredentialExchange,
    config: &FederationConfig,
) -> Result<Outcome> {
    let Some(user) = user else {
        bail!(NO_AUTHENTICATED_USER);
    };

    let session = match user.session().await {
        Ok(session) => session,
        Err(err) => {
            return Ok(Outcome::LoginFailure {
                user: Some(user),
                reason: err.message,
            })
        }
    };

    if let Err(err) = federate(exchange, session.username(), session.token(), config).await {
        return Ok(Outcome::LoginFailure {
            user: Some(user),
            reason: err.message,
        });
    }

    debug!("federated credentials for {}", session.username());

    verification::decide(&user, Some(config)).await
}
