//! The email-verification gate.

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::directory::{attributes, CodeDelivery, DirectoryUser};
use crate::federation::{email_verification_is_mandatory, FederationConfig};
use crate::flow::Outcome;

/// Attribute holding the account email address.
pub const EMAIL_ATTRIBUTE: &str = "email";

/// Attribute the directory sets to the literal string `"true"` once the
/// email is verified.
pub const EMAIL_VERIFIED_ATTRIBUTE: &str = "email_verified";

/// Decide whether a login may complete without email verification.
///
/// Fetches the current attributes first; a fetch failure has no dedicated
/// [`Outcome`] variant and propagates as an error. With verification off, or
/// with a verified email, resolves `LoggedIn`; otherwise asks the directory
/// to deliver a verification code and maps the delivery result.
///
/// # Errors
/// Returns an error when the attribute fetch fails.
#[instrument(skip(user))]
pub async fn decide(
    user: &Arc<dyn DirectoryUser>,
    config: Option<&FederationConfig>,
) -> Result<Outcome> {
    let fetched = user.attributes().await?;
    let attributes = attributes::decode(&fetched);

    // Only the exact string "true" counts as verified.
    let verified = attributes.get(EMAIL_VERIFIED_ATTRIBUTE).map(String::as_str) == Some("true");

    if !email_verification_is_mandatory(config) || verified {
        return Ok(Outcome::LoggedIn {
            user: Arc::clone(user),
            attributes,
        });
    }

    match user.request_verification_code(EMAIL_ATTRIBUTE).await {
        Ok(CodeDelivery::InputRequired { medium }) => Ok(Outcome::EmailVerificationRequired {
            user: Arc::clone(user),
            attributes,
            delivery_medium: medium,
        }),
        // The directory may report that no input is needed, e.g. the address
        // was verified through a side channel. Treat it as a completed login.
        Ok(CodeDelivery::NotNeeded) => {
            debug!("verification code not needed for {}", user.username());
            Ok(Outcome::LoggedIn {
                user: Arc::clone(user),
                attributes,
            })
        }
        Err(err) => Ok(Outcome::EmailVerificationFailed {
            user: Arc::clone(user),
            attributes,
            reason: err.message,
        }),
    }
}
