//! Login, registration and attribute-update flows.
//!
//! Every public entry point drives a linear chain of awaited remote calls and
//! resolves to exactly one terminal [`Outcome`]. Remote failures with no
//! dedicated variant surface as errors carrying the service's own message.

pub mod login;
pub mod register;
pub mod update;
pub mod verification;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use crate::directory::attributes::AttributeMap;
use crate::directory::DirectoryUser;

/// Terminal result of one flow invocation.
///
/// The caller routes this into its own state; the flows hold nothing back
/// after producing it.
#[derive(Debug)]
pub enum Outcome {
    /// Authentication, federation and the verification gate all passed.
    LoggedIn {
        user: Arc<dyn DirectoryUser>,
        attributes: AttributeMap,
    },
    /// The directory or the credential exchange rejected the login.
    LoginFailure {
        user: Option<Arc<dyn DirectoryUser>>,
        reason: String,
    },
    /// A second factor is required; the flow re-enters via a fresh call.
    MfaRequired { user: Arc<dyn DirectoryUser> },
    /// A new password must be set; the flow re-enters via a fresh call.
    NewPasswordRequired { user: Arc<dyn DirectoryUser> },
    /// The account has not been confirmed yet.
    ConfirmationRequired { user: Arc<dyn DirectoryUser> },
    /// Login is blocked until the delivered code is entered.
    EmailVerificationRequired {
        user: Arc<dyn DirectoryUser>,
        attributes: AttributeMap,
        delivery_medium: String,
    },
    /// The verification-code request itself failed.
    EmailVerificationFailed {
        user: Arc<dyn DirectoryUser>,
        attributes: AttributeMap,
        reason: String,
    },
    /// Attribute update finished without re-running the verification gate.
    AttributesUpdated { attributes: AttributeMap },
}

impl Outcome {
    /// Stable label for logs and the CLI.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::LoggedIn { .. } => "logged-in",
            Self::LoginFailure { .. } => "login-failure",
            Self::MfaRequired { .. } => "mfa-required",
            Self::NewPasswordRequired { .. } => "new-password-required",
            Self::ConfirmationRequired { .. } => "confirmation-required",
            Self::EmailVerificationRequired { .. } => "email-verification-required",
            Self::EmailVerificationFailed { .. } => "email-verification-failed",
            Self::AttributesUpdated { .. } => "attributes-updated",
        }
    }

    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        matches!(self, Self::LoggedIn { .. })
    }

    #[must_use]
    pub const fn is_login_failure(&self) -> bool {
        matches!(self, Self::LoginFailure { .. })
    }
}
