//! Contracts for the remote identity directory.
//!
//! The directory holds accounts, credentials and profile attributes. The
//! service's callback-style completions are collapsed here into single
//! asynchronous calls resolving to tagged results; rejections carry the
//! directory's own message verbatim.

pub mod attributes;
pub mod http;

use async_trait::async_trait;
use secrecy::SecretString;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::directory::attributes::Attribute;

/// Code the directory uses for accounts that have not completed sign-up
/// confirmation.
pub const UNCONFIRMED_ACCOUNT: &str = "UserNotConfirmedException";

/// A rejection from the directory service.
#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub struct DirectoryError {
    /// Machine-readable code, when the directory provides one.
    pub code: Option<String>,
    /// The directory's message, passed through verbatim.
    pub message: String,
}

impl DirectoryError {
    #[must_use]
    pub fn new(code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The account exists but has not been confirmed yet.
    #[must_use]
    pub fn is_unconfirmed(&self) -> bool {
        self.code.as_deref() == Some(UNCONFIRMED_ACCOUNT)
    }
}

impl From<reqwest::Error> for DirectoryError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(None, err.to_string())
    }
}

/// Completion of a credential check that did not fail outright.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AuthenticationAck {
    /// Credentials accepted; a session can be fetched.
    Authenticated,
    /// A second factor is needed before a session is issued.
    MfaRequired,
    /// A new password must be set before a session is issued.
    NewPasswordRequired,
}

/// How the directory handled a verification-code request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CodeDelivery {
    /// A code was sent and the user must type it in.
    InputRequired { medium: String },
    /// The directory decided no user input is needed.
    NotNeeded,
}

/// Proof of a successful directory authentication.
#[derive(Clone, Debug)]
pub struct Session {
    username: String,
    token: SecretString,
}

impl Session {
    #[must_use]
    pub fn new(username: impl Into<String>, token: SecretString) -> Self {
        Self {
            username: username.into(),
            token,
        }
    }

    /// Resolved account username; may differ from the alias used to log in.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Identity token issued by the directory. Opaque and time-bounded.
    #[must_use]
    pub fn token(&self) -> &SecretString {
        &self.token
    }
}

/// Result of a sign-up request.
#[derive(Debug)]
pub struct SignUp {
    pub user: Arc<dyn DirectoryUser>,
    pub confirmed: bool,
}

/// Per-user directory operations.
#[async_trait]
pub trait DirectoryUser: fmt::Debug + Send + Sync {
    fn username(&self) -> &str;

    /// Submit the password for this account.
    async fn authenticate(&self, password: &SecretString)
        -> Result<AuthenticationAck, DirectoryError>;

    /// Fetch the session for an authenticated account.
    async fn session(&self) -> Result<Session, DirectoryError>;

    /// Fetch the account's profile attributes in wire list form.
    async fn attributes(&self) -> Result<Vec<Attribute>, DirectoryError>;

    async fn update_attributes(&self, attributes: Vec<Attribute>) -> Result<(), DirectoryError>;

    /// Ask the directory to deliver a verification code for one attribute.
    async fn request_verification_code(
        &self,
        attribute: &str,
    ) -> Result<CodeDelivery, DirectoryError>;

    async fn change_password(
        &self,
        current: &SecretString,
        replacement: &SecretString,
    ) -> Result<(), DirectoryError>;
}

/// Pool-level directory operations.
#[async_trait]
pub trait DirectoryPool: fmt::Debug + Send + Sync {
    /// Handle to an account in this pool. Creating the handle performs no
    /// remote call.
    fn user(&self, username: &str) -> Arc<dyn DirectoryUser>;

    async fn sign_up(
        &self,
        username: &str,
        password: &SecretString,
        attributes: Vec<Attribute>,
    ) -> Result<SignUp, DirectoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfirmed_is_detected_by_code() {
        let err = DirectoryError::new(
            Some(UNCONFIRMED_ACCOUNT.to_string()),
            "account not confirmed",
        );
        assert!(err.is_unconfirmed());
    }

    #[test]
    fn other_codes_are_not_unconfirmed() {
        let err = DirectoryError::new(Some("NotAuthorizedException".to_string()), "bad password");
        assert!(!err.is_unconfirmed());

        let err = DirectoryError::new(None, "bad password");
        assert!(!err.is_unconfirmed());
    }

    #[test]
    fn display_is_the_verbatim_message() {
        let err = DirectoryError::new(Some("code".to_string()), "something went wrong");
        assert_eq!(err.to_string(), "something went wrong");
    }

    #[test]
    fn session_exposes_resolved_username() {
        let session = Session::new("alice", SecretString::from("token".to_string()));
        assert_eq!(session.username(), "alice");
    }
}
