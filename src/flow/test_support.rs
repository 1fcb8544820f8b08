//! In-memory collaborators for flow tests.

use async_trait::async_trait;
use secrecy::SecretString;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::directory::attributes::Attribute;
use crate::directory::{
    AuthenticationAck, CodeDelivery, DirectoryError, DirectoryPool, DirectoryUser, Session, SignUp,
};
use crate::federation::{CredentialExchange, ExchangeError, FederationConfig, LoginAssertion};

pub(crate) fn config() -> FederationConfig {
    FederationConfig::new("eu-1", "pool-1", "idp-1")
}

pub(crate) fn verified_attributes() -> Vec<Attribute> {
    vec![
        Attribute::new("email", "a@b.com"),
        Attribute::new("email_verified", "true"),
    ]
}

pub(crate) fn unverified_attributes() -> Vec<Attribute> {
    vec![Attribute::new("email", "a@b.com")]
}

/// Scripted directory user: every operation returns its configured result and
/// counts how often it was called.
#[derive(Debug)]
pub(crate) struct FakeUser {
    pub username: String,
    pub authenticate: Result<AuthenticationAck, DirectoryError>,
    pub session: Result<Session, DirectoryError>,
    pub attributes: Result<Vec<Attribute>, DirectoryError>,
    pub update: Result<(), DirectoryError>,
    pub delivery: Result<CodeDelivery, DirectoryError>,
    pub authenticate_calls: AtomicUsize,
    pub session_calls: AtomicUsize,
    pub attribute_fetches: AtomicUsize,
    pub code_requests: AtomicUsize,
}

impl Default for FakeUser {
    fn default() -> Self {
        Self {
            username: "alice".to_string(),
            authenticate: Ok(AuthenticationAck::Authenticated),
            session: Ok(Session::new(
                "alice",
                SecretString::from("id-token".to_string()),
            )),
            attributes: Ok(Vec::new()),
            update: Ok(()),
            delivery: Ok(CodeDelivery::InputRequired {
                medium: "EMAIL".to_string(),
            }),
            authenticate_calls: AtomicUsize::new(0),
            session_calls: AtomicUsize::new(0),
            attribute_fetches: AtomicUsize::new(0),
            code_requests: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DirectoryUser for FakeUser {
    fn username(&self) -> &str {
        &self.username
    }

    async fn authenticate(
        &self,
        _password: &SecretString,
    ) -> Result<AuthenticationAck, DirectoryError> {
        self.authenticate_calls.fetch_add(1, Ordering::SeqCst);
        self.authenticate.clone()
    }

    async fn session(&self) -> Result<Session, DirectoryError> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);
        self.session.clone()
    }

    async fn attributes(&self) -> Result<Vec<Attribute>, DirectoryError> {
        self.attribute_fetches.fetch_add(1, Ordering::SeqCst);
        self.attributes.clone()
    }

    async fn update_attributes(&self, _attributes: Vec<Attribute>) -> Result<(), DirectoryError> {
        self.update.clone()
    }

    async fn request_verification_code(
        &self,
        _attribute: &str,
    ) -> Result<CodeDelivery, DirectoryError> {
        self.code_requests.fetch_add(1, Ordering::SeqCst);
        self.delivery.clone()
    }

    async fn change_password(
        &self,
        _current: &SecretString,
        _replacement: &SecretString,
    ) -> Result<(), DirectoryError> {
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct FakePool {
    pub user: Arc<FakeUser>,
    /// Confirmed flag the sign-up reports, or the sign-up rejection.
    pub sign_up: Result<bool, DirectoryError>,
}

impl FakePool {
    pub(crate) fn new(user: FakeUser) -> Self {
        Self {
            user: Arc::new(user),
            sign_up: Ok(true),
        }
    }
}

#[async_trait]
impl DirectoryPool for FakePool {
    fn user(&self, _username: &str) -> Arc<dyn DirectoryUser> {
        Arc::clone(&self.user) as Arc<dyn DirectoryUser>
    }

    async fn sign_up(
        &self,
        _username: &str,
        _password: &SecretString,
        _attributes: Vec<Attribute>,
    ) -> Result<SignUp, DirectoryError> {
        let confirmed = self.sign_up.clone()?;
        Ok(SignUp {
            user: Arc::clone(&self.user) as Arc<dyn DirectoryUser>,
            confirmed,
        })
    }
}

/// Scripted credential exchange recording every assertion it receives.
#[derive(Debug, Default)]
pub(crate) struct FakeExchange {
    pub error: Option<ExchangeError>,
    pub assertions: Mutex<Vec<LoginAssertion>>,
}

impl FakeExchange {
    pub(crate) fn failing(message: &str) -> Self {
        Self {
            error: Some(ExchangeError::new(message)),
            assertions: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn refresh_count(&self) -> usize {
        self.assertions.lock().expect("assertions lock").len()
    }
}

#[async_trait]
impl CredentialExchange for FakeExchange {
    async fn refresh(
        &self,
        _identity_pool_id: &str,
        assertion: &LoginAssertion,
    ) -> Result<(), ExchangeError> {
        self.assertions
            .lock()
            .expect("assertions lock")
            .push(assertion.clone());
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}
