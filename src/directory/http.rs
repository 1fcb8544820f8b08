//! HTTP client for the identity directory.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info_span, Instrument};

use crate::directory::attributes::Attribute;
use crate::directory::{
    AuthenticationAck, CodeDelivery, DirectoryError, DirectoryPool, DirectoryUser, Session, SignUp,
};
use crate::{endpoint_url, APP_USER_AGENT};

/// Header carrying the directory access token after authentication.
pub const TOKEN_HEADER: &str = "X-Identita-Token";

fn directory_error_message(json_response: &Value) -> &str {
    json_response
        .get("errors")
        .and_then(|v| v.get(0))
        .and_then(Value::as_str)
        .unwrap_or("")
}

async fn rejection(response: Response) -> DirectoryError {
    let status = response.status();

    let json_response: Value = match response.json().await {
        Ok(json_response) => json_response,
        Err(err) => return DirectoryError::new(None, err.to_string()),
    };

    let code = json_response
        .get("code")
        .and_then(Value::as_str)
        .map(str::to_string);

    let message = match directory_error_message(&json_response) {
        "" => status.to_string(),
        message => message.to_string(),
    };

    DirectoryError::new(code, message)
}

fn client() -> Result<Client, DirectoryError> {
    Ok(Client::builder().user_agent(APP_USER_AGENT).build()?)
}

/// Directory pool reached over HTTP.
#[derive(Clone, Debug)]
pub struct HttpDirectoryPool {
    base_url: String,
    pool_id: String,
}

impl HttpDirectoryPool {
    #[must_use]
    pub fn new(base_url: impl Into<String>, pool_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            pool_id: pool_id.into(),
        }
    }

    fn url(&self, path: &str) -> Result<String, DirectoryError> {
        endpoint_url(&self.base_url, &format!("/v1/pools/{}{path}", self.pool_id))
            .map_err(|err| DirectoryError::new(None, err.to_string()))
    }
}

#[async_trait]
impl DirectoryPool for HttpDirectoryPool {
    fn user(&self, username: &str) -> Arc<dyn DirectoryUser> {
        Arc::new(HttpDirectoryUser {
            base_url: self.base_url.clone(),
            pool_id: self.pool_id.clone(),
            username: username.to_string(),
            token: Mutex::new(None),
        })
    }

    async fn sign_up(
        &self,
        username: &str,
        password: &SecretString,
        attributes: Vec<Attribute>,
    ) -> Result<SignUp, DirectoryError> {
        let client = client()?;
        let signup_url = self.url("/signup")?;

        let payload = json!({
            "username": username,
            "password": password.expose_secret(),
            "attributes": attributes,
        });

        let span = info_span!("directory.sign_up", http.method = "POST", url = %signup_url);
        let response = client
            .post(&signup_url)
            .json(&payload)
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let json_response: Value = response.json().await?;
        let confirmed = json_response
            .get("data")
            .and_then(|v| v.get("confirmed"))
            .and_then(Value::as_bool)
            .ok_or_else(|| {
                DirectoryError::new(None, "Error parsing JSON response: no confirmed flag found")
            })?;

        Ok(SignUp {
            user: self.user(username),
            confirmed,
        })
    }
}

/// Handle to one account in a directory pool.
///
/// `authenticate` stores the access token the directory returns; follow-up
/// operations send it in the [`TOKEN_HEADER`] header and fail with
/// "user is not authenticated" when no token is present yet.
#[derive(Debug)]
pub struct HttpDirectoryUser {
    base_url: String,
    pool_id: String,
    username: String,
    token: Mutex<Option<SecretString>>,
}

impl HttpDirectoryUser {
    fn url(&self, path: &str) -> Result<String, DirectoryError> {
        endpoint_url(
            &self.base_url,
            &format!("/v1/pools/{}/users/{}{path}", self.pool_id, self.username),
        )
        .map_err(|err| DirectoryError::new(None, err.to_string()))
    }

    async fn access_token(&self) -> Result<SecretString, DirectoryError> {
        self.token
            .lock()
            .await
            .clone()
            .ok_or_else(|| DirectoryError::new(None, "user is not authenticated"))
    }
}

#[async_trait]
impl DirectoryUser for HttpDirectoryUser {
    fn username(&self) -> &str {
        &self.username
    }

    async fn authenticate(
        &self,
        password: &SecretString,
    ) -> Result<AuthenticationAck, DirectoryError> {
        let client = client()?;
        let auth_url = self.url("/authenticate")?;

        let span = info_span!("directory.authenticate", http.method = "POST", url = %auth_url);
        let response = client
            .post(&auth_url)
            .json(&json!({"password": password.expose_secret()}))
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let json_response: Value = response.json().await?;

        if let Some(token) = json_response
            .get("data")
            .and_then(|v| v.get("token"))
            .and_then(Value::as_str)
        {
            *self.token.lock().await = Some(SecretString::from(token.to_string()));
        }

        match json_response
            .get("data")
            .and_then(|v| v.get("status"))
            .and_then(Value::as_str)
        {
            Some("authenticated") => Ok(AuthenticationAck::Authenticated),
            Some("mfa_required") => Ok(AuthenticationAck::MfaRequired),
            Some("new_password_required") => Ok(AuthenticationAck::NewPasswordRequired),
            _ => Err(DirectoryError::new(
                None,
                "Error parsing JSON response: no status found",
            )),
        }
    }

    async fn session(&self) -> Result<Session, DirectoryError> {
        let client = client()?;
        let session_url = self.url("/session")?;
        let token = self.access_token().await?;

        let span = info_span!("directory.session", http.method = "POST", url = %session_url);
        let response = client
            .post(&session_url)
            .header(TOKEN_HEADER, token.expose_secret())
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let json_response: Value = response.json().await?;
        let username = json_response
            .get("data")
            .and_then(|v| v.get("username"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                DirectoryError::new(None, "Error parsing JSON response: no username found")
            })?;
        let id_token = json_response
            .get("data")
            .and_then(|v| v.get("id_token"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                DirectoryError::new(None, "Error parsing JSON response: no id_token found")
            })?;

        Ok(Session::new(
            username,
            SecretString::from(id_token.to_string()),
        ))
    }

    async fn attributes(&self) -> Result<Vec<Attribute>, DirectoryError> {
        let client = client()?;
        let attributes_url = self.url("/attributes")?;
        let token = self.access_token().await?;

        let span = info_span!("directory.attributes", http.method = "GET", url = %attributes_url);
        let response = client
            .get(&attributes_url)
            .header(TOKEN_HEADER, token.expose_secret())
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let json_response: Value = response.json().await?;
        let attributes = json_response
            .get("data")
            .and_then(|v| v.get("attributes"))
            .cloned()
            .ok_or_else(|| {
                DirectoryError::new(None, "Error parsing JSON response: no attributes found")
            })?;

        serde_json::from_value(attributes).map_err(|err| DirectoryError::new(None, err.to_string()))
    }

    async fn update_attributes(&self, attributes: Vec<Attribute>) -> Result<(), DirectoryError> {
        let client = client()?;
        let attributes_url = self.url("/attributes")?;
        let token = self.access_token().await?;

        let span = info_span!("directory.update_attributes", http.method = "PUT", url = %attributes_url);
        let response = client
            .put(&attributes_url)
            .header(TOKEN_HEADER, token.expose_secret())
            .json(&json!({ "attributes": attributes }))
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        Ok(())
    }

    async fn request_verification_code(
        &self,
        attribute: &str,
    ) -> Result<CodeDelivery, DirectoryError> {
        let client = client()?;
        let code_url = self.url(&format!("/attributes/{attribute}/verification-code"))?;
        let token = self.access_token().await?;

        let span = info_span!("directory.verification_code", http.method = "POST", url = %code_url);
        let response = client
            .post(&code_url)
            .header(TOKEN_HEADER, token.expose_secret())
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let json_response: Value = response.json().await?;
        let input_required = json_response
            .get("data")
            .and_then(|v| v.get("input_required"))
            .and_then(Value::as_bool)
            .ok_or_else(|| {
                DirectoryError::new(
                    None,
                    "Error parsing JSON response: no input_required flag found",
                )
            })?;

        if !input_required {
            return Ok(CodeDelivery::NotNeeded);
        }

        let medium = json_response
            .get("data")
            .and_then(|v| v.get("medium"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                DirectoryError::new(None, "Error parsing JSON response: no medium found")
            })?;

        Ok(CodeDelivery::InputRequired {
            medium: medium.to_string(),
        })
    }

    async fn change_password(
        &self,
        current: &SecretString,
        replacement: &SecretString,
    ) -> Result<(), DirectoryError> {
        let client = client()?;
        let password_url = self.url("/password")?;
        let token = self.access_token().await?;

        let payload = json!({
            "current": current.expose_secret(),
            "replacement": replacement.expose_secret(),
        });

        let span = info_span!("directory.change_password", http.method = "POST", url = %password_url);
        let response = client
            .post(&password_url)
            .header(TOKEN_HEADER, token.expose_secret())
            .json(&payload)
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use std::net::TcpListener;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    async fn authenticated_user(server: &MockServer) -> Result<Arc<dyn DirectoryUser>> {
        Mock::given(method("POST"))
            .and(path("/v1/pools/pool-1/users/alice/authenticate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"status": "authenticated", "token": "access-1"}
            })))
            .mount(server)
            .await;

        let pool = HttpDirectoryPool::new(server.uri(), "pool-1");
        let user = pool.user("alice");
        let ack = user
            .authenticate(&SecretString::from("hunter2".to_string()))
            .await?;
        assert_eq!(ack, AuthenticationAck::Authenticated);
        Ok(user)
    }

    #[tokio::test]
    async fn authenticate_maps_challenges() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/pools/pool-1/users/alice/authenticate"))
            .and(body_json(json!({"password": "hunter2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"status": "mfa_required"}
            })))
            .mount(&server)
            .await;

        let pool = HttpDirectoryPool::new(server.uri(), "pool-1");
        let user = pool.user("alice");
        let ack = user
            .authenticate(&SecretString::from("hunter2".to_string()))
            .await?;
        assert_eq!(ack, AuthenticationAck::MfaRequired);
        Ok(())
    }

    #[tokio::test]
    async fn authenticate_surfaces_code_and_message() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/pools/pool-1/users/alice/authenticate"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "code": "UserNotConfirmedException",
                "errors": ["account not confirmed"]
            })))
            .mount(&server)
            .await;

        let pool = HttpDirectoryPool::new(server.uri(), "pool-1");
        let user = pool.user("alice");
        let err = user
            .authenticate(&SecretString::from("hunter2".to_string()))
            .await
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;
        assert!(err.is_unconfirmed());
        assert_eq!(err.message, "account not confirmed");
        Ok(())
    }

    #[tokio::test]
    async fn session_requires_prior_authentication() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        let pool = HttpDirectoryPool::new(server.uri(), "pool-1");
        let user = pool.user("alice");
        let err = user
            .session()
            .await
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;
        assert_eq!(err.message, "user is not authenticated");
        Ok(())
    }

    #[tokio::test]
    async fn session_returns_resolved_username_and_token() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        let user = authenticated_user(&server).await?;

        Mock::given(method("POST"))
            .and(path("/v1/pools/pool-1/users/alice/session"))
            .and(header(TOKEN_HEADER, "access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"username": "alice-resolved", "id_token": "id-token-1"}
            })))
            .mount(&server)
            .await;

        let session = user.session().await?;
        assert_eq!(session.username(), "alice-resolved");
        assert_eq!(session.token().expose_secret(), "id-token-1");
        Ok(())
    }

    #[tokio::test]
    async fn attributes_decode_wire_list() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        let user = authenticated_user(&server).await?;

        Mock::given(method("GET"))
            .and(path("/v1/pools/pool-1/users/alice/attributes"))
            .and(header(TOKEN_HEADER, "access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"attributes": [
                    {"name": "email", "value": "a@b.com"},
                    {"name": "email_verified", "value": "true"}
                ]}
            })))
            .mount(&server)
            .await;

        let attributes = user.attributes().await?;
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes[0], Attribute::new("email", "a@b.com"));
        Ok(())
    }

    #[tokio::test]
    async fn verification_code_maps_input_required() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        let user = authenticated_user(&server).await?;

        Mock::given(method("POST"))
            .and(path(
                "/v1/pools/pool-1/users/alice/attributes/email/verification-code",
            ))
            .and(header(TOKEN_HEADER, "access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"input_required": true, "medium": "EMAIL"}
            })))
            .mount(&server)
            .await;

        let delivery = user.request_verification_code("email").await?;
        assert_eq!(
            delivery,
            CodeDelivery::InputRequired {
                medium: "EMAIL".to_string()
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn verification_code_maps_not_needed() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        let user = authenticated_user(&server).await?;

        Mock::given(method("POST"))
            .and(path(
                "/v1/pools/pool-1/users/alice/attributes/email/verification-code",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"input_required": false}
            })))
            .mount(&server)
            .await;

        let delivery = user.request_verification_code("email").await?;
        assert_eq!(delivery, CodeDelivery::NotNeeded);
        Ok(())
    }

    #[tokio::test]
    async fn sign_up_reports_confirmation_state() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/pools/pool-1/signup"))
            .and(body_json(json!({
                "username": "bob",
                "password": "hunter2",
                "attributes": [{"name": "email", "value": "b@b.com"}]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": {"confirmed": false}
            })))
            .mount(&server)
            .await;

        let pool = HttpDirectoryPool::new(server.uri(), "pool-1");
        let signup = pool
            .sign_up(
                "bob",
                &SecretString::from("hunter2".to_string()),
                vec![Attribute::new("email", "b@b.com")],
            )
            .await?;
        assert!(!signup.confirmed);
        assert_eq!(signup.user.username(), "bob");
        Ok(())
    }

    #[tokio::test]
    async fn change_password_posts_both_secrets() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        let user = authenticated_user(&server).await?;

        Mock::given(method("POST"))
            .and(path("/v1/pools/pool-1/users/alice/password"))
            .and(body_json(json!({
                "current": "hunter2",
                "replacement": "hunter3"
            })))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        user.change_password(
            &SecretString::from("hunter2".to_string()),
            &SecretString::from("hunter3".to_string()),
        )
        .await?;
        Ok(())
    }
}
