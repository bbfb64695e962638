//! Client for the Supabase auth (GoTrue) REST endpoints.
//!
//! Every successful sign-in, sign-up with an immediate session, sign-out and
//! restore is published through the client's [`SessionHub`].

use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared::config::SupabaseConfig;
use shared::{AuthUser, Session};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{error_message, AuthError};
use crate::session::{SessionHub, SessionProvider};

/// Result of a sign-up request
#[derive(Debug, Clone, PartialEq)]
pub enum SignUp {
    /// The account is active and signed in
    SignedIn(Session),
    /// The account exists but the email address must be confirmed first
    ConfirmationRequired(AuthUser),
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(Session),
    User(AuthUser),
}

/// Supabase auth client
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Client,
    auth_url: Url,
    anon_key: String,
    hub: SessionHub,
}

impl AuthClient {
    /// Create a new auth client for the project at `project_url`
    pub fn new(project_url: &str, anon_key: &str, timeout: Duration) -> Result<Self, AuthError> {
        let auth_url = Url::parse(project_url)
            .and_then(|url| url.join("auth/v1/"))
            .map_err(|e| AuthError::Invalid(format!("invalid project URL {}: {}", project_url, e)))?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            auth_url,
            anon_key: anon_key.to_string(),
            hub: SessionHub::new(),
        })
    }

    /// Create a client from the `[supabase]` config section
    pub fn from_config(config: &SupabaseConfig) -> Result<Self, AuthError> {
        Self::new(
            &config.url,
            &config.anon_key,
            Duration::from_secs(config.timeout_seconds),
        )
    }

    pub fn hub(&self) -> &SessionHub {
        &self.hub
    }

    /// Subscribe a new provider to session changes
    pub fn subscribe(&self) -> SessionProvider {
        SessionProvider::mount(&self.hub)
    }

    /// Session currently held by the client
    pub fn current_session(&self) -> Option<Session> {
        self.hub.current()
    }

    /// Adopt a previously stored session unless it has expired
    ///
    /// Returns the session that is now current.
    pub fn restore(&self, stored: Option<Session>) -> Option<Session> {
        let session = stored.filter(|session| {
            let expired = session.is_expired_at(Utc::now());
            if expired {
                info!(user_id = %session.user.id, "Stored session expired");
            }
            !expired
        });
        self.hub.publish(session.clone());
        session
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        self.auth_url
            .join(path)
            .map_err(|e| AuthError::Invalid(format!("invalid auth path {}: {}", path, e)))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, AuthError> {
        let body = self.send_raw(builder).await?;
        serde_json::from_slice(&body).map_err(|e| AuthError::Parse(e.to_string()))
    }

    async fn send_raw(&self, builder: RequestBuilder) -> Result<Vec<u8>, AuthError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = error_message(status.as_u16(), &body);
            warn!(status = %status, message = %message, "Auth request rejected");
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body.to_vec())
    }

    /// Sign in with email and password
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let credentials = credentials(email, password)?;
        let mut url = self.endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        debug!(email = credentials.email, "Signing in");
        let session: Session = self
            .send(self.request(Method::POST, url).json(&credentials))
            .await?;

        info!(user_id = %session.user.id, "Signed in");
        self.hub.publish(Some(session.clone()));
        Ok(session)
    }

    /// Create an account with email and password
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp, AuthError> {
        let credentials = credentials(email, password)?;
        let url = self.endpoint("signup")?;

        debug!(email = credentials.email, "Signing up");
        let response: SignUpResponse = self
            .send(self.request(Method::POST, url).json(&credentials))
            .await?;

        match response {
            SignUpResponse::Session(session) => {
                info!(user_id = %session.user.id, "Signed up and signed in");
                self.hub.publish(Some(session.clone()));
                Ok(SignUp::SignedIn(session))
            }
            SignUpResponse::User(user) => {
                info!(user_id = %user.id, "Signed up, email confirmation pending");
                Ok(SignUp::ConfirmationRequired(user))
            }
        }
    }

    /// Sign out the current session
    ///
    /// The local session is cleared even when the remote call fails; the
    /// remote error is still reported.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(session) = self.hub.current() else {
            debug!("Sign-out without a session");
            return Ok(());
        };

        let url = self.endpoint("logout")?;
        let result = self
            .send_raw(
                self.request(Method::POST, url)
                    .bearer_auth(&session.access_token),
            )
            .await;

        self.hub.publish(None);
        info!(user_id = %session.user.id, "Signed out");
        result.map(|_| ())
    }

    /// Look up the user behind `session`
    pub async fn user(&self, session: &Session) -> Result<AuthUser, AuthError> {
        let url = self.endpoint("user")?;
        self.send(
            self.request(Method::GET, url)
                .bearer_auth(&session.access_token),
        )
        .await
    }
}

fn credentials<'a>(email: &'a str, password: &'a str) -> Result<Credentials<'a>, AuthError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AuthError::Invalid("Email is required".to_string()));
    }
    if password.is_empty() {
        return Err(AuthError::Invalid("Password is required".to_string()));
    }
    Ok(Credentials { email, password })
}
