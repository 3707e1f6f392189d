// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! Identity provider clients and the translation of their failures into
//! user-facing `AUTH_ERROR`s.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use crate::api_error::ApiError;
use crate::config::Config;
use crate::entity::{LoginResponse, User};
use crate::validate::Validate;

const NETWORK_MESSAGE: &str = "Network error. Please check your internet connection and try again.";

/// A signed-in account as the provider reports it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub id_token: String,
}

impl AuthUser {
    /// Project into the machine-facing [`User`].
    ///
    /// The name falls back to the display name, then the email's local part, then `User`.
    pub fn to_user(&self, fallback_email: &str) -> User {
        let email = self
            .email
            .clone()
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| fallback_email.to_string());
        let name = self
            .display_name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| {
                email
                    .split('@')
                    .next()
                    .filter(|local| !local.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "User".to_string());
        User {
            id: self.uid.clone(),
            email,
            name,
            token: self.id_token.clone(),
        }
    }
}

/// Raw provider failure: an `auth/...` code when one is known, and the provider's message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProviderError {
    pub code: Option<String>,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    fn code(&self) -> &str {
        self.code.as_deref().unwrap_or("")
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, ProviderError>;

    /// Create an account and set its display name.
    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, ProviderError>;

    fn current_user(&self) -> Option<AuthUser>;

    /// Receiver that observes every session change.
    fn on_auth_state_changed(&self) -> watch::Receiver<Option<AuthUser>>;

    async fn sign_out(&self) -> Result<(), ProviderError>;
}

/// Translate a sign-in failure into a user-facing `AUTH_ERROR`.
pub fn sign_in_error(err: &ProviderError) -> ApiError {
    let message = match err.code() {
        "auth/invalid-credential" | "auth/wrong-password" | "auth/user-not-found" => {
            "Invalid email or password. Please check your credentials.".to_string()
        }
        "auth/invalid-email" => "Invalid email address format.".to_string(),
        "auth/user-disabled" => "This account has been disabled. Please contact support.".to_string(),
        "auth/too-many-requests" => {
            "Too many failed login attempts. Please try again later or reset your password."
                .to_string()
        }
        "auth/network-request-failed" => NETWORK_MESSAGE.to_string(),
        "auth/operation-not-allowed" => "Email/password authentication is not enabled.".to_string(),
        "auth/configuration-not-found" | "auth/internal-error" => {
            "Authentication service error. Please try again later.".to_string()
        }
        _ => {
            let stripped = strip_provider_prefix(&err.message);
            if stripped.is_empty() {
                "Authentication failed. Please try again.".to_string()
            } else {
                stripped.to_string()
            }
        }
    };
    ApiError::auth(message, err.code.clone())
}

/// Translate a sign-up failure into a user-facing `AUTH_ERROR`.
pub fn sign_up_error(err: &ProviderError) -> ApiError {
    let message = match err.code() {
        "auth/email-already-in-use" => {
            "This email is already registered. Please login instead or use a different email."
        }
        "auth/weak-password" => {
            "Password is too weak. Please use at least 6 characters with a mix of letters and numbers."
        }
        "auth/invalid-email" => "Invalid email address format. Please enter a valid email.",
        "auth/operation-not-allowed" => {
            "Email/password registration is not enabled. Please contact support."
        }
        "auth/too-many-requests" => "Too many registration attempts. Please try again later.",
        "auth/network-request-failed" => NETWORK_MESSAGE,
        "auth/invalid-password" => "Invalid password. Password must be at least 6 characters long.",
        "auth/configuration-not-found" | "auth/internal-error" => {
            "Registration service error. Please try again later."
        }
        "auth/admin-restricted-operation" => {
            "Registration is currently restricted. Please contact support."
        }
        _ => {
            let stripped = strip_provider_prefix(&err.message);
            if stripped.is_empty() {
                "Registration failed. Please try again."
            } else {
                stripped
            }
        }
    };
    ApiError::auth(message, err.code.clone())
}

fn strip_provider_prefix(message: &str) -> &str {
    const PREFIX: &str = "firebase:";
    let trimmed = message.trim();
    match trimmed.get(..PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(PREFIX) => trimmed[PREFIX.len()..].trim_start(),
        _ => trimmed,
    }
}

/// Build the validated login output for a provider account.
pub fn login_response(user: &AuthUser, fallback_email: &str) -> Result<LoginResponse, ApiError> {
    let response = LoginResponse {
        success: true,
        user: user.to_user(fallback_email),
    };
    response
        .validate()
        .map_err(|diagnostic| ApiError::decode("Response failed schema validation", diagnostic))?;
    Ok(response)
}

/// Map an Identity Toolkit REST error code onto the `auth/...` namespace.
fn normalize_rest_code(raw: &str) -> String {
    let code = raw.split(" : ").next().unwrap_or(raw).trim();
    let mapped = match code {
        "EMAIL_NOT_FOUND" => "auth/user-not-found",
        "INVALID_PASSWORD" => "auth/wrong-password",
        "INVALID_LOGIN_CREDENTIALS" => "auth/invalid-credential",
        "USER_DISABLED" => "auth/user-disabled",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "auth/too-many-requests",
        "EMAIL_EXISTS" => "auth/email-already-in-use",
        "WEAK_PASSWORD" => "auth/weak-password",
        "INVALID_EMAIL" => "auth/invalid-email",
        "OPERATION_NOT_ALLOWED" => "auth/operation-not-allowed",
        "ADMIN_ONLY_OPERATION" => "auth/admin-restricted-operation",
        "CONFIGURATION_NOT_FOUND" => "auth/configuration-not-found",
        other => return format!("auth/{}", other.to_ascii_lowercase().replace('_', "-")),
    };
    mapped.to_string()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    id_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateResponse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Deserialize)]
struct RestErrorBody {
    error: RestError,
}

#[derive(Deserialize)]
struct RestError {
    message: String,
}

/// Email/password accounts over the Identity Toolkit REST API.
///
/// The ID token published on the session channel is the one returned at sign-in. It is not
/// refreshed, so it expires an hour later.
pub struct IdentityToolkit {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    session: watch::Sender<Option<AuthUser>>,
}

impl IdentityToolkit {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let (session, _) = watch::channel(None);
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            session,
        }
    }

    pub fn from_config(config: &Config, http: reqwest::Client) -> Self {
        Self::new(http, &config.identity_toolkit_url, &config.firebase_api_key)
    }

    fn request(&self, method: &str, body: &serde_json::Value) -> reqwest::RequestBuilder {
        let url = format!("{}/accounts:{method}", self.base_url);
        debug!(%url, "identity request");
        self.http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, ProviderError> {
        let response = self
            .request(method, &body)
            .send()
            .await
            .map_err(|e| ProviderError::new("auth/network-request-failed", e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::new("auth/network-request-failed", e.to_string()))?;

        if !status.is_success() {
            return Err(match serde_json::from_slice::<RestErrorBody>(&bytes) {
                Ok(body) => ProviderError::new(
                    normalize_rest_code(&body.error.message),
                    body.error.message,
                ),
                Err(_) => ProviderError::new(
                    "auth/internal-error",
                    String::from_utf8_lossy(&bytes).into_owned(),
                ),
            });
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| ProviderError::new("auth/internal-error", e.to_string()))
    }
}

#[async_trait]
impl AuthProvider for IdentityToolkit {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, ProviderError> {
        let account: AccountResponse = self
            .call(
                "signInWithPassword",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        let user = AuthUser {
            uid: account.local_id,
            email: account.email,
            display_name: account.display_name,
            id_token: account.id_token,
        };
        info!(uid = %user.uid, "signed in");
        self.session.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, ProviderError> {
        let account: AccountResponse = self
            .call(
                "signUp",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        let mut user = AuthUser {
            uid: account.local_id,
            email: account.email,
            display_name: account.display_name,
            id_token: account.id_token,
        };

        match self
            .call::<UpdateResponse>(
                "update",
                json!({ "idToken": user.id_token, "displayName": name, "returnSecureToken": true }),
            )
            .await
        {
            Ok(update) => {
                user.display_name = update.display_name.or_else(|| Some(name.to_string()));
                if let Some(token) = update.id_token {
                    user.id_token = token;
                }
            }
            Err(err) => warn!(uid = %user.uid, error = %err, "display name update failed"),
        }

        info!(uid = %user.uid, "account created");
        self.session.send_replace(Some(user.clone()));
        Ok(user)
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.session.borrow().clone()
    }

    fn on_auth_state_changed(&self) -> watch::Receiver<Option<AuthUser>> {
        self.session.subscribe()
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.session.send_replace(None);
        Ok(())
    }
}

struct Account {
    uid: String,
    password: String,
    display_name: String,
}

/// In-process provider with the same failure codes as the hosted one.
pub struct MemoryAuthProvider {
    accounts: RwLock<HashMap<String, Account>>,
    session: watch::Sender<Option<AuthUser>>,
}

impl Default for MemoryAuthProvider {
    fn default() -> Self {
        let (session, _) = watch::channel(None);
        Self {
            accounts: RwLock::new(HashMap::new()),
            session,
        }
    }
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn session_for(email: &str, account: &Account) -> AuthUser {
        AuthUser {
            uid: account.uid.clone(),
            email: Some(email.to_string()),
            display_name: Some(account.display_name.clone()),
            id_token: format!("token-{}", account.uid),
        }
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, ProviderError> {
        let accounts = self.accounts.read().await;
        let account = accounts.get(email).ok_or_else(|| {
            ProviderError::new("auth/user-not-found", "Firebase: Error (auth/user-not-found).")
        })?;
        if account.password != password {
            return Err(ProviderError::new(
                "auth/wrong-password",
                "Firebase: Error (auth/wrong-password).",
            ));
        }
        let user = Self::session_for(email, account);
        self.session.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, ProviderError> {
        if !crate::validate::is_email(email) {
            return Err(ProviderError::new(
                "auth/invalid-email",
                "Firebase: Error (auth/invalid-email).",
            ));
        }
        if password.chars().count() < 6 {
            return Err(ProviderError::new(
                "auth/weak-password",
                "Firebase: Password should be at least 6 characters (auth/weak-password).",
            ));
        }

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(email) {
            return Err(ProviderError::new(
                "auth/email-already-in-use",
                "Firebase: Error (auth/email-already-in-use).",
            ));
        }
        let account = Account {
            uid: format!("uid-{}", accounts.len() + 1),
            password: password.to_string(),
            display_name: name.to_string(),
        };
        let user = Self::session_for(email, &account);
        accounts.insert(email.to_string(), account);
        self.session.send_replace(Some(user.clone()));
        Ok(user)
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.session.borrow().clone()
    }

    fn on_auth_state_changed(&self) -> watch::Receiver<Option<AuthUser>> {
        self.session.subscribe()
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.session.send_replace(None);
        Ok(())
    }
}
