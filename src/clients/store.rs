// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! Path-addressed JSON document store.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tracing::debug;

use crate::clients::identity::AuthUser;
use crate::config::Config;

pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct StoreError {
    pub code: Option<String>,
    pub message: String,
}

impl StoreError {
    pub fn new(code: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            code: code.map(str::to_string),
            message: message.into(),
        }
    }
}

/// Slash-separated paths, e.g. `users/u1/favorites/42`.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// The value at `path`, or `None` when nothing is stored there.
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Removing an absent path succeeds.
    async fn remove(&self, path: &str) -> Result<(), StoreError>;
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Realtime Database REST API, authorised with the current session's ID token.
///
/// The token is read from the session channel on every request, so a provider that publishes
/// a refreshed token is picked up immediately. [`IdentityToolkit`](crate::clients::IdentityToolkit)
/// does not refresh: its tokens expire an hour after sign-in, after which requests fail with
/// `PERMISSION_DENIED` until the user signs in again.
pub struct RealtimeDatabase {
    http: reqwest::Client,
    base_url: String,
    session: watch::Receiver<Option<AuthUser>>,
}

impl RealtimeDatabase {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        session: watch::Receiver<Option<AuthUser>>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            session,
        }
    }

    pub fn from_config(
        config: &Config,
        http: reqwest::Client,
        session: watch::Receiver<Option<AuthUser>>,
    ) -> Self {
        Self::new(http, &config.firebase_database_url, session)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let path = segments(path).collect::<Vec<_>>().join("/");
        let url = format!("{}/{path}.json", self.base_url);
        debug!(%method, %url, "store request");
        let builder = self.http.request(method, url);
        match self.session.borrow().as_ref() {
            Some(user) => builder.query(&[("auth", user.id_token.as_str())]),
            None => builder,
        }
    }

    async fn execute(&self, builder: reqwest::RequestBuilder) -> Result<Value, StoreError> {
        let response = builder
            .send()
            .await
            .map_err(|e| StoreError::new(Some("NETWORK_ERROR"), e.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StoreError::new(Some("NETWORK_ERROR"), e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<Value>(&bytes)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned());
            let code = match status.as_u16() {
                401 | 403 => Some(PERMISSION_DENIED),
                _ => None,
            };
            return Err(StoreError::new(code, message));
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| StoreError::new(None, e.to_string()))
    }
}

#[async_trait]
impl RemoteStore for RealtimeDatabase {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let value = self
            .execute(self.request(reqwest::Method::GET, path))
            .await?;
        Ok(match value {
            Value::Null => None,
            other => Some(other),
        })
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.execute(self.request(reqwest::Method::PUT, path).json(&value))
            .await
            .map(|_| ())
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.execute(self.request(reqwest::Method::DELETE, path))
            .await
            .map(|_| ())
    }
}

/// In-process JSON tree.
#[derive(Default)]
pub struct MemoryStore {
    root: RwLock<Map<String, Value>>,
    failure: RwLock<Option<StoreError>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `error` until cleared with `None`.
    pub async fn fail_with(&self, error: Option<StoreError>) {
        *self.failure.write().await = error;
    }

    async fn check(&self) -> Result<(), StoreError> {
        match self.failure.read().await.as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        self.check().await?;
        let root = self.root.read().await;
        let mut parts = segments(path);
        let Some(first) = parts.next() else {
            return Ok(Some(Value::Object(root.clone())));
        };
        let mut node = root.get(first);
        for part in parts {
            node = node.and_then(|n| n.get(part));
        }
        Ok(node.cloned())
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.check().await?;
        let parts: Vec<&str> = segments(path).collect();
        let Some((last, parents)) = parts.split_last() else {
            return Err(StoreError::new(None, "cannot overwrite the root"));
        };

        let mut root = self.root.write().await;
        let mut node = &mut *root;
        for part in parents {
            let child = node
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            node = match child {
                Value::Object(map) => map,
                _ => return Err(StoreError::new(None, format!("`{part}` is not an object"))),
            };
        }
        node.insert(last.to_string(), value);
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.check().await?;
        let parts: Vec<&str> = segments(path).collect();
        let Some((last, parents)) = parts.split_last() else {
            self.root.write().await.clear();
            return Ok(());
        };

        let mut root = self.root.write().await;
        let mut node = &mut *root;
        for part in parents {
            match node.get_mut(*part) {
                Some(Value::Object(map)) => node = map,
                _ => return Ok(()),
            }
        }
        node.remove(*last);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_get_remove() {
        let store = MemoryStore::new();
        store.set("users/u1/favorites/42", json!({"id": 42})).await.unwrap();
        store.set("users/u1/favorites/7", json!({"id": 7})).await.unwrap();

        let all = store.get("users/u1/favorites").await.unwrap().unwrap();
        assert_eq!(all.as_object().unwrap().len(), 2);
        assert_eq!(
            store.get("/users/u1/favorites/42/").await.unwrap(),
            Some(json!({"id": 42}))
        );

        store.remove("users/u1/favorites/42").await.unwrap();
        store.remove("users/u1/favorites/42").await.unwrap();
        store.remove("users/u9/favorites/1").await.unwrap();
        assert_eq!(store.get("users/u1/favorites/42").await.unwrap(), None);
        assert_eq!(store.get("users/u2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn injected_failure_applies_to_every_call() {
        let store = MemoryStore::new();
        store
            .fail_with(Some(StoreError::new(Some(PERMISSION_DENIED), "denied")))
            .await;
        let err = store.get("users/u1").await.unwrap_err();
        assert_eq!(err.code.as_deref(), Some(PERMISSION_DENIED));

        store.fail_with(None).await;
        assert!(store.set("users/u1/x", json!(1)).await.is_ok());
    }

    fn signed_in(token: &str) -> Option<AuthUser> {
        Some(AuthUser {
            uid: "u1".to_string(),
            email: Some("ada@example.com".to_string()),
            display_name: None,
            id_token: token.to_string(),
        })
    }

    #[test]
    fn requests_address_the_json_path_with_the_session_token() {
        let (session, receiver) = watch::channel(signed_in("tok-1"));
        let db = RealtimeDatabase::new(reqwest::Client::new(), "https://db.example.com", receiver);

        let request = db
            .request(reqwest::Method::GET, "/users/u1/favorites/")
            .build()
            .unwrap();
        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(
            request.url().as_str(),
            "https://db.example.com/users/u1/favorites.json?auth=tok-1"
        );

        // A newly published token applies to the next request.
        session.send_replace(signed_in("tok-2"));
        let request = db
            .request(reqwest::Method::DELETE, "users/u1/favorites/42")
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://db.example.com/users/u1/favorites/42.json?auth=tok-2"
        );

        session.send_replace(None);
        let request = db
            .request(reqwest::Method::PUT, "users/u1/favorites/42")
            .build()
            .unwrap();
        assert_eq!(request.url().query(), None);
    }
}
