//! User directory capability: trait, HTTP client, in-memory stub, guard.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::UserId;
use reqwest::StatusCode;

use crate::error::RemoteError;
use crate::guard::Guard;

/// The user service as seen from the orchestrator.
///
/// The existence check gates order creation, so it is a strict-class
/// call: an unreachable directory must fail the order, never wave the
/// buyer through.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Confirms the buyer exists. `NotFound` if the directory answered
    /// and the user is unknown.
    async fn user_exists(&self, user_id: UserId) -> Result<(), RemoteError>;
}

#[async_trait]
impl<U: UserDirectory + ?Sized> UserDirectory for Arc<U> {
    async fn user_exists(&self, user_id: UserId) -> Result<(), RemoteError> {
        (**self).user_exists(user_id).await
    }
}

const USER_SERVICE: &str = "user-service";

/// HTTP client for a remote user directory.
#[derive(Debug, Clone)]
pub struct HttpUserDirectory {
    http: reqwest::Client,
    base_url: String,
}

impl HttpUserDirectory {
    /// Creates a client against `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn user_exists(&self, user_id: UserId) -> Result<(), RemoteError> {
        let url = format!("{}/users/{user_id}", self.base_url);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| RemoteError::Unavailable {
                service: USER_SERVICE,
                reason: err.to_string(),
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => Err(RemoteError::NotFound {
                resource: format!("user {user_id}"),
            }),
            status => Err(RemoteError::Unavailable {
                service: USER_SERVICE,
                reason: format!("unexpected status {status}"),
            }),
        }
    }
}

/// In-memory directory for standalone mode and tests.
///
/// Starts empty; `register` adds known users. `set_unavailable` makes
/// every call fail as a fault, for exercising the breaker path.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashSet<UserId>>>,
    permissive: Arc<RwLock<bool>>,
    unavailable: Arc<RwLock<bool>>,
}

impl InMemoryUserDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory that accepts every user id.
    pub fn permissive() -> Self {
        let directory = Self::default();
        *directory.permissive.write().unwrap() = true;
        directory
    }

    /// Registers a known user.
    pub fn register(&self, user_id: UserId) {
        self.users.write().unwrap().insert(user_id);
    }

    /// Makes subsequent calls fail as transport faults.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().unwrap() = unavailable;
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn user_exists(&self, user_id: UserId) -> Result<(), RemoteError> {
        if *self.unavailable.read().unwrap() {
            return Err(RemoteError::Unavailable {
                service: USER_SERVICE,
                reason: "simulated outage".to_string(),
            });
        }
        if *self.permissive.read().unwrap() || self.users.read().unwrap().contains(&user_id) {
            Ok(())
        } else {
            Err(RemoteError::NotFound {
                resource: format!("user {user_id}"),
            })
        }
    }
}

/// [`UserDirectory`] with the guard applied to every call.
#[derive(Debug, Clone)]
pub struct GuardedUserDirectory<U> {
    inner: Arc<U>,
    guard: Guard,
}

impl<U> GuardedUserDirectory<U> {
    /// Wraps an inner directory with a guard.
    pub fn new(inner: U, guard: Guard) -> Self {
        Self {
            inner: Arc::new(inner),
            guard,
        }
    }

    /// Returns the guard, for observability.
    pub fn guard(&self) -> &Guard {
        &self.guard
    }
}

#[async_trait]
impl<U: UserDirectory + 'static> UserDirectory for GuardedUserDirectory<U> {
    async fn user_exists(&self, user_id: UserId) -> Result<(), RemoteError> {
        let inner = self.inner.clone();
        self.guard
            .strict("users.user_exists", async move {
                inner.user_exists(user_id).await
            })
            .await
    }
}
