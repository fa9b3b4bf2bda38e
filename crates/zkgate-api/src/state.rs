//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! AppState holds the three domain services (pipeline orchestrator, proof
//! archive, verification service) behind `Arc`, plus the in-memory user
//! directory. Durable persistence is an external collaborator; the
//! in-memory stores are the seam where a document store would plug in.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use zkgate_archive::ProofArchive;
use zkgate_core::{Role, UserId};
use zkgate_pipeline::PipelineOrchestrator;
use zkgate_verify::ProofVerifier;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not
/// `tokio::sync`) because the lock is never held across `.await` points.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Retrieve a record by ID.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Update a record in place. Returns the updated record, or `None` if
    /// not found.
    pub fn update(&self, id: &Uuid, f: impl FnOnce(&mut T)) -> Option<T> {
        let mut guard = self.data.write();
        if let Some(entry) = guard.get_mut(id) {
            f(entry);
            Some(entry.clone())
        } else {
            None
        }
    }

    /// Remove a record by ID.
    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.data.write().remove(id)
    }

    /// Check if a record exists.
    #[allow(dead_code)]
    pub fn contains(&self, id: &Uuid) -> bool {
        self.data.read().contains_key(id)
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- User Directory -----------------------------------------------------------

/// One identity in the user directory.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserRecord {
    /// Directory identifier; also the identity bound into tokens.
    pub id: UserId,
    /// Display name shown on archived submissions.
    pub name: String,
    /// The identity's role.
    pub role: Role,
    /// When the identity was created.
    pub created_at: DateTime<Utc>,
}

// -- Configuration ------------------------------------------------------------

/// Top-level API configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Static bearer secret. If `None`, authentication is disabled.
    pub auth_token: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
        }
    }
}

// -- AppState -----------------------------------------------------------------

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The staged pipeline.
    pub orchestrator: Arc<PipelineOrchestrator>,
    /// The proof archive and review workflow.
    pub archive: Arc<ProofArchive>,
    /// The stand-alone verification service.
    pub verifier: Arc<ProofVerifier>,
    /// The user directory.
    pub users: Store<UserRecord>,
    /// API configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Resolve a caller's display name from the directory, falling back to
    /// the raw id for identities created outside it.
    pub fn display_name(&self, user_id: UserId) -> String {
        self.users
            .get(user_id.as_uuid())
            .map(|u| u.name)
            .unwrap_or_else(|| user_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_insert_get_update_remove() {
        let store: Store<UserRecord> = Store::new();
        let id = Uuid::new_v4();
        let record = UserRecord {
            id: UserId::from_uuid(id),
            name: "alice".into(),
            role: Role::Subject,
            created_at: Utc::now(),
        };
        assert!(store.insert(id, record.clone()).is_none());
        assert_eq!(store.get(&id).unwrap().name, "alice");

        store.update(&id, |u| u.name = "alice b".into());
        assert_eq!(store.get(&id).unwrap().name, "alice b");

        assert!(store.remove(&id).is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn config_debug_redacts_token() {
        let config = AppConfig {
            port: 9000,
            auth_token: Some("super-secret".into()),
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("REDACTED"));
    }
}
