//! Application state shared across handlers.

use std::sync::Arc;

use cookie::Key;
use secrecy::ExposeSecret;

use crate::config::StoreConfig;
use crate::store::{FileSnapshotStore, PersistenceError};
use crate::supabase::{AuthClient, DataClient};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the provider clients and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StoreConfig,
    auth: AuthClient,
    data: DataClient,
    snapshots: Arc<FileSnapshotStore>,
    cookie_key: Key,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot directory cannot be created.
    pub fn new(config: StoreConfig) -> Result<Self, PersistenceError> {
        let auth = AuthClient::new(&config.supabase);
        let data = DataClient::new(&config.supabase);
        let snapshots = Arc::new(FileSnapshotStore::new(config.snapshot_dir.clone())?);
        let cookie_key = Key::derive_from(config.cookie_secret.expose_secret().as_bytes());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                auth,
                data,
                snapshots,
                cookie_key,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Get a reference to the auth (GoTrue) client.
    #[must_use]
    pub fn auth(&self) -> &AuthClient {
        &self.inner.auth
    }

    /// Get a reference to the catalog (PostgREST) client.
    #[must_use]
    pub fn data(&self) -> &DataClient {
        &self.inner.data
    }

    /// Get the shared snapshot store backing carts and wishlists.
    #[must_use]
    pub fn snapshots(&self) -> Arc<FileSnapshotStore> {
        Arc::clone(&self.inner.snapshots)
    }

    /// Get the key used to sign and verify cookies.
    #[must_use]
    pub fn cookie_key(&self) -> &Key {
        &self.inner.cookie_key
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    use secrecy::SecretString;

    use crate::config::{StoreConfig, SupabaseConfig};

    /// Config pointing at nothing in particular, for handler unit tests.
    pub fn test_config(snapshot_dir: PathBuf) -> StoreConfig {
        StoreConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            base_url: "http://localhost:3000".to_string(),
            cookie_secret: SecretString::from("k".repeat(64)),
            snapshot_dir,
            verifier_ttl_secs: 600,
            supabase: SupabaseConfig {
                url: "http://127.0.0.1:9".to_string(),
                anon_key: "anon".to_string(),
                service_role_key: SecretString::from("service"),
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }
}
