// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Server runtime orchestration.
//!
//! - Configuration loading and validation
//! - Revocation store selection (memory or redis)
//! - API server startup
//! - Graceful shutdown coordination

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use tripmate_api::{
    ApiConfig, ApiServer, MemoryRevocationStore, RedisRevocationStore, RevocationStore,
};
use tripmate_config::{ConfigLoader, RevocationBackend, TripmateConfig};

use crate::error::{BinError, BinResult};
use crate::shutdown::ShutdownCoordinator;

/// How often the in-memory store drops expired entries.
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

// =============================================================================
// ServerRuntime
// =============================================================================

/// Owns the configuration and runs the API server until shutdown.
pub struct ServerRuntime {
    config: Arc<TripmateConfig>,
    shutdown: ShutdownCoordinator,
}

impl ServerRuntime {
    /// Creates a new server runtime.
    pub fn new(config: TripmateConfig) -> Self {
        Self {
            config: Arc::new(config),
            shutdown: ShutdownCoordinator::new(),
        }
    }

    /// Returns the shutdown coordinator.
    pub fn shutdown(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Runs the server until a shutdown signal is received.
    pub async fn run(self) -> BinResult<()> {
        info!("Starting tripmate v{}", tripmate_core::VERSION);

        let store = self.create_revocation_store().await?;
        let api_config = ApiConfig::from_config(&self.config)?;

        let server = ApiServer::builder()
            .config(api_config)
            .revocation_store(store)
            .build()?;

        let signals = self.shutdown.clone();
        tokio::spawn(async move { signals.wait_for_os_signal().await });

        server
            .run_with_shutdown(self.shutdown.shutdown_signal())
            .await?;

        info!("tripmate shutdown complete");
        Ok(())
    }

    /// Connects the configured revocation store.
    ///
    /// A redis backend that cannot be reached at startup is fatal. Running
    /// without the shared store would let logged-out tokens through.
    async fn create_revocation_store(&self) -> BinResult<Arc<dyn RevocationStore>> {
        let revocation = &self.config.revocation;

        match revocation.backend {
            RevocationBackend::Memory => {
                let store = Arc::new(MemoryRevocationStore::new());
                self.spawn_purge_task(store.clone());
                info!("Using in-memory revocation store (single instance only)");
                Ok(store)
            }
            RevocationBackend::Redis => {
                let url = revocation
                    .url
                    .as_deref()
                    .ok_or_else(|| BinError::config("revocation.url is required for redis"))?;

                let store = RedisRevocationStore::connect(url, revocation.key_prefix.clone())
                    .await
                    .map_err(|e| {
                        BinError::init(e.to_string()).with_context("revocation store")
                    })?;

                info!(key_prefix = %revocation.key_prefix, "Connected to redis revocation store");
                Ok(Arc::new(store))
            }
        }
    }

    /// Periodically drops expired in-memory entries until shutdown.
    fn spawn_purge_task(&self, store: Arc<MemoryRevocationStore>) {
        let mut shutdown = self.shutdown.subscribe();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(PURGE_INTERVAL);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let purged = store.purge_expired();
                        if purged > 0 {
                            debug!(purged, remaining = store.len(), "Purged expired revocation entries");
                        }
                    }
                    _ = shutdown.recv() => break,
                }
            }
        });
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for constructing the server runtime.
#[derive(Default)]
pub struct RuntimeBuilder {
    config_path: Option<PathBuf>,
    config: Option<TripmateConfig>,
    host: Option<IpAddr>,
    port: Option<u16>,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration file path.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets an already loaded configuration.
    pub fn config(mut self, config: TripmateConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides the bind address.
    pub fn host(mut self, host: Option<IpAddr>) -> Self {
        self.host = host;
        self
    }

    /// Overrides the listen port.
    pub fn port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// Loads the configuration and builds the runtime.
    ///
    /// A missing config file falls back to defaults plus `TRIPMATE_*`
    /// environment overrides.
    pub fn build(self) -> BinResult<ServerRuntime> {
        let mut config = match (self.config, self.config_path) {
            (Some(config), _) => config,
            (None, Some(path)) if path.exists() => ConfigLoader::new().load(&path)?,
            (None, Some(path)) => {
                warn!(
                    path = %path.display(),
                    "Configuration file not found, using defaults and environment"
                );
                ConfigLoader::new().load_from_env()?
            }
            (None, None) => ConfigLoader::new().load_from_env()?,
        };

        if let Some(host) = self.host {
            config.server.bind_address = host;
        }
        if let Some(port) = self.port {
            if port == 0 {
                return Err(BinError::config("port must be non-zero"));
            }
            config.server.port = port;
        }

        Ok(ServerRuntime::new(config))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tripmate_config::SecretValue;

    use super::*;

    fn valid_config() -> TripmateConfig {
        let mut config = TripmateConfig::default();
        config.security.jwt.secret = SecretValue::new("a-signing-secret-that-is-long-enough!!");
        config
    }

    #[test]
    fn test_builder_applies_overrides() {
        let runtime = RuntimeBuilder::new()
            .config(valid_config())
            .host(Some("127.0.0.1".parse().unwrap()))
            .port(Some(9191))
            .build()
            .unwrap();

        assert_eq!(runtime.config.server.port, 9191);
        assert_eq!(runtime.config.server.bind_address.to_string(), "127.0.0.1");
    }

    #[test]
    fn test_builder_rejects_zero_port() {
        let result = RuntimeBuilder::new()
            .config(valid_config())
            .port(Some(0))
            .build();
        assert!(matches!(result, Err(BinError::Configuration(_))));
    }

    #[test]
    fn test_builder_loads_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "security:\n  jwt:\n    secret: \"a-signing-secret-that-is-long-enough!!\"\nserver:\n  port: 7070"
        )
        .unwrap();

        let runtime = RuntimeBuilder::new().config_path(file.path()).build().unwrap();
        assert_eq!(runtime.config.server.port, 7070);
    }

    #[tokio::test]
    async fn test_memory_store_selected_by_default() {
        let runtime = ServerRuntime::new(valid_config());
        let store = runtime.create_revocation_store().await.unwrap();
        assert_eq!(store.backend(), "memory");
        runtime.shutdown().initiate_shutdown();
    }
}
