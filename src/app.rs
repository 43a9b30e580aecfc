/*
 * Responsibility
 * - Config読み込み → 依存生成 (cache, Keycloak, license registry, vault) → Router 組み立て
 * - Middleware の適用 (auth pipeline, http layers)
 * - axum::serve() で起動、シグナルで graceful shutdown
 */
use anyhow::Result;
use axum::Router;
use std::{panic, process, sync::Arc};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{CacheBackend, Config, ConfigError};
use crate::middleware::http::HttpLimits;
use crate::services::auth::{LicenceVerifier, PathPolicy, TokenVerifier};
use crate::services::cache::{CacheClient, MemoryCache, ValkeyClient};
use crate::services::credentials::CredentialCache;
use crate::services::identity::KeycloakIntrospector;
use crate::services::licenses::HttpLicenseRegistry;
use crate::services::vault::{SecretStore, VaultKvClient};
use crate::state::AppState;
use crate::{api, middleware};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,credential_gateway=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing (stderr can be hidden depending on how
        // the process is launched).
        tracing::error!(?info, "panic");

        // Development: crash the whole process. Production: default behavior,
        // the server keeps running.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting credential gateway in {:?} mode on {}",
        config.app_env,
        config.addr
    );
    tracing::debug!(?config, "loaded configuration");

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Build process-level services here and inject them into the shared application state.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let cache: Arc<dyn CacheClient> = match config.cache_backend {
        CacheBackend::Valkey => {
            let url = config
                .redis_url
                .as_deref()
                .ok_or(ConfigError::Missing("REDIS_HOST"))?;
            Arc::new(ValkeyClient::new(url, config.upstream_timeout).await?)
        }
        CacheBackend::Memory => {
            tracing::warn!("credential cache is in-process memory; entries are not shared");
            Arc::new(MemoryCache::new())
        }
    };
    let credentials = CredentialCache::new_with_prefix(cache, config.cache_key_prefix.clone());

    let introspector = KeycloakIntrospector::new(
        &config.keycloak.host,
        &config.keycloak.realm,
        config.keycloak.client_id.clone(),
        config.keycloak.client_secret.clone(),
        config.upstream_timeout,
    )?;
    let registry = HttpLicenseRegistry::new(&config.license_registry_url, config.upstream_timeout)?;
    let vault = VaultKvClient::new(
        config.vault.base_url.clone(),
        config.vault.token.clone(),
        config.vault.mount.clone(),
        config.upstream_timeout,
    )?;

    Ok(AppState::new(
        PathPolicy::new(
            config.unprotected_paths.iter().cloned(),
            config.unlicensed_paths.iter().cloned(),
        ),
        TokenVerifier::new(
            credentials.clone(),
            Arc::new(introspector),
            config.auth_audience.clone(),
        )
        .with_forced_refresh_interval(config.forced_refresh_interval.as_secs()),
        LicenceVerifier::new(credentials, Arc::new(registry)),
        SecretStore::new(Arc::new(vault)),
    ))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    compose(
        api::v1::routes(),
        state,
        HttpLimits {
            request_timeout: config.request_timeout,
            body_limit_bytes: config.request_body_limit_bytes,
        },
    )
}

/// Wrap `routes` with the auth pipeline and HTTP layers.
pub fn compose(routes: Router<AppState>, state: AppState, limits: HttpLimits) -> Router {
    let router = middleware::auth::apply(routes, state.clone()).with_state(state);
    middleware::http::apply(router, limits)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("received terminate signal, starting graceful shutdown");
        },
    }
}
