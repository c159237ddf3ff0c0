//! Leasehold server: connects to SurrealDB, brings the schema up to date
//! and holds the property-scoped services until shutdown.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use leasehold_auth::token::{issue_access_token, validate_access_token};
use leasehold_auth::{AuthConfig, ContextConfig};
use leasehold_core::models::principal::Principal;
use leasehold_db::{DbConfig, DbManager};
use leasehold_occupancy::{ChannelEventSink, LeaseEvent};
use leasehold_server::AppState;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "leasehold")]
#[command(about = "Multi-tenant property management core", long_about = None)]
struct Args {
    /// SurrealDB WebSocket address.
    #[arg(long, env = "LEASEHOLD_DB_URL", default_value = "127.0.0.1:8000")]
    db_url: String,

    #[arg(long, env = "LEASEHOLD_DB_NAMESPACE", default_value = "leasehold")]
    db_namespace: String,

    #[arg(long, env = "LEASEHOLD_DB_DATABASE", default_value = "main")]
    db_database: String,

    #[arg(long, env = "LEASEHOLD_DB_USER", default_value = "root")]
    db_user: String,

    #[arg(long, env = "LEASEHOLD_DB_PASSWORD", default_value = "root", hide_env_values = true)]
    db_password: String,

    /// Base domain whose direct sub-domains are property portals.
    #[arg(long, env = "LEASEHOLD_PORTAL_DOMAIN", default_value = "localhost")]
    portal_domain: String,

    /// Header carrying an explicit property id.
    #[arg(long, env = "LEASEHOLD_PROPERTY_HEADER", default_value = "X-Property-ID")]
    property_header: String,

    /// PEM file with the Ed25519 session signing key.
    #[arg(long, env = "LEASEHOLD_JWT_PRIVATE_KEY")]
    jwt_private_key: Option<PathBuf>,

    /// PEM file with the Ed25519 session verification key.
    #[arg(long, env = "LEASEHOLD_JWT_PUBLIC_KEY")]
    jwt_public_key: Option<PathBuf>,

    /// Session token lifetime in seconds.
    #[arg(long, env = "LEASEHOLD_TOKEN_TTL", default_value_t = 900)]
    token_ttl_secs: u64,

    /// Capacity of the lease event queue.
    #[arg(long, env = "LEASEHOLD_EVENT_QUEUE", default_value_t = 1024)]
    event_queue: usize,
}

impl Args {
    fn db_config(&self) -> DbConfig {
        DbConfig {
            url: self.db_url.clone(),
            namespace: self.db_namespace.clone(),
            database: self.db_database.clone(),
            username: self.db_user.clone(),
            password: self.db_password.clone(),
        }
    }

    fn context_config(&self) -> ContextConfig {
        ContextConfig {
            header_name: self.property_header.clone(),
            portal_base_domain: self.portal_domain.clone(),
            ..ContextConfig::default()
        }
    }

    async fn auth_config(&self) -> Result<Option<AuthConfig>> {
        let (Some(private), Some(public)) = (&self.jwt_private_key, &self.jwt_public_key) else {
            return Ok(None);
        };
        let jwt_private_key_pem = tokio::fs::read_to_string(private)
            .await
            .with_context(|| format!("reading {}", private.display()))?;
        let jwt_public_key_pem = tokio::fs::read_to_string(public)
            .await
            .with_context(|| format!("reading {}", public.display()))?;
        Ok(Some(AuthConfig {
            jwt_private_key_pem,
            jwt_public_key_pem,
            access_token_lifetime_secs: self.token_ttl_secs,
            ..AuthConfig::default()
        }))
    }
}

/// Sign and verify a throwaway token so a mismatched key pair fails at
/// startup instead of on the first request.
fn verify_signing_keys(config: &AuthConfig) -> Result<()> {
    let token = issue_access_token(Principal::Manager(Uuid::nil()), None, config)
        .context("signing with the configured private key")?;
    validate_access_token(&token, config).context("verifying with the configured public key")?;
    Ok(())
}

/// Drain lease events into the log until every sender is gone.
async fn dispatch_events(mut events: mpsc::Receiver<LeaseEvent>) {
    while let Some(event) = events.recv().await {
        info!(
            kind = event.kind(),
            lease_id = %event.lease_id(),
            event = ?event,
            "Dispatching lease event"
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("leasehold=info"));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    let args = Args::parse();
    info!("Starting Leasehold server...");

    let auth = args.auth_config().await?;
    match &auth {
        Some(auth) => {
            verify_signing_keys(auth)?;
            info!(issuer = %auth.jwt_issuer, "Session signing keys verified");
        }
        None => warn!("No signing keys configured; every scoped operation will be refused"),
    }

    let db = DbManager::connect(&args.db_config())
        .await
        .context("connecting to SurrealDB")?;

    let (sink, events) = ChannelEventSink::channel(args.event_queue);
    let dispatcher = tokio::spawn(dispatch_events(events));
    let app = AppState::new(db.client(), args.context_config(), auth, sink);

    info!(
        portal_domain = %app.context_config().portal_base_domain,
        property_header = %app.context_config().header_name,
        "Leasehold services ready"
    );

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("Shutdown requested");

    // Dropping the state closes the event channel and ends the dispatcher.
    drop(app);
    if let Err(e) = dispatcher.await {
        warn!(error = %e, "Event dispatcher ended abnormally");
    }

    info!("Leasehold server stopped.");
    Ok(())
}
