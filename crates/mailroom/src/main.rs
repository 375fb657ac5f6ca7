//! `mailroom` - personal mailbox server
//!
//! Serves IMAP on 143 (993 with a certificate) and SMTP on 25 (465 and 587
//! with a certificate), all backed by one in-memory store.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use mailroom_core::account::parse_seed;
use mailroom_core::{Config, HttpRelay, Mailroom, MemoryStore, NewUser, NullRelay, Ports, Relay};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Local mail domain
    #[clap(long, env = "MAIL_DOMAIN", default_value = mailroom_core::config::DEFAULT_DOMAIN)]
    domain: String,

    /// Name announced in greetings, defaults to the domain
    #[clap(long, env = "MAIL_HOSTNAME")]
    hostname: Option<String>,

    /// PEM certificate chain for the TLS listeners
    #[clap(long, env = "TLS_CERT")]
    tls_cert: Option<PathBuf>,

    /// PEM private key for the TLS listeners
    #[clap(long, env = "TLS_KEY")]
    tls_key: Option<PathBuf>,

    /// Creates the `admin` user with this password
    #[clap(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,

    /// JSON array of users to create at startup
    #[clap(long, env = "MAIL_USERS_FILE")]
    users_file: Option<PathBuf>,

    /// Address the IMAP listeners bind to
    #[clap(long, env = "IMAP_BIND", default_value = "0.0.0.0")]
    imap_bind: IpAddr,

    /// Address the SMTP listeners bind to
    #[clap(long, env = "SMTP_HOST", default_value = "0.0.0.0")]
    smtp_host: IpAddr,

    /// Endpoint outgoing mail is posted to
    #[clap(long, env = "RELAY_URL")]
    relay_url: Option<String>,

    /// Bearer token for the relay endpoint
    #[clap(long, env = "RELAY_API_KEY", hide_env_values = true)]
    relay_api_key: Option<String>,

    /// Largest message accepted over SMTP, in bytes
    #[clap(long, env = "MAIL_MAX_MESSAGE_SIZE")]
    max_message_size: Option<usize>,

    #[clap(long)]
    imap_port: Option<u16>,

    #[clap(long)]
    imaps_port: Option<u16>,

    #[clap(long)]
    smtp_port: Option<u16>,

    #[clap(long)]
    smtps_port: Option<u16>,

    #[clap(long)]
    submission_port: Option<u16>,
}

impl Args {
    fn into_config(self) -> Config {
        let defaults = Config::default();
        Config {
            hostname: self.hostname.unwrap_or_else(|| self.domain.clone()),
            domain: self.domain,
            imap_bind: self.imap_bind,
            smtp_bind: self.smtp_host,
            ports: Ports {
                imap: self.imap_port,
                imaps: self.imaps_port,
                smtp: self.smtp_port,
                smtps: self.smtps_port,
                submission: self.submission_port,
            },
            tls_cert: self.tls_cert,
            tls_key: self.tls_key,
            admin_password: self.admin_password,
            users_file: self.users_file,
            relay_url: self.relay_url,
            relay_api_key: self.relay_api_key,
            max_message_size: self.max_message_size.unwrap_or(defaults.max_message_size),
        }
    }
}

/// Creates the admin and seed-file users.
async fn seed_users(store: &MemoryStore, config: &Config) -> anyhow::Result<()> {
    let mut users = Vec::new();
    if let Some(password) = &config.admin_password {
        users.push(NewUser::new(mailroom_core::FALLBACK_SENDER, password.clone()));
    }
    if let Some(path) = &config.users_file {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading users file {}", path.display()))?;
        users.extend(parse_seed(&json).with_context(|| format!("parsing {}", path.display()))?);
    }

    for new in &users {
        let user = store
            .add_user(new, &config.domain)
            .await
            .with_context(|| format!("creating user {}", new.username))?;
        info!(user = %user.id, email = %user.email, "user created");
    }
    if users.is_empty() {
        warn!("no users configured; nobody can log in");
    }
    Ok(())
}

fn relay(config: &Config) -> Arc<dyn Relay> {
    match &config.relay_url {
        Some(url) => {
            let mut relay = HttpRelay::new(url);
            if let Some(key) = &config.relay_api_key {
                relay = relay.with_api_key(key);
            }
            info!(url = %relay.url(), "relaying outgoing mail over HTTP");
            Arc::new(relay)
        }
        None => {
            warn!("RELAY_URL not set; outgoing mail is only stored");
            Arc::new(NullRelay)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Args::parse().into_config();
    info!(domain = %config.domain, hostname = %config.hostname, "Starting mailroom");

    let store = Arc::new(MemoryStore::new());
    seed_users(&store, &config).await?;
    let backend = Arc::new(Mailroom::with_memory_store(
        store,
        relay(&config),
        config.domain.clone(),
    ));

    let tls = mailroom_core::optional_acceptor(config.tls_cert.as_deref(), config.tls_key.as_deref())
        .context("loading TLS certificate")?;
    if tls.is_none() {
        warn!("no certificate pair; IMAPS, SMTPS and submission are disabled");
    }

    let (exit_tx, exit_rx) = watch::channel(false);
    let mut servers: JoinSet<anyhow::Result<()>> = JoinSet::new();
    for listener in config.imap_listeners(tls.is_some()) {
        let server = mailroom_imap::Server::new(listener, Arc::clone(&backend), tls.clone());
        let must_exit = exit_rx.clone();
        servers.spawn(async move { Ok(server.run(must_exit).await?) });
    }
    for listener in config.smtp_listeners(tls.is_some()) {
        let server = mailroom_smtp::Server::new(listener, Arc::clone(&backend), tls.clone());
        let must_exit = exit_rx.clone();
        servers.spawn(async move { Ok(server.run(must_exit).await?) });
    }

    let mut failure = None;
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("waiting for Ctrl-C")?;
            info!("shutting down");
        }
        Some(joined) = servers.join_next() => {
            failure = Some(joined);
        }
    }
    let _ = exit_tx.send(true);

    while let Some(joined) = servers.join_next().await {
        if let Err(err) = joined.context("listener task panicked")? {
            error!(error = %err, "listener stopped with an error");
        }
    }

    match failure {
        Some(Ok(Ok(()))) => bail!("a listener stopped unexpectedly"),
        Some(Ok(Err(err))) => Err(err.context("listener failed")),
        Some(Err(err)) => Err(anyhow::Error::new(err).context("listener task panicked")),
        None => Ok(()),
    }
}
