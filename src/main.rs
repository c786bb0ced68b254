//! Mythos Herald binary entrypoint: a console front-end over the bot core.
//!
//! The console surface exists so the core can be exercised without a chat
//! platform attached: prefixed lines dispatch as text commands, everything
//! else fans out to the message listeners, and outbound notifications land in
//! the log.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mythos_herald::commands::build_router;
use mythos_herald::config::AppConfig;
use mythos_herald::dao::json_store::JsonFileStore;
use mythos_herald::platform::{Caller, ChannelId, DeclaredRoles, LogSink, UnconfiguredCardLookup};
use mythos_herald::state::{AppState, ScopeId};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let store = Arc::new(JsonFileStore::new(config.data_path.clone()));
    let state = AppState::new(config, store, Arc::new(LogSink));

    let router = build_router(
        &state,
        Arc::new(UnconfiguredCardLookup),
        Arc::new(DeclaredRoles),
    )
    .context("registering commands")?;

    let prefix = state.config().command_prefix.clone();
    let scope = ScopeId::new("console");
    let channel = ChannelId::from("console");
    // The console operator holds the admin role when one is configured.
    let caller = Caller {
        id: "console".into(),
        name: "operator".into(),
        roles: state.config().admin_role.iter().cloned().collect(),
    };

    info!(%prefix, "console surface ready; type commands or Ctrl+C to exit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match line.strip_prefix(&prefix) {
                    Some(content) => {
                        match router
                            .dispatch_text(scope.clone(), channel.clone(), caller.clone(), content)
                            .await
                        {
                            Ok(outcome) => {
                                info!(command = %outcome.command, summary = %outcome.summary, "dispatched");
                                println!("{}", outcome.reply);
                            }
                            Err(err) => {
                                warn!(error = %err, "dispatch refused by configuration");
                                println!("Configuration error: {err}");
                            }
                        }
                    }
                    None => {
                        router.notify_message(&scope, &channel, &caller, line).await;
                    }
                }
            }
            () = shutdown_signal() => break,
        }
    }

    info!("shutting down");
    Ok(())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
