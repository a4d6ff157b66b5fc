use actions::{SearchActions, Submission};
use anyhow::{Context, bail};
use args::Command;
use clap::Parser;
use lookup::ShowLookup;
use medusa_api::{
    commands::EpisodeSearchCommand,
    models::{EpisodeKey, ShowScope},
};
use notifications::{LogSink, NotificationSink, run_notifications};
use pages::PageContext;
use poller::Poller;
use providers::medusa::Medusa;
use std::{sync::Arc, time::Duration};
use tokio::sync::{Mutex, watch};
use tokio::time::interval;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use view::{EpisodeBoard, SharedBoard};

pub mod actions;
pub mod args;
pub mod config;
pub mod lookup;
pub mod notifications;
pub mod pages;
pub mod poller;
pub mod providers;
pub mod view;

/// Sanitize error messages for toasts while keeping full details in logs
fn user_facing_error(err: &anyhow::Error) -> &'static str {
    let err_msg = format!("{err:#}").to_lowercase();

    // Provide specific guidance for known error types
    if err_msg.contains("timeout") || err_msg.contains("timed out") {
        "Request timed out. The Medusa server may be slow or unavailable."
    } else if err_msg.contains("connection") || err_msg.contains("connect") {
        "Could not connect to the Medusa server. Please try again later."
    } else if err_msg.contains("401")
        || err_msg.contains("403")
        || err_msg.contains("unauthorized")
        || err_msg.contains("forbidden")
    {
        "The Medusa server rejected the API key. Check your configuration."
    } else if err_msg.contains("500") || err_msg.contains("502") || err_msg.contains("503") {
        "The Medusa server encountered an error. Please try again later."
    } else {
        // Generic message that doesn't leak any internal details
        "An error occurred while processing your request. Please try again."
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line args to get path to config file
    let cli = args::Cli::parse();

    // Read the config file
    let config = config::Config::from_file(&cli.config)?;

    // Setup logging with configured level
    let log_level = config.log_level.as_deref().unwrap_or("info");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    // Build the HTTP request client; per-request timeouts are applied by the callers
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .build()?;

    // Without the server configuration nothing else can safely run
    let medusa = Arc::new(
        Medusa::connect(&config, http)
            .await
            .context("Failed to load the Medusa configuration")?,
    );
    info!(
        theme = medusa.main_config().theme_name.as_deref().unwrap_or("default"),
        "Connected to Medusa"
    );

    let board: SharedBoard = Arc::new(Mutex::new(EpisodeBoard::new(config.theme.clone())));
    let poller = Arc::new(Poller::new(
        medusa.clone(),
        Arc::clone(&board),
        config.poll.settings(),
    ));
    let sink: Arc<dyn NotificationSink> = Arc::new(LogSink::default());
    let (shutdown_tx, shutdown) = watch::channel(false);

    match cli.command.unwrap_or(Command::Watch {
        page: None,
        show: None,
    }) {
        Command::Watch { page, show } => {
            // The notification socket lives as long as the page
            let notifications = if config.notifications.enabled() {
                let url = medusa.socket_url()?;
                Some(tokio::spawn(run_notifications(
                    url,
                    medusa.auth_headers(),
                    Arc::clone(&sink),
                    config.notifications.reconnect_policy(),
                    shutdown.clone(),
                )))
            } else {
                None
            };

            let ctx = PageContext {
                poller: Arc::clone(&poller),
                board: Arc::clone(&board),
                row_removal_delay: config.poll.row_removal_delay(),
                row_retention: config.poll.row_retention(),
                shutdown: shutdown.clone(),
            };
            let route = page.unwrap_or_else(|| config.page().to_string());
            pages::bootstrap(&ctx, &route, show).await?;

            tokio::signal::ctrl_c().await?;
            info!("Shutting down");
            let _ = shutdown_tx.send(true);
            poller.stop_all().await;
            if let Some(handle) = notifications
                && let Err(e) = handle.await
            {
                warn!(error = %e, "Notification task ended abnormally");
            }
        }
        Command::Search {
            indexer,
            series_id,
            season,
            episode,
            retry,
            down_cur_quality,
        } => {
            let key = EpisodeKey {
                indexer_name: indexer.clone(),
                series_id,
                season,
                episode,
            };
            let command = if retry {
                EpisodeSearchCommand::retry(&key, down_cur_quality)
            } else {
                EpisodeSearchCommand::search(&key)
            };

            let actions = SearchActions::new(medusa.clone(), Arc::clone(&board), Arc::clone(&sink));
            match actions.submit(&command).await? {
                Submission::Accepted => {}
                Submission::Refused => bail!("Medusa refused the search for {key}"),
                Submission::Ignored => bail!("A search for {key} is already running"),
            }

            // Follow just this show until the episode settles
            let scope = ShowScope::new(indexer, series_id);
            poller.start(Some(scope)).await;

            let mut ticker = interval(Duration::from_secs(1));
            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);
            let settled = loop {
                tokio::select! {
                    _ = &mut ctrl_c => break None,
                    _ = ticker.tick() => {
                        let board = board.lock().await;
                        if let Some(row) = board.row(&key).filter(|row| row.is_settled()) {
                            break Some((row.clone(), board.theme().asset(row.indicator).to_string()));
                        }
                    }
                }
            };
            poller.stop_all().await;
            let _ = shutdown_tx.send(true);

            match settled {
                Some((row, asset)) => println!(
                    "{key}: {} [{}] status={} quality={}",
                    row.title,
                    asset,
                    row.status.as_deref().unwrap_or("-"),
                    row.quality.as_deref().unwrap_or("-"),
                ),
                None => debug!("Interrupted before the search finished"),
            }
        }
        Command::Lookup { term, indexer } => {
            let lookup = ShowLookup::new(medusa.clone());
            let results = lookup.search(&term, indexer).await?.unwrap_or_default();
            if results.is_empty() {
                println!("No results");
            }
            for show in results {
                println!(
                    "{}:{}\t{}\t{}\t{}",
                    show.indexer_name,
                    show.series_id,
                    show.title,
                    show.premiered.as_deref().unwrap_or("-"),
                    show.network.as_deref().unwrap_or("-"),
                );
            }
        }
    }
    Ok(())
}
