// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pitwall archive service (`archive`)
//!
//! Daily archival of completed events plus purge of aged simulated
//! events. `--run-archive` and `--run-simulated-event-purge` run one shot
//! and exit (0 on success, 1 on any failure), bypassing the schedule.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use clap::Parser;
use pw_archive::archiver::RunOutcome;
use pw_archive::{
    next_midnight, ArchiveError, Archiver, FailureMailer, FsObjectStore, LogMailer, WebhookMailer,
};
use pw_archive::scheduler::{DAILY_ATTEMPTS, FAILURE_HOLDOFF, RETRY_SPACING};
use pw_storage::Db;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "archive", about = "Pitwall event archival service")]
struct Args {
    /// Archive eligible events once and exit.
    #[arg(long)]
    run_archive: bool,

    /// Purge aged simulated events once and exit.
    #[arg(long)]
    run_simulated_event_purge: bool,
}

struct Config {
    database_url: String,
    archive_root: String,
    mail_webhook_url: Option<String>,
    timezone: chrono_tz::Tz,
}

impl Config {
    fn from_env() -> Result<Self, ArchiveError> {
        let tz_name =
            std::env::var("ARCHIVE_TZ").unwrap_or_else(|_| "America/New_York".to_string());
        let timezone = tz_name
            .parse()
            .map_err(|_| ArchiveError::UnknownTimeZone(tz_name))?;
        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| ArchiveError::MissingEnv("DATABASE_URL"))?,
            archive_root: std::env::var("ARCHIVE_ROOT")
                .map_err(|_| ArchiveError::MissingEnv("ARCHIVE_ROOT"))?,
            mail_webhook_url: std::env::var("MAIL_WEBHOOK_URL").ok(),
            timezone,
        })
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid archive configuration");
            return std::process::ExitCode::FAILURE;
        }
    };

    let db = match Db::connect(&config.database_url).await {
        Ok(db) => db,
        Err(err) => {
            error!(%err, "database connection failed");
            return std::process::ExitCode::FAILURE;
        }
    };

    let mailer: Arc<dyn FailureMailer> = match &config.mail_webhook_url {
        Some(url) => Arc::new(WebhookMailer::new(reqwest::Client::new(), url)),
        None => Arc::new(LogMailer),
    };
    let archiver = Archiver::new(db, FsObjectStore::new(&config.archive_root), mailer);

    if args.run_archive || args.run_simulated_event_purge {
        return one_shot(&archiver, &args).await;
    }

    schedule(&archiver, config.timezone).await
}

async fn one_shot(
    archiver: &Archiver<Db, FsObjectStore, Arc<dyn FailureMailer>>,
    args: &Args,
) -> std::process::ExitCode {
    let now = chrono::Utc::now();
    let mut ok = true;

    if args.run_archive {
        match archiver.run_archive(now).await {
            Ok(outcome) => {
                info!(archived = outcome.archived, failed = outcome.failed, "archive run done");
                ok &= outcome.all_succeeded();
            }
            Err(err) => {
                error!(%err, "archive run failed");
                ok = false;
            }
        }
    }
    if args.run_simulated_event_purge {
        match archiver.run_simulated_purge(now).await {
            Ok(outcome) => {
                info!(purged = outcome.purged_simulated, "simulated purge done");
            }
            Err(err) => {
                error!(%err, "simulated purge failed");
                ok = false;
            }
        }
    }

    if ok {
        std::process::ExitCode::SUCCESS
    } else {
        std::process::ExitCode::FAILURE
    }
}

async fn schedule(
    archiver: &Archiver<Db, FsObjectStore, Arc<dyn FailureMailer>>,
    timezone: chrono_tz::Tz,
) -> std::process::ExitCode {
    loop {
        let now = chrono::Utc::now();
        let wake_at = next_midnight(timezone, now);
        let sleep_for = (wake_at - now)
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(60));
        info!(%wake_at, "sleeping until the next archive window");
        tokio::time::sleep(sleep_for).await;

        if let Err(err) = daily_run(archiver).await {
            error!(%err, "archive day failed; holding off");
            tokio::time::sleep(FAILURE_HOLDOFF).await;
        }
    }
}

/// Up to three attempts spaced five minutes apart; an attempt that leaves
/// failures behind schedules the next.
async fn daily_run(
    archiver: &Archiver<Db, FsObjectStore, Arc<dyn FailureMailer>>,
) -> Result<(), ArchiveError> {
    let mut last = RunOutcome::default();
    for attempt in 1..=DAILY_ATTEMPTS {
        let now = chrono::Utc::now();
        last = archiver.run_archive(now).await?;
        let purged = archiver.run_simulated_purge(now).await?;
        info!(
            attempt,
            archived = last.archived,
            failed = last.failed,
            purged_simulated = purged.purged_simulated,
            "archive attempt finished"
        );
        if last.all_succeeded() {
            return Ok(());
        }
        if attempt < DAILY_ATTEMPTS {
            tokio::time::sleep(RETRY_SPACING).await;
        }
    }
    warn!(failed = last.failed, "archive day finished with failures");
    Ok(())
}
