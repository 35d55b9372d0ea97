use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use reminder_core::domain::{PayloadId, Recipient, parse_due_time};
use reminder_core::impls::LogNotifier;
use reminder_core::queue::ScheduleHandle;
use reminder_core::{SchedulerBuilder, SchedulerConfig};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// One entry of the seed file: the date/time pair of a schedule form plus who to remind.
#[derive(Debug, Deserialize)]
struct Seed {
    date: String,
    time: String,
    payload_id: String,
    name: String,
    address: String,
}

/// Register every valid seed from `path`; invalid ones are logged and skipped.
async fn register_seeds(handle: &ScheduleHandle, path: &Path) -> Result<usize, BoxError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let seeds: Vec<Seed> = serde_json::from_str(&raw)?;

    let mut registered = 0;
    for seed in seeds {
        let due_at = match parse_due_time(&seed.date, &seed.time) {
            Ok(due_at) => due_at,
            Err(error) => {
                warn!(%error, address = %seed.address, "skipping seed");
                continue;
            }
        };
        let payload_id = match PayloadId::parse(&seed.payload_id) {
            Ok(payload_id) => payload_id,
            Err(error) => {
                warn!(%error, address = %seed.address, "skipping seed");
                continue;
            }
        };
        handle
            .register(due_at, payload_id, Recipient::new(seed.name, seed.address))
            .await;
        registered += 1;
    }
    Ok(registered)
}

/// デモ用: 1 件は期限切れ、残りは数分後
async fn register_demo(handle: &ScheduleHandle) -> usize {
    let now = Utc::now();
    let demo = [
        (now - Duration::minutes(1), 27205u64, "ana", "ana@example.com"),
        (now + Duration::minutes(1), 603, "bo", "bo@example.com"),
        (now + Duration::minutes(3), 155, "cy", "cy@example.com"),
    ];
    for (due_at, payload, name, address) in demo {
        handle
            .register(due_at, PayloadId::from(payload), Recipient::new(name, address))
            .await;
    }
    demo.len()
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reminder_core=info,reminder_cli=info".into()),
        )
        .init();

    // (A) 設定と Scheduler を用意
    let config = SchedulerConfig::load()?;
    info!(?config, "configuration loaded");

    let scheduler = SchedulerBuilder::new()
        .config(config)
        .notifier(Arc::new(LogNotifier::new()))
        .build()?;

    // (B) リマインダーを登録（seed ファイル or デモ）
    let handle = scheduler.handle();
    let registered = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => register_seeds(&handle, &path).await?,
        None => register_demo(&handle).await,
    };
    info!(registered, "reminders registered");

    // (C) drain ループを起動し、Ctrl-C まで待つ
    let running = scheduler.spawn()?;
    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    // (D) ループを止める。残ったリマインダーは捨てる
    running.shutdown_and_join().await;
    let status = scheduler.status().await;
    println!("{}", serde_json::to_string_pretty(&status)?);

    Ok(())
}
