//! SCTP fuzz driver binary.
//!
//! Loads the session configuration, opens the session and replays a payload
//! corpus against the target, reporting session statistics at the end.

use anyhow::Context;
use clap::Parser;
use fuzz_session::{Session, SessionStats};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[macro_use]
mod logging;
mod config;
mod driver;
mod payload;

use config::FuzzConfig;
use driver::Plan;
use logging::FuzzLogFormatter;

/// Replay payloads against an SCTP target
#[derive(Parser, Debug)]
#[command(name = "sctp-fuzz", version, about = "Replay fuzz payloads over SCTP")]
struct Args {
    /// Configuration file path
    #[arg(long, default_value = "fuzz.yaml")]
    config: PathBuf,

    /// Payload file, or directory of payload files
    #[arg(long)]
    input: Option<PathBuf>,

    /// Literal payload text (repeatable)
    #[arg(long)]
    payload: Vec<String>,

    /// Passes over the payload list
    #[arg(long)]
    rounds: Option<u32>,

    /// Stream id override for every send
    #[arg(long)]
    stream_id: Option<u16>,

    /// Pause between sends, e.g. 100ms
    #[arg(long)]
    delay: Option<humantime::Duration>,

    /// Read one reply after every send
    #[arg(long)]
    expect_reply: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!(
            "warn,sctp_fuzz={level},fuzz={level},fuzz_session={level},fuzz_wire={level}",
            level = args.log_level
        ))
    })?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .event_format(FuzzLogFormatter::new("fuzz"))
        .init();

    info!("Starting sctp-fuzz v{}", env!("CARGO_PKG_VERSION"));

    let config = FuzzConfig::load_from_file(&args.config)?;

    let input = args.input.clone().or_else(|| config.driver.input.clone());
    let payloads = payload::collect(input.as_deref(), &args.payload)?;
    if payloads.is_empty() {
        anyhow::bail!("no payloads given; use --input or --payload");
    }

    let plan = Plan {
        rounds: args.rounds.unwrap_or(config.driver.rounds),
        delay: match args.delay {
            Some(delay) => Duration::from(delay),
            None => config.driver.delay()?,
        },
        stream_id: args.stream_id.or(config.driver.stream_id),
        expect_reply: args.expect_reply || config.driver.expect_reply,
    };
    info!(
        "Replaying {} payloads x {} rounds (delay={:?}, stream={:?}, expect_reply={})",
        payloads.len(),
        plan.rounds,
        plan.delay,
        plan.stream_id,
        plan.expect_reply
    );

    let stop = Arc::new(AtomicBool::new(false));
    let worker_stop = Arc::clone(&stop);
    let session_config = config.session.clone();

    let mut worker = tokio::task::spawn_blocking(move || -> anyhow::Result<SessionStats> {
        let mut session = Session::sctp(session_config)?;
        session
            .open_with_retry()
            .with_context(|| format!("connecting to {}", session.target()))?;
        component_info!(
            "session",
            "Session to {} open (max payload {} bytes)",
            session.target(),
            session.max_payload_size()
        );

        let result = driver::run(&mut session, &payloads, &plan, &worker_stop);
        session.close();
        result
    });

    let outcome = tokio::select! {
        joined = &mut worker => joined?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Received Ctrl+C, stopping after the current message");
            stop.store(true, Ordering::Relaxed);
            worker.await?
        }
    };

    match outcome {
        Ok(stats) => {
            report(&stats);
            Ok(())
        }
        Err(e) => {
            component_error!("driver", "Replay aborted: {:#}", e);
            Err(e)
        }
    }
}

fn report(stats: &SessionStats) {
    info!(
        "Sent {} messages ({} bytes), {} truncated",
        stats.messages_sent, stats.bytes_sent, stats.truncated
    );
    info!(
        "Send failures: {}, reopens: {}",
        stats.send_failures, stats.reopens
    );
    info!(
        "Received {} messages ({} bytes)",
        stats.messages_received, stats.bytes_received
    );
}
