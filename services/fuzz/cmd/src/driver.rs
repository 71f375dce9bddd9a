//! Payload replay loop.
//!
//! Runs on a blocking thread: every send and receive goes straight to the
//! session, which blocks for at most the configured timeout.

use anyhow::{Context, Result};
use fuzz_session::{Connector, Session, SessionStats};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::payload::Payload;

/// How the corpus is replayed
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub rounds: u32,
    pub delay: Duration,
    pub stream_id: Option<u16>,
    pub expect_reply: bool,
}

/// Replay `payloads` over an open session until done or `stop` is raised
pub fn run<C: Connector>(
    session: &mut Session<C>,
    payloads: &[Payload],
    plan: &Plan,
    stop: &AtomicBool,
) -> Result<SessionStats> {
    'rounds: for round in 1..=plan.rounds {
        component_debug!("driver", "Round {}/{}", round, plan.rounds);

        for payload in payloads {
            if stop.load(Ordering::Relaxed) {
                component_info!("driver", "Stop requested, ending replay in round {}", round);
                break 'rounds;
            }

            if session.read_first() {
                read_reply(session, "before", &payload.name);
            }

            session
                .send(&payload.data, plan.stream_id)
                .with_context(|| format!("sending payload {}", payload.name))?;
            component_debug!(
                "driver",
                "Sent {} ({} bytes)",
                payload.name,
                payload.data.len()
            );

            if plan.expect_reply {
                read_reply(session, "after", &payload.name);
            }

            if !plan.delay.is_zero() {
                std::thread::sleep(plan.delay);
            }
        }
    }

    Ok(session.stats().clone())
}

fn read_reply<C: Connector>(session: &mut Session<C>, when: &str, name: &str) {
    match session.recv() {
        Ok(reply) => component_debug!(
            "driver",
            "Received {} bytes {} {}",
            reply.len(),
            when,
            name
        ),
        Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
            component_debug!("driver", "No reply {} {}", when, name)
        }
        Err(e) => component_warn!("driver", "Receive {} {} failed: {}", when, name, e),
    }
}
