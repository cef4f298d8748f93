//! Terminal preview of a frame's playback
//!
//! Drives the session's timeline from a [`TickScheduler`] on a
//! current-thread tokio runtime and prints the rendered transform of every
//! animated element on each tick.

use anyhow::{Context, Result};
use scena_animation::{TickOutcome, TickScheduler};
use scena_core::ElementKey;
use scena_document::Session;
use std::io::Write;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// What a finished preview did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewReport {
    pub ticks: u64,
    pub elapsed: Duration,
}

/// Play the session's active frame to completion at `hz`
pub fn run<W: Write>(session: &mut Session, hz: u32, out: &mut W) -> Result<PreviewReport> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to start preview runtime")?;
    runtime.block_on(play(session, TickScheduler::new(hz), out))
}

async fn play<W: Write>(
    session: &mut Session,
    mut scheduler: TickScheduler,
    out: &mut W,
) -> Result<PreviewReport> {
    let keys: Vec<ElementKey> = match session.document().frame(session.active_frame()) {
        Some(frame) => frame
            .element_states()
            .filter(|state| state.is_animated())
            .map(|state| state.key)
            .collect(),
        None => anyhow::bail!("Document has no frame {}", session.active_frame()),
    };

    let epoch = Instant::now();
    if !session.play_at(epoch) {
        anyhow::bail!("Playback is already running");
    }
    info!(
        frame = session.active_frame(),
        elements = keys.len(),
        hz = scheduler.hz(),
        "preview started"
    );

    loop {
        let now = Instant::now();
        if scheduler.poll(now) {
            let elapsed = now.saturating_duration_since(epoch);
            let outcome = session.tick(now);
            if outcome == TickOutcome::Running {
                write_tick(session, &keys, elapsed, out)?;
            } else {
                writeln!(out, "{:>7}ms  done", elapsed.as_millis())?;
                debug!(ticks = scheduler.ticks(), "preview finished");
                return Ok(PreviewReport {
                    ticks: scheduler.ticks(),
                    elapsed,
                });
            }
        }
        let deadline = scheduler.next_deadline(Instant::now());
        tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
    }
}

fn write_tick<W: Write>(
    session: &Session,
    keys: &[ElementKey],
    elapsed: Duration,
    out: &mut W,
) -> Result<()> {
    write!(out, "{:>7}ms", elapsed.as_millis())?;
    for key in keys {
        if let Some(t) = session.rendered(*key) {
            write!(
                out,
                "  {key}: pos=({:.1}, {:.1}) scale=({:.2}, {:.2})",
                t.position.x, t.position.y, t.scale.x, t.scale.y
            )?;
        }
    }
    writeln!(out)?;
    Ok(())
}
