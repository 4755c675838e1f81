//! Switch runtime: the receive loop and the periodic advertiser.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::link::LinkLayer;
use crate::stp::StpEngine;
use crate::switch::{Egress, Switch};

/// Interval between root advertisements.
pub const HELLO_INTERVAL: Duration = Duration::from_secs(1);

/// Runs `switch` on `link` until `shutdown` resolves.
///
/// Returns the switch so callers can inspect its final state. A link that
/// closes every port ends the loop with [`crate::SwitchError::LinkClosed`].
pub async fn run<L, F>(link: Arc<L>, mut switch: Switch, shutdown: F) -> Result<Switch>
where
    L: LinkLayer + ?Sized + 'static,
    F: Future<Output = ()>,
{
    let reporter = Arc::new(ChangeReporter::new());
    reporter.report(switch.stp());

    let advertiser = tokio::spawn(advertise(
        Arc::clone(&link),
        Arc::clone(switch.stp()),
        Arc::clone(&reporter),
    ));
    info!(
        bridge = %switch.stp().own_id(),
        ports = link.port_count(),
        "Switch running"
    );

    tokio::pin!(shutdown);
    let result = loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break Ok(());
            }
            received = link.recv_any() => match received {
                Ok((port, frame)) => {
                    let egress = switch.handle_frame(port, &frame);
                    transmit(&*link, &egress);
                    reporter.report(switch.stp());
                }
                Err(e) => {
                    error!(error = %e, "Link layer failed");
                    break Err(e);
                }
            },
        }
    };

    advertiser.abort();
    log_snapshot(switch.stp(), "Final bridge state");
    let stats = switch.forwarding_stats();
    info!(
        frames = stats.frames_received,
        flooded = stats.flooded,
        transmitted = stats.transmitted,
        malformed = switch.malformed(),
        learned = switch.fdb().len(),
        "Forwarding totals"
    );

    result.map(|()| switch)
}

async fn advertise<L>(link: Arc<L>, stp: Arc<StpEngine>, reporter: Arc<ChangeReporter>)
where
    L: LinkLayer + ?Sized,
{
    let mut interval = tokio::time::interval(HELLO_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        let egress = stp.tick();
        transmit(&*link, &egress);
        reporter.report(&stp);
    }
}

fn transmit<L>(link: &L, egress: &[Egress])
where
    L: LinkLayer + ?Sized,
{
    for out in egress {
        link.send(out.port, &out.frame);
    }
}

/// Logs the bridge state whenever its generation moves.
struct ChangeReporter {
    last: AtomicU64,
}

impl ChangeReporter {
    fn new() -> Self {
        Self {
            last: AtomicU64::new(u64::MAX),
        }
    }

    fn report(&self, stp: &StpEngine) {
        let generation = stp.generation();
        if self.last.swap(generation, Ordering::Relaxed) != generation {
            log_snapshot(stp, "Bridge state changed");
        }
    }
}

fn log_snapshot(stp: &StpEngine, message: &'static str) {
    match serde_json::to_string(&stp.snapshot()) {
        Ok(state) => info!(%state, "{}", message),
        Err(e) => warn!(error = %e, "Failed to serialize bridge state"),
    }
}
