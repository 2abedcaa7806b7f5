//! Agent process termination.

use std::process::Child;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Log target for process lifecycle events.
const LIFECYCLE_TARGET: &str = "wmiclient::lifecycle";

/// How long an agent may take to exit after its stdin is closed.
const GRACE_PERIOD: Duration = Duration::from_millis(200);

/// Interval between exit checks during the grace period.
const GRACE_POLL: Duration = Duration::from_millis(20);

/// Waits for an agent whose stdin has been closed, killing it if necessary.
///
/// The process is always reaped before this returns. A process that has
/// already exited is reaped without waiting.
pub(super) fn terminate_child(child: &mut Child) {
    let pid = child.id();
    let deadline = Instant::now() + GRACE_PERIOD;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(target: LIFECYCLE_TARGET, pid, ?status, "agent exited");
                return;
            }
            Ok(None) if Instant::now() < deadline => thread::sleep(GRACE_POLL),
            Ok(None) => {
                warn!(
                    target: LIFECYCLE_TARGET,
                    pid,
                    "agent did not exit within the grace period, killing it"
                );
                break;
            }
            Err(error) => {
                warn!(
                    target: LIFECYCLE_TARGET,
                    pid,
                    %error,
                    "failed to check agent status, killing it"
                );
                break;
            }
        }
    }
    kill_and_reap(child);
}

fn kill_and_reap(child: &mut Child) {
    if let Err(error) = child.kill() {
        debug!(target: LIFECYCLE_TARGET, pid = child.id(), %error, "kill failed");
    }
    match child.wait() {
        Ok(status) => debug!(target: LIFECYCLE_TARGET, pid = child.id(), ?status, "agent reaped"),
        Err(error) => warn!(target: LIFECYCLE_TARGET, pid = child.id(), %error, "failed to reap agent"),
    }
}
