//! Mute clock: periodic sweep that lifts expired mutes
//!
//! The sweep itself is a pure function over standings. The background loop
//! only asks the session actor to run it, so expiry and escalation never
//! write the same standing concurrently.

use crate::error::ModerationError;
use crate::models::{AuditEntry, UserStanding};
use crate::session::SessionHandle;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Lift every mute whose expiry is at or before `now`.
///
/// Returns one audit entry per lifted mute, in iteration order. Standings that
/// are not muted, or not yet due, are left untouched.
pub fn expire_mutes<'a>(
    standings: impl IntoIterator<Item = &'a mut UserStanding>,
    now: DateTime<Utc>,
) -> Vec<AuditEntry> {
    let mut expired = Vec::new();

    for standing in standings {
        if !standing.mute_expired(now) {
            continue;
        }

        let overdue = standing
            .muted_until
            .map(|until| now - until)
            .unwrap_or_else(ChronoDuration::zero);

        *standing = standing.with_mute_lifted();

        info!(
            user_id = %standing.user_id,
            username = %standing.username,
            overdue_ms = overdue.num_milliseconds(),
            "Mute expired, user unmuted"
        );

        expired.push(AuditEntry::mute_expired(standing, now));
    }

    expired
}

/// Background task driving [`expire_mutes`] on a fixed cadence
#[derive(Debug, Clone)]
pub struct MuteClock {
    tick_interval: Duration,
}

impl MuteClock {
    pub fn new(tick_interval: Duration) -> Self {
        Self { tick_interval }
    }

    /// Run until shutdown is signalled or the session closes.
    ///
    /// Missed ticks are not replayed; the next tick lifts anything overdue.
    pub async fn run(self, session: SessionHandle, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_ms = self.tick_interval.as_millis() as u64,
            "Starting mute clock"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match session.expire_mutes().await {
                        Ok(expired) => {
                            if !expired.is_empty() {
                                info!(count = expired.len(), "Mute clock lifted expired mutes");
                            }
                        }
                        Err(ModerationError::SessionClosed) => {
                            info!("Session closed, stopping mute clock");
                            break;
                        }
                        Err(e) => {
                            error!(error = %e, "Mute clock sweep failed, will retry on next tick");
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!("Received shutdown signal, stopping mute clock");
                    break;
                }
            }
        }

        info!("Mute clock stopped");
    }
}

impl Default for MuteClock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}
