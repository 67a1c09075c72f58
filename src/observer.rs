//! Observation loop with state machine.
//!
//! AWAITING_TRIGGER → PROCESSING → AWAITING_TRIGGER
//!
//! Two producers (the chat source's change notification and a fixed timer)
//! feed this single consumer, so checks never overlap. At most one
//! notification is kept pending while a check runs.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::chat::{ChangeNotifier, Trigger};
use crate::error::SpeakerError;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverState {
    AwaitingTrigger,
    Processing,
}

impl std::fmt::Display for ObserverState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AwaitingTrigger => write!(f, "AWAITING_TRIGGER"),
            Self::Processing => write!(f, "PROCESSING"),
        }
    }
}

/// Owns the session and runs every check on the task that calls `run`.
///
/// Checks are synchronous. In filtered mode each voiced message waits for the
/// synthesizer to finish, so the runtime thread is blocked for that long and
/// triggers arriving meanwhile wait in the channel.
pub struct Observer {
    session: Session,
    state: ObserverState,
    poll_interval: Duration,
    triggers: mpsc::Receiver<Trigger>,
    notifier: ChangeNotifier,
    checks: u64,
}

impl Observer {
    pub fn new(session: Session, poll_interval: Duration) -> Self {
        // Capacity 1: one pending re-check, further notifications are dropped.
        let (tx, triggers) = mpsc::channel::<Trigger>(1);
        Self {
            session,
            state: ObserverState::AwaitingTrigger,
            poll_interval,
            triggers,
            notifier: ChangeNotifier::new(tx),
            checks: 0,
        }
    }

    /// Seed the cursor from the current chat contents and hook up change
    /// notifications. Nothing already in the chat is spoken.
    pub fn start(&mut self) -> Result<(), SpeakerError> {
        self.session.check()?;
        match self.session.cursor().get() {
            Some(last) => debug!("Baseline message: {last}"),
            None => debug!("Chat is empty, baseline deferred"),
        }
        self.session.subscribe(self.notifier.clone())
    }

    /// Run until `shutdown` completes.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut poll = tokio::time::interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick fires immediately; the baseline check already covered it.
        poll.tick().await;

        info!(
            "Observer ready, checking on changes and every {}ms",
            self.poll_interval.as_millis()
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested after {} checks", self.checks);
                    break;
                }
                trigger = self.triggers.recv() => {
                    match trigger {
                        Some(trigger) => self.on_trigger(trigger),
                        None => {
                            warn!("Trigger channel closed");
                            break;
                        }
                    }
                }
                _ = poll.tick() => self.on_trigger(Trigger::Timer),
            }
        }
    }

    fn on_trigger(&mut self, trigger: Trigger) {
        self.transition(ObserverState::Processing);
        debug!("Checking chat ({trigger:?})");

        let outcomes = self.session.check_logged();
        self.checks += 1;
        if !outcomes.is_empty() {
            debug!("Check #{} dispatched {} message(s)", self.checks, outcomes.len());
        }

        self.transition(ObserverState::AwaitingTrigger);
    }

    fn transition(&mut self, next: ObserverState) {
        debug!("State: {} → {next}", self.state);
        self.state = next;
    }
}
