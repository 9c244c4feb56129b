//! The poll-detect-notify loop.
//!
//! Each cycle runs fetch → validate → translate with no state mutation
//! ([`run_cycle`]), then folds the outcome into the loop state with a pure
//! transition ([`advance`]) that applies the two laws the loop lives by:
//!
//! - Cursor law: the query window advances only on a validated response that
//!   carries a server `current_date`; any failure leaves it untouched.
//! - Dedup law: a delivery is attempted iff the computed message (status
//!   change or diagnostic) differs from the last one sent, and the
//!   last-message state is updated exactly then.
//!
//! [`Watcher`] wires the transition to real collaborators and the
//! fixed-interval schedule. The loop has no terminal state of its own; it
//! runs until the stop flag is raised from outside.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::api::validate::{validate, ApiContract, StatusBatch, ValidateError};
use crate::api::{FetchError, StatusSource};
use crate::notify::MessageSink;
use crate::verdicts::{render_status_change, TranslateError};

/// Seconds between poll cycles unless overridden.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(600);

/// How often the inter-cycle sleep rechecks the stop flag.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Any failure a cycle can end in. The watcher reports these through the
/// notification channel rather than letting them out of the loop.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Validate(#[from] ValidateError),

    #[error(transparent)]
    Translate(#[from] TranslateError),
}

/// Loop state owned by the watcher: the query window start and the last
/// notification text sent (empty until the first delivery attempt).
#[derive(Debug, Clone)]
pub struct WatchState {
    pub cursor: i64,
    last_message: String,
}

impl WatchState {
    pub fn new(cursor: i64) -> Self {
        Self {
            cursor,
            last_message: String::new(),
        }
    }

    pub fn last_message(&self) -> &str {
        &self.last_message
    }
}

/// What one cycle produced. `cursor` is the server clock to advance to,
/// absent under the legacy contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The tracked homework has a (possibly unchanged) status to report.
    Update { message: String, cursor: Option<i64> },
    /// Valid response, nothing in the window.
    Quiet { cursor: Option<i64> },
    /// Some step failed; `report` is the diagnostic text for the user.
    Failure { report: String },
}

/// Run one fetch → validate → translate pass. No state is touched; failures
/// are folded into a [`CycleOutcome::Failure`] carrying the diagnostic text.
pub fn run_cycle(source: &dyn StatusSource, contract: ApiContract, cursor: i64) -> CycleOutcome {
    match try_cycle(source, contract, cursor) {
        Ok(outcome) => outcome,
        Err(err) => {
            error!("poll cycle failed: {err}");
            CycleOutcome::Failure {
                report: format!("Сбой в работе программы: {err}"),
            }
        }
    }
}

fn try_cycle(
    source: &dyn StatusSource,
    contract: ApiContract,
    cursor: i64,
) -> Result<CycleOutcome, CycleError> {
    debug!("querying status API, from_date={cursor}");
    let raw = source.fetch(cursor)?;
    let StatusBatch {
        homeworks,
        current_date,
    } = validate(&raw, contract)?;

    match homeworks.first() {
        Some(item) => {
            let message = render_status_change(item)?;
            Ok(CycleOutcome::Update {
                message,
                cursor: current_date,
            })
        }
        None => {
            debug!("no homework updates in this window");
            Ok(CycleOutcome::Quiet {
                cursor: current_date,
            })
        }
    }
}

/// Fold one cycle outcome into the loop state.
///
/// Returns the next state and the message to deliver this cycle, if any.
/// `last_message` in the returned state is updated exactly when a message is
/// returned.
pub fn advance(state: &WatchState, outcome: &CycleOutcome) -> (WatchState, Option<String>) {
    let mut next = state.clone();

    let candidate = match outcome {
        CycleOutcome::Update { message, cursor } => {
            if let Some(server_date) = cursor {
                next.cursor = *server_date;
            }
            Some(message)
        }
        CycleOutcome::Quiet { cursor } => {
            if let Some(server_date) = cursor {
                next.cursor = *server_date;
            }
            None
        }
        CycleOutcome::Failure { report } => Some(report),
    };

    match candidate {
        Some(message) if *message != state.last_message => {
            next.last_message = message.clone();
            (next, Some(message.clone()))
        }
        _ => (next, None),
    }
}

/// The orchestrator: owns the loop state and drives the injected status
/// source and message sink on a fixed schedule.
pub struct Watcher<S: StatusSource, N: MessageSink> {
    source: S,
    sink: N,
    contract: ApiContract,
    state: WatchState,
}

impl<S: StatusSource, N: MessageSink> Watcher<S, N> {
    pub fn new(source: S, sink: N, contract: ApiContract, initial_cursor: i64) -> Self {
        Self {
            source,
            sink,
            contract,
            state: WatchState::new(initial_cursor),
        }
    }

    pub fn state(&self) -> &WatchState {
        &self.state
    }

    /// Run one full cycle: poll, fold the outcome into the state, and
    /// deliver the resulting message if there is one. A failed delivery is
    /// logged and swallowed; notifying about it would recurse through the
    /// same channel.
    pub fn tick(&mut self) {
        let outcome = run_cycle(&self.source, self.contract, self.state.cursor);
        let (next, message) = advance(&self.state, &outcome);
        self.state = next;

        if let Some(text) = message {
            info!("sending notification: {text}");
            match self.sink.send(&text) {
                Ok(()) => debug!("notification delivered"),
                Err(err) => error!("notification delivery failed: {err}"),
            }
        }
    }

    /// Tick forever on the given interval until `stop` is raised.
    pub fn run(&mut self, interval: Duration, stop: &AtomicBool) {
        info!(
            "watch loop started, polling every {}s from_date={}",
            interval.as_secs(),
            self.state.cursor
        );

        while !stop.load(Ordering::SeqCst) {
            self.tick();
            sleep_interruptible(interval, stop);
        }

        info!("watch loop stopped");
    }
}

/// Sleep for `total`, waking early if the stop flag is raised so shutdown
/// does not wait out a full poll interval.
fn sleep_interruptible(total: Duration, stop: &AtomicBool) {
    let deadline = Instant::now() + total;

    while !stop.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep((deadline - now).min(STOP_POLL_INTERVAL));
    }
}
