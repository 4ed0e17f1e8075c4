use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::error::PullError;

/// Identifier of one logical session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        SessionId(s.to_owned())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        SessionId(s)
    }
}

/// Identifier of one consumer within a session, as known to the mode guard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConsumerId(pub String);

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConsumerId {
    fn from(s: &str) -> Self {
        ConsumerId(s.to_owned())
    }
}

impl From<String> for ConsumerId {
    fn from(s: String) -> Self {
        ConsumerId(s)
    }
}

/// How a session is currently consuming messages, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumptionMode {
    Idle,
    PushActive,
    PullActive,
}

impl fmt::Display for ConsumptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsumptionMode::Idle => f.write_str("idle"),
            ConsumptionMode::PushActive => f.write_str("push"),
            ConsumptionMode::PullActive => f.write_str("pull"),
        }
    }
}

#[derive(Debug)]
struct ModeState {
    mode: ConsumptionMode,
    holders: HashSet<ConsumerId>,
}

/// Per-session arbiter keeping push (listener) and pull (blocking receive)
/// consumption mutually exclusive.
///
/// If both a registered callback and a blocked synchronous wait could be
/// serviced by the same delivery path, dispatch ordering would be undefined,
/// so the conflicting transition is rejected outright. The check and the
/// transition happen atomically under one session-wide lock; the guard is
/// consulted at the mode-change call site, never polled.
#[derive(Debug)]
pub struct ConsumptionModeGuard {
    session: SessionId,
    state: Mutex<ModeState>,
}

impl ConsumptionModeGuard {
    pub fn new(session: SessionId) -> Self {
        Self {
            session,
            state: Mutex::new(ModeState {
                mode: ConsumptionMode::Idle,
                holders: HashSet::new(),
            }),
        }
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn mode(&self) -> ConsumptionMode {
        self.state.lock().mode
    }

    /// Install an asynchronous callback on a consumer of this session.
    ///
    /// Re-installing while already push-active is allowed (the callback is
    /// replaced, the mode is unchanged). Push mode has no exit: once a
    /// session has gone asynchronous it stays asynchronous.
    pub fn enter_push_mode(&self, consumer: &ConsumerId) -> Result<(), PullError> {
        let mut state = self.state.lock();
        match state.mode {
            ConsumptionMode::PullActive => Err(self.conflict(state.mode, consumer)),
            _ => {
                state.mode = ConsumptionMode::PushActive;
                state.holders.insert(consumer.clone());
                debug!(session = %self.session, consumer = %consumer, "push mode entered");
                Ok(())
            }
        }
    }

    /// A caller thread is entering a blocking receive on a consumer of this
    /// session. Held only for the duration of that one blocking call; pair
    /// with [`exit_pull_mode`](Self::exit_pull_mode).
    pub fn enter_pull_mode(&self, consumer: &ConsumerId) -> Result<(), PullError> {
        let mut state = self.state.lock();
        match state.mode {
            ConsumptionMode::PushActive => Err(self.conflict(state.mode, consumer)),
            _ => {
                state.mode = ConsumptionMode::PullActive;
                state.holders.insert(consumer.clone());
                debug!(session = %self.session, consumer = %consumer, "pull mode entered");
                Ok(())
            }
        }
    }

    /// The blocking receive on `consumer` has completed (success, timeout,
    /// or failure). The session returns to idle when the last holder exits.
    pub fn exit_pull_mode(&self, consumer: &ConsumerId) {
        let mut state = self.state.lock();
        if state.mode != ConsumptionMode::PullActive {
            debug!(session = %self.session, consumer = %consumer, "pull exit while not pull-active");
            return;
        }
        state.holders.remove(consumer);
        if state.holders.is_empty() {
            state.mode = ConsumptionMode::Idle;
            debug!(session = %self.session, "session idle");
        }
    }

    fn conflict(&self, active: ConsumptionMode, consumer: &ConsumerId) -> PullError {
        warn!(
            session = %self.session,
            consumer = %consumer,
            active = %active,
            "consumption mode conflict"
        );
        PullError::ModeConflict {
            session: self.session.clone(),
            active,
        }
    }
}

/// Resolves the mode guard for any session of a connection.
#[derive(Debug, Default)]
pub struct ModeGuardRegistry {
    guards: DashMap<SessionId, Arc<ConsumptionModeGuard>>,
}

impl ModeGuardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the guard for `session`, creating it on first use.
    pub fn guard(&self, session: &SessionId) -> Arc<ConsumptionModeGuard> {
        self.guards
            .entry(session.clone())
            .or_insert_with(|| Arc::new(ConsumptionModeGuard::new(session.clone())))
            .clone()
    }

    /// Drop the guard when its session closes.
    pub fn remove(&self, session: &SessionId) {
        self.guards.remove(session);
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}
