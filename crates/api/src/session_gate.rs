use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

/// Tracks sessions with a tour request in flight so one session never has two
/// overlapping model calls.
#[derive(Debug, Clone, Default)]
pub struct SessionGate {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Held for the lifetime of one request; releases the session on drop.
#[derive(Debug)]
pub struct SessionPass {
    gate: SessionGate,
    session_id: String,
}

impl SessionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_enter(&self, session_id: &str) -> Option<SessionPass> {
        if !self.in_flight.lock().insert(session_id.to_string()) {
            return None;
        }

        Some(SessionPass {
            gate: self.clone(),
            session_id: session_id.to_string(),
        })
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }
}

impl Drop for SessionPass {
    fn drop(&mut self) {
        self.gate.in_flight.lock().remove(&self.session_id);
    }
}
