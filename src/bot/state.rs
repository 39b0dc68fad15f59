use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Abandoned wizard sessions are dropped after this long.
const WIZARD_TTL: Duration = Duration::from_secs(15 * 60);

/// Step of the schedule-creation dialogue an admin is currently on.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardState {
    AwaitingName,
    AwaitingTrainingDay {
        name: String,
    },
    AwaitingPollDay {
        name: String,
        training_day: String,
    },
    AwaitingTime {
        name: String,
        training_day: String,
        poll_day: String,
    },
    AwaitingChat {
        name: String,
        training_day: String,
        poll_day: String,
        training_time: String,
    },
}

/// In-memory per-user wizard sessions. Owned by the bot adapter; the
/// core never sees it.
#[derive(Default)]
pub struct WizardStore {
    states: Mutex<HashMap<i64, (WizardState, Instant)>>,
}

impl WizardStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<i64, (WizardState, Instant)>> {
        match self.states.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn set(&self, user_id: i64, state: WizardState) {
        let now = Instant::now();
        let mut states = self.lock();
        states.retain(|_, (_, deadline)| *deadline > now);
        states.insert(user_id, (state, now + WIZARD_TTL));
    }

    /// Removes and returns the user's current step; expired sessions
    /// count as absent.
    pub fn take(&self, user_id: i64) -> Option<WizardState> {
        let (state, deadline) = self.lock().remove(&user_id)?;
        if Instant::now() >= deadline {
            return None;
        }
        Some(state)
    }

    pub fn clear(&self, user_id: i64) {
        self.lock().remove(&user_id);
    }

    #[cfg(test)]
    fn expire(&self, user_id: i64) {
        if let Some((_, deadline)) = self.lock().get_mut(&user_id) {
            *deadline = Instant::now();
        }
    }
}
