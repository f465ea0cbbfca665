//! Session context
//!
//! Farm settings, user profile and language for one session. A `Session` is
//! created from configured defaults, handed by reference to whatever needs it,
//! and consumed by `end`. Nothing is persisted.

mod state;

pub use state::SessionState;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::schema::{DashboardInput, FarmSettings, Language, UserProfile};

#[derive(Debug)]
pub struct Session {
    id: Uuid,
    started_at: DateTime<Utc>,
    pub farm: SessionState<FarmSettings>,
    pub user: SessionState<UserProfile>,
    pub language: SessionState<Language>,
}

impl Session {
    /// Start a session from configured defaults
    pub fn new(defaults: &SessionConfig) -> Self {
        let id = Uuid::now_v7();
        info!(%id, language = %defaults.language, "session started");
        Self {
            id,
            started_at: Utc::now(),
            farm: SessionState::new(defaults.farm.clone()),
            user: SessionState::new(defaults.user.clone()),
            language: SessionState::new(defaults.language),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Dashboard summary input for the current farm location and language
    pub fn dashboard_input(&self) -> DashboardInput {
        debug!(id = %self.id, "Session::dashboard_input: called");
        DashboardInput {
            location: self.farm.get().farm_location,
            language: self.language.get(),
        }
    }

    /// End the session, discarding all of its state
    pub fn end(self) {
        let elapsed = Utc::now() - self.started_at;
        info!(id = %self.id, elapsed_secs = elapsed.num_seconds(), "session ended");
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_defaults() {
        let defaults = SessionConfig {
            language: Language::Pa,
            ..Default::default()
        };
        let session = Session::new(&defaults);

        assert_eq!(session.language.get(), Language::Pa);
        assert_eq!(session.farm.get().farm_name, "Sunny Meadows Farm");
        assert_eq!(session.user.get().full_name, "AgriVision User");
    }

    #[test]
    fn test_dashboard_input_follows_state() {
        let session = Session::default();
        session
            .farm
            .update(|farm| farm.farm_location = "Haryana, India".to_string())
            .unwrap();
        session.language.set(Language::Hi).unwrap();

        let input = session.dashboard_input();
        assert_eq!(input.location, "Haryana, India");
        assert_eq!(input.language, Language::Hi);
    }

    #[test]
    fn test_sessions_are_independent() {
        let a = Session::default();
        let b = Session::default();
        a.language.set(Language::Hi).unwrap();

        assert_eq!(b.language.get(), Language::En);
        assert_ne!(a.id(), b.id());
        a.end();
        b.end();
    }
}
