//! Dashboard panel
//!
//! Keeps the farm summary in step with the session: whenever the language or
//! the farm location changes, the summary is requested again.

use tokio::sync::watch;
use tracing::{debug, info};

use super::{FormAdapter, FormState};
use crate::flows::{FlowRunner, SummarizeDashboard};
use crate::schema::{DashboardInput, DashboardSummary};
use crate::session::Session;

pub struct DashboardPanel {
    form: FormAdapter<SummarizeDashboard>,
}

impl DashboardPanel {
    pub fn new(runner: FlowRunner) -> Self {
        Self {
            form: FormAdapter::new(runner),
        }
    }

    pub fn state(&self) -> FormState<DashboardSummary> {
        self.form.state()
    }

    pub fn render(&self) -> Option<String> {
        self.form.render()
    }

    pub fn is_pending(&self) -> bool {
        self.form.is_pending()
    }

    pub fn subscribe(&self) -> watch::Receiver<FormState<DashboardSummary>> {
        self.form.subscribe()
    }

    /// Request a summary for the session's current location and language
    pub async fn refresh(&self, session: &Session) -> FormState<DashboardSummary> {
        debug!(session = %session.id(), "DashboardPanel::refresh: called");
        self.form.submit(session.dashboard_input()).await
    }

    /// Refresh only if the dashboard input differs from `last`
    ///
    /// `last` is updated to the input that was submitted.
    pub async fn refresh_if_changed(
        &self,
        session: &Session,
        last: &mut DashboardInput,
    ) -> Option<FormState<DashboardSummary>> {
        let input = session.dashboard_input();
        if input == *last {
            debug!("DashboardPanel::refresh_if_changed: unchanged");
            return None;
        }
        info!(location = %input.location, language = %input.language, "dashboard input changed");
        *last = input.clone();
        Some(self.form.submit(input).await)
    }

    /// Refresh now, then again on every language or farm location change
    ///
    /// Runs until the session's state channels close or the future is dropped.
    /// Farm edits that leave the location alone do not trigger a refresh.
    pub async fn follow(&self, session: &Session) {
        debug!(session = %session.id(), "DashboardPanel::follow: called");
        let mut language = session.language.subscribe();
        let mut farm = session.farm.subscribe();

        let mut last = session.dashboard_input();
        self.form.submit(last.clone()).await;

        loop {
            tokio::select! {
                changed = language.changed() => if changed.is_err() { break },
                changed = farm.changed() => if changed.is_err() { break },
            }
            self.refresh_if_changed(session, &mut last).await;
        }
        debug!("DashboardPanel::follow: session closed");
    }
}
