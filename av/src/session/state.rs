//! Observable session value

use tokio::sync::watch;
use tracing::debug;

use crate::schema::{Contract, ValidationError};

/// One piece of session context
///
/// Writes go through `set`/`update`, which validate first; a rejected write
/// leaves the current value untouched. Subscribers are woken only when the
/// value actually changes.
#[derive(Debug)]
pub struct SessionState<T> {
    tx: watch::Sender<T>,
}

impl<T> SessionState<T>
where
    T: Contract + Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// Current value
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Replace the value after validating it
    pub fn set(&self, value: T) -> Result<(), ValidationError> {
        value.validate()?;
        let changed = self.tx.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
        debug!(%changed, "SessionState::set");
        Ok(())
    }

    /// Modify a copy of the value and `set` it
    pub fn update(&self, f: impl FnOnce(&mut T)) -> Result<(), ValidationError> {
        let mut next = self.get();
        f(&mut next);
        self.set(next)
    }

    /// Watch for changes
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FarmSettings, Language};

    #[test]
    fn test_set_validates() {
        let state = SessionState::new(FarmSettings::default());
        let err = state
            .update(|farm| farm.farm_size = 0.0)
            .unwrap_err();

        assert_eq!(err.field_name(), "farmSize");
        assert_eq!(state.get().farm_size, 500.0);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let state = SessionState::new(Language::En);
        let mut rx = state.subscribe();

        state.set(Language::Hi).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Language::Hi);
    }

    #[test]
    fn test_same_value_does_not_notify() {
        let state = SessionState::new(Language::Pa);
        let rx = state.subscribe();

        state.set(Language::Pa).unwrap();
        assert!(!rx.has_changed().unwrap());
    }
}
