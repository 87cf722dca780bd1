//! Dialog state and in-flight mutation tracking
//!
//! A create/edit form moves through [`DialogState`]; [`MutationGuard`] rejects
//! a second trigger of the same mutation while the first is pending.

use crate::error::{CliError, Result};
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Lifecycle of a modal form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogState {
    #[default]
    Closed,
    Open,
    Submitting,
}

impl DialogState {
    /// Closed -> Open. Re-opening an open dialog is a no-op.
    pub fn open(&mut self) -> Result<()> {
        match self {
            DialogState::Closed | DialogState::Open => {
                *self = DialogState::Open;
                Ok(())
            },
            DialogState::Submitting => Err(CliError::Busy("submit".into())),
        }
    }

    /// Open -> Submitting
    pub fn submit(&mut self) -> Result<()> {
        match self {
            DialogState::Open => {
                *self = DialogState::Submitting;
                Ok(())
            },
            DialogState::Submitting => Err(CliError::Busy("submit".into())),
            DialogState::Closed => Err(CliError::precondition("the form is not open")),
        }
    }

    /// Submitting -> Closed on success, back to Open on failure
    pub fn complete(&mut self, succeeded: bool) {
        if *self == DialogState::Submitting {
            *self = if succeeded {
                DialogState::Closed
            } else {
                DialogState::Open
            };
        }
    }

    /// Open -> Closed; refused while a submission is in flight
    pub fn cancel(&mut self) -> Result<()> {
        match self {
            DialogState::Submitting => Err(CliError::Busy("submit".into())),
            _ => {
                *self = DialogState::Closed;
                Ok(())
            },
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, DialogState::Open | DialogState::Submitting)
    }
}

/// A form plus its dialog state
///
/// The form survives a failed submission so the user can correct it, and is
/// reset to its default once a submission succeeds.
#[derive(Debug, Default)]
pub struct Dialog<F> {
    state: DialogState,
    pub form: F,
}

impl<F: Default + Clone> Dialog<F> {
    pub fn new() -> Self {
        Self {
            state: DialogState::Closed,
            form: F::default(),
        }
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    pub fn open(&mut self) -> Result<()> {
        self.state.open()
    }

    pub fn cancel(&mut self) -> Result<()> {
        self.state.cancel()?;
        self.form = F::default();
        Ok(())
    }

    /// Run `action` on a copy of the current form, driving the state machine
    pub async fn submit<T, A, Fut>(&mut self, action: A) -> Result<T>
    where
        A: FnOnce(F) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.state.submit()?;
        let outcome = action(self.form.clone()).await;
        self.state.complete(outcome.is_ok());
        if outcome.is_ok() {
            self.form = F::default();
        }
        outcome
    }
}

/// Tracks which named mutations are in flight
#[derive(Debug, Clone, Default)]
pub struct MutationGuard {
    pending: Arc<Mutex<HashSet<String>>>,
}

/// Marks a mutation as pending until dropped
#[derive(Debug)]
pub struct PendingMutation {
    name: String,
    pending: Arc<Mutex<HashSet<String>>>,
}

impl Drop for PendingMutation {
    fn drop(&mut self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.remove(&self.name);
    }
}

impl MutationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `name` as pending, or fail with [`CliError::Busy`] if it already is
    pub fn begin(&self, name: impl Into<String>) -> Result<PendingMutation> {
        let name = name.into();
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if !pending.insert(name.clone()) {
            debug!(mutation = %name, "Rejected trigger while pending");
            return Err(CliError::Busy(name));
        }
        Ok(PendingMutation {
            name,
            pending: Arc::clone(&self.pending),
        })
    }

    pub fn is_pending(&self, name: &str) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(name)
    }

    /// Run `fut` with `name` held as pending
    pub async fn run<T, Fut>(&self, name: impl Into<String>, fut: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let _pending = self.begin(name)?;
        fut.await
    }
}
