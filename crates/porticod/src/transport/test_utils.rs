//! Test helpers for the transport module.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{Disarm, ShutdownCause, ShutdownError, ShutdownSignal, ShutdownTrigger};

/// Signal source a test delivers by hand; counts arming and disarming.
#[derive(Default)]
pub(crate) struct ManualShutdownSignal {
    trigger: Mutex<Option<ShutdownTrigger>>,
    arms: AtomicUsize,
    disarms: Arc<AtomicUsize>,
}

impl ManualShutdownSignal {
    /// Fires `signal` at the armed gateway; `false` when nothing is armed.
    pub(crate) fn deliver(&self, signal: i32) -> bool {
        let armed = self.trigger.lock().expect("trigger mutex poisoned");
        let Some(trigger) = armed.as_ref() else {
            return false;
        };
        trigger.fire(ShutdownCause::Signal(signal));
        true
    }

    pub(crate) fn arms(&self) -> usize {
        self.arms.load(Ordering::SeqCst)
    }

    pub(crate) fn disarms(&self) -> usize {
        self.disarms.load(Ordering::SeqCst)
    }
}

impl ShutdownSignal for ManualShutdownSignal {
    fn arm(&self, trigger: ShutdownTrigger) -> Result<Disarm, ShutdownError> {
        *self.trigger.lock().expect("trigger mutex poisoned") = Some(trigger);
        self.arms.fetch_add(1, Ordering::SeqCst);
        let disarms = Arc::clone(&self.disarms);
        Ok(Box::new(move || {
            disarms.fetch_add(1, Ordering::SeqCst);
        }))
    }
}
