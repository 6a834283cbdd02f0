//! Interrupt delivery gate
//!
//! A single-slot gate between the hardware interrupt callback and the
//! enable/disable requests of the control path. At most one dispatch is in
//! flight; a disable request waits for it to drain and never preempts it.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// State of the gate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IrqGateState {
    /// No dispatch running, interrupts accepted
    #[default]
    Free,
    /// A dispatch is running
    InFlight,
    /// Interrupts are being torn down; callbacks are ignored
    Disabled,
}

/// Interrupt delivery gate
#[derive(Debug, Default)]
pub struct IrqGate {
    state: Mutex<IrqGateState>,
    drained: Condvar,
}

/// Proof that the caller holds the dispatch slot
///
/// Dropping the ticket returns the gate to [`IrqGateState::Free`] and wakes
/// any waiter, including when the dispatched handler panics.
#[must_use = "the dispatch slot is released when the ticket is dropped"]
pub struct IrqTicket<'a> {
    gate: &'a IrqGate,
}

impl Drop for IrqTicket<'_> {
    fn drop(&mut self) {
        let mut state = self.gate.lock();
        *state = IrqGateState::Free;
        self.gate.drained.notify_all();
    }
}

impl IrqGate {
    /// Create an open gate
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> IrqGateState {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, IrqGateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_drained<'a>(
        &'a self,
        guard: MutexGuard<'a, IrqGateState>,
    ) -> MutexGuard<'a, IrqGateState> {
        self.drained
            .wait_while(guard, |state| *state == IrqGateState::InFlight)
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the dispatch slot for one interrupt
    ///
    /// Returns `None` if the gate is disabled; the interrupt must then be
    /// dropped.
    pub fn enter(&self) -> Option<IrqTicket<'_>> {
        let mut state = self.wait_drained(self.lock());
        if *state == IrqGateState::Disabled {
            return None;
        }
        *state = IrqGateState::InFlight;
        Some(IrqTicket { gate: self })
    }

    /// Close the gate and run `release` to unregister the callback
    ///
    /// Blocks while a dispatch is in flight. The gate is disabled while
    /// `release` runs and is left free afterwards, so a later [`open`]
    /// starts cleanly.
    ///
    /// [`open`]: Self::open
    pub fn close<R>(&self, release: impl FnOnce() -> R) -> R {
        {
            let mut state = self.wait_drained(self.lock());
            *state = IrqGateState::Disabled;
        }

        let result = release();

        let mut state = self.lock();
        *state = IrqGateState::Free;
        self.drained.notify_all();
        result
    }

    /// Open the gate and run `claim` to register the callback
    ///
    /// Blocks while a dispatch is in flight so the slot is never handed out
    /// twice.
    pub fn open<R>(&self, claim: impl FnOnce() -> R) -> R {
        {
            let mut state = self.wait_drained(self.lock());
            *state = IrqGateState::Free;
        }
        claim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_enter_and_leave() {
        let gate = IrqGate::new();
        {
            let _ticket = gate.enter().unwrap();
            assert_eq!(gate.state(), IrqGateState::InFlight);
        }
        assert_eq!(gate.state(), IrqGateState::Free);
    }

    #[test]
    fn test_disabled_gate_drops_interrupts() {
        let gate = IrqGate::new();
        gate.close(|| {
            assert_eq!(gate.state(), IrqGateState::Disabled);
            assert!(gate.enter().is_none());
        });
        assert_eq!(gate.state(), IrqGateState::Free);
    }

    #[test]
    fn test_close_waits_for_dispatch() {
        let gate = Arc::new(IrqGate::new());
        let (entered_tx, entered_rx) = mpsc::channel();
        let (finish_tx, finish_rx) = mpsc::channel::<()>();

        let irq = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                let _ticket = gate.enter().unwrap();
                entered_tx.send(()).unwrap();
                finish_rx.recv().unwrap();
            })
        };
        entered_rx.recv().unwrap();

        let (closed_tx, closed_rx) = mpsc::channel();
        let closer = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                gate.close(|| closed_tx.send(()).unwrap());
            })
        };

        // The dispatch still holds the slot
        assert!(closed_rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(gate.state(), IrqGateState::InFlight);

        finish_tx.send(()).unwrap();
        closed_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        irq.join().unwrap();
        closer.join().unwrap();
        assert_eq!(gate.state(), IrqGateState::Free);
    }

    #[test]
    fn test_open_keeps_single_dispatch() {
        let gate = Arc::new(IrqGate::new());
        let ticket = gate.enter().unwrap();

        let (opened_tx, opened_rx) = mpsc::channel();
        let opener = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                gate.open(|| opened_tx.send(()).unwrap());
                // The slot is free again, and only one caller gets it
                let second = gate.enter().unwrap();
                assert_eq!(gate.state(), IrqGateState::InFlight);
                drop(second);
            })
        };

        assert!(opened_rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(gate.state(), IrqGateState::InFlight);

        drop(ticket);
        opened_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        opener.join().unwrap();
        assert_eq!(gate.state(), IrqGateState::Free);
    }
}
