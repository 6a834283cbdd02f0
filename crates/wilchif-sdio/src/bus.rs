//! Bus handle and the `HostInterface` implementation

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use wilchif_core::chip::ChipVariant;
use wilchif_core::config::{BusConfig, IrqMode};
use wilchif_core::error::Result;
use wilchif_core::host::{HostInterface, IrqHandler, SdioHost};
use wilchif_core::irq::{ClearFlags, InterruptStatus};

use crate::irq_lock::IrqGate;
use crate::lifecycle::LinkState;

/// Negotiated state of one attached device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusState {
    /// Block size of functions 0 and 1
    pub block_size: u32,
    /// Chip generation, known after the first full init
    pub variant: Option<ChipVariant>,
    /// Interrupt routing
    pub irq_mode: IrqMode,
    /// Interrupt lines requested by the last `sync_interrupts`
    pub irq_lines: Option<u32>,
    /// Lifecycle state
    pub link: LinkState,
}

impl BusState {
    fn new(config: BusConfig) -> Self {
        Self {
            block_size: config.block_size,
            variant: None,
            irq_mode: config.irq_mode,
            irq_lines: None,
            link: LinkState::Uninitialized,
        }
    }
}

/// What happened to a delivered hardware interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqOutcome {
    /// The registered handler ran
    Dispatched,
    /// Interrupts were disabled; nothing ran
    Ignored,
    /// No handler is registered
    Unhandled,
}

/// SDIO host interface for one attached WILC device
///
/// Every bus transaction locks the host for exactly one command, so the
/// interrupt thread and the control path can share a `&SdioBus` freely.
pub struct SdioBus<H> {
    host: Mutex<H>,
    state: Mutex<BusState>,
    gate: IrqGate,
    handler: Mutex<Option<Arc<dyn IrqHandler>>>,
}

impl<H: SdioHost> SdioBus<H> {
    /// Attach to a device behind `host`
    pub fn new(host: H, config: BusConfig) -> Self {
        Self {
            host: Mutex::new(host),
            state: Mutex::new(BusState::new(config)),
            gate: IrqGate::new(),
            handler: Mutex::new(None),
        }
    }

    /// Snapshot of the negotiated state
    pub fn state(&self) -> BusState {
        *self.lock_state()
    }

    /// Chip generation, if identified
    pub fn variant(&self) -> Option<ChipVariant> {
        self.state().variant
    }

    /// Negotiated block size
    pub fn block_size(&self) -> u32 {
        self.state().block_size
    }

    /// Lifecycle state
    pub fn link_state(&self) -> LinkState {
        self.state().link
    }

    /// The interrupt delivery gate
    pub fn irq_gate(&self) -> &IrqGate {
        &self.gate
    }

    /// Run `f` with exclusive access to the host
    ///
    /// The bus is held for the whole closure; do not call back into this
    /// `SdioBus` from inside it.
    pub fn with_host<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        f(&mut self.lock_host())
    }

    /// Detach and return the host
    pub fn into_host(self) -> H {
        self.host
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register the upstream interrupt service routine
    pub fn set_irq_handler(&self, handler: Arc<dyn IrqHandler>) {
        *self.lock_handler() = Some(handler);
    }

    /// Remove the upstream interrupt service routine
    pub fn clear_irq_handler(&self) {
        *self.lock_handler() = None;
    }

    /// Deliver one hardware interrupt
    ///
    /// Called by the platform's interrupt thread. The handler runs without
    /// the bus held, so it may issue its own transactions. It must not
    /// enable or disable interrupts, since both wait for this dispatch.
    pub fn handle_irq(&self) -> IrqOutcome {
        let Some(_ticket) = self.gate.enter() else {
            log::warn!("Interrupt ignored: interrupts are disabled");
            return IrqOutcome::Ignored;
        };

        // Clone out so the handler slot is not held during dispatch
        let handler = self.lock_handler().clone();
        match handler {
            Some(handler) => {
                handler.handle_isr();
                IrqOutcome::Dispatched
            }
            None => {
                log::debug!("Interrupt with no handler registered");
                IrqOutcome::Unhandled
            }
        }
    }

    pub(crate) fn lock_host(&self) -> MutexGuard<'_, H> {
        self.host.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn lock_state(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_handler(&self) -> MutexGuard<'_, Option<Arc<dyn IrqHandler>>> {
        self.handler.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<H: SdioHost> HostInterface for SdioBus<H> {
    fn init(&self, resume: bool) -> Result<()> {
        self.negotiate(resume)
    }

    fn deinit(&self) -> Result<()> {
        self.set_link(LinkState::Uninitialized);
        Ok(())
    }

    fn read_reg(&self, addr: u32) -> Result<u32> {
        self.read_word(addr)
    }

    fn write_reg(&self, addr: u32, data: u32) -> Result<()> {
        self.write_word(addr, data)
    }

    fn block_read(&self, addr: u32, buf: &mut [u8], size: u32) -> Result<()> {
        self.read_block(addr, buf, size)
    }

    fn block_write(&self, addr: u32, buf: &[u8], size: u32) -> Result<()> {
        self.write_block(addr, buf, size)
    }

    fn read_interrupt_status(&self) -> Result<InterruptStatus> {
        self.read_status()
    }

    fn clear_interrupts(&self, mask: ClearFlags) -> Result<()> {
        self.clear(mask)
    }

    fn read_pending_size(&self) -> Result<u16> {
        self.read_size()
    }

    fn sync_interrupts(&self, lines: u32) -> Result<()> {
        self.sync(lines)
    }

    fn enable_interrupts(&self) -> Result<()> {
        self.gate.open(|| self.claim_irq())
    }

    fn disable_interrupts(&self) {
        self.gate.close(|| self.release_irq())
    }

    fn reset(&self) -> Result<()> {
        self.request_reset()
    }

    fn is_initialized(&self) -> bool {
        self.link_state() == LinkState::Ready
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::thread;
    use std::time::Duration;

    use wilchif_dummy::DummySdio;

    use super::*;
    use crate::irq_lock::IrqGateState;

    #[derive(Default)]
    struct CountingHandler {
        calls: AtomicUsize,
    }

    impl IrqHandler for CountingHandler {
        fn handle_isr(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Handler that parks until the test lets it finish
    struct BlockingHandler {
        entered: Mutex<Sender<()>>,
        release: Mutex<Receiver<()>>,
    }

    impl IrqHandler for BlockingHandler {
        fn handle_isr(&self) {
            self.entered.lock().unwrap().send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
        }
    }

    fn bus() -> SdioBus<DummySdio> {
        let bus = SdioBus::new(DummySdio::new_default(), BusConfig::default());
        bus.init(false).unwrap();
        bus
    }

    #[test]
    fn test_dispatch_and_unhandled() {
        let bus = bus();
        assert_eq!(bus.handle_irq(), IrqOutcome::Unhandled);

        let handler = Arc::new(CountingHandler::default());
        bus.set_irq_handler(handler.clone());
        bus.enable_interrupts().unwrap();
        assert!(bus.with_host(|card| card.irq_claimed()));

        assert_eq!(bus.handle_irq(), IrqOutcome::Dispatched);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);

        bus.disable_interrupts();
        assert!(!bus.with_host(|card| card.irq_claimed()));
        assert_eq!(bus.irq_gate().state(), IrqGateState::Free);

        bus.clear_irq_handler();
        assert_eq!(bus.handle_irq(), IrqOutcome::Unhandled);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_may_use_bus() {
        struct StatusReader {
            bus: Arc<SdioBus<DummySdio>>,
            seen: Mutex<Option<u16>>,
        }
        impl IrqHandler for StatusReader {
            fn handle_isr(&self) {
                let status = self.bus.read_interrupt_status().unwrap();
                *self.seen.lock().unwrap() = Some(status.dma_words());
            }
        }

        let bus = Arc::new(bus());
        bus.with_host(|card| card.set_dma_words(0x20));
        let reader = Arc::new(StatusReader {
            bus: Arc::clone(&bus),
            seen: Mutex::new(None),
        });
        bus.set_irq_handler(reader.clone());
        bus.enable_interrupts().unwrap();

        assert_eq!(bus.handle_irq(), IrqOutcome::Dispatched);
        assert_eq!(*reader.seen.lock().unwrap(), Some(0x20));

        // Break the reference cycle
        bus.clear_irq_handler();
    }

    #[test]
    fn test_disable_waits_for_dispatch() {
        let bus = Arc::new(bus());
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        bus.set_irq_handler(Arc::new(BlockingHandler {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        }));
        bus.enable_interrupts().unwrap();

        let irq = {
            let bus = Arc::clone(&bus);
            thread::spawn(move || bus.handle_irq())
        };
        entered_rx.recv().unwrap();

        let (done_tx, done_rx) = mpsc::channel();
        let disabler = {
            let bus = Arc::clone(&bus);
            thread::spawn(move || {
                bus.disable_interrupts();
                done_tx.send(()).unwrap();
            })
        };

        assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(bus.irq_gate().state(), IrqGateState::InFlight);
        assert!(bus.with_host(|card| card.irq_claimed()));

        release_tx.send(()).unwrap();
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(irq.join().unwrap(), IrqOutcome::Dispatched);
        disabler.join().unwrap();

        assert!(!bus.with_host(|card| card.irq_claimed()));
        assert_eq!(bus.irq_gate().state(), IrqGateState::Free);
    }

    #[test]
    fn test_claim_failure_is_reported() {
        struct NoIrqHost(DummySdio);
        impl SdioHost for NoIrqHost {
            fn cmd52(&mut self, cmd: &mut wilchif_core::sdio::Cmd52) -> Result<()> {
                self.0.cmd52(cmd)
            }
            fn cmd53(&mut self, cmd: &mut wilchif_core::sdio::Cmd53<'_>) -> Result<()> {
                self.0.cmd53(cmd)
            }
            fn claim_irq(&mut self) -> Result<()> {
                Err(wilchif_core::Error::TransferFailed)
            }
            fn release_irq(&mut self) -> Result<()> {
                Err(wilchif_core::Error::TransferFailed)
            }
        }

        let bus = SdioBus::new(NoIrqHost(DummySdio::new_default()), BusConfig::default());
        assert_eq!(
            bus.enable_interrupts(),
            Err(wilchif_core::Error::IrqClaimFailed)
        );
        // Release errors are logged only
        bus.disable_interrupts();
        assert_eq!(bus.irq_gate().state(), IrqGateState::Free);
    }
}
