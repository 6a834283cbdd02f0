//! Bus negotiation, reset and power transitions

use wilchif_core::chip::{regs as chip_regs, ChipVariant};
use wilchif_core::error::{Error, Result};
use wilchif_core::host::{PowerHandshake, SdioHost};
use wilchif_core::sdio::{regs, FUNC0};

use crate::bus::SdioBus;

/// IOR reads before function 1 is declared dead
const IO_READY_ATTEMPTS: u32 = 3;

/// Lifecycle of the bus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LinkState {
    /// Not negotiated, or deinitialized/reset since
    #[default]
    Uninitialized,
    /// Negotiation in progress
    Negotiating,
    /// Negotiated; transfers may run
    Ready,
    /// The last negotiation failed
    Failed,
}

/// Call `attempt` until it returns `true`, at most `attempts` times
///
/// Errors from `attempt` end the loop immediately.
fn retry_bounded(attempts: u32, mut attempt: impl FnMut() -> Result<bool>) -> Result<bool> {
    for _ in 0..attempts {
        if attempt()? {
            return Ok(true);
        }
    }
    Ok(false)
}

impl<H: SdioHost> SdioBus<H> {
    pub(crate) fn set_link(&self, link: LinkState) {
        self.lock_state().link = link;
    }

    fn set_block_size(&self, lo_reg: u32, hi_reg: u32, size: u32) -> Result<()> {
        let [lo, hi, ..] = size.to_le_bytes();
        self.write_byte(FUNC0, lo_reg, lo)?;
        self.write_byte(FUNC0, hi_reg, hi)
    }

    fn identify_chip(&self) -> Result<ChipVariant> {
        let chip_id = self.read_word(chip_regs::CHIPID).inspect_err(|_| {
            log::error!("Failed to read chip id");
        })?;
        let variant = ChipVariant::from_chip_id(chip_id).ok_or_else(|| {
            log::error!("Unsupported chip id: 0x{:08x}", chip_id);
            Error::UnsupportedChip(chip_id)
        })?;
        log::info!("Chip id 0x{:08x} ({})", chip_id, variant);
        Ok(variant)
    }

    fn run_negotiation(&self, resume: bool) -> Result<Option<ChipVariant>> {
        let block_size = self.block_size();

        self.write_byte_raw(FUNC0, regs::CSA_CONTROL, regs::CSA_ENABLE)
            .inspect_err(|_| log::error!("Failed to enable indirect window"))?;

        self.set_block_size(regs::FUNC0_BLOCK_SIZE_LO, regs::FUNC0_BLOCK_SIZE_HI, block_size)
            .inspect_err(|_| log::error!("Failed to set function 0 block size"))?;

        self.write_byte_raw(FUNC0, regs::CCCR_IO_ENABLE, regs::IO_FUNC1)
            .inspect_err(|_| log::error!("Failed to set IOE register"))?;

        let ready = retry_bounded(IO_READY_ATTEMPTS, || {
            let ior = self
                .read_byte(FUNC0, regs::CCCR_IO_READY)
                .inspect_err(|_| log::error!("Failed to read IOR register"))?;
            Ok(ior == regs::IO_FUNC1)
        })?;
        if !ready {
            log::error!("Function 1 is not ready");
            return Err(Error::FunctionNotReady);
        }

        self.set_block_size(regs::FUNC1_BLOCK_SIZE_LO, regs::FUNC1_BLOCK_SIZE_HI, block_size)
            .inspect_err(|_| log::error!("Failed to set function 1 block size"))?;

        self.write_byte_raw(FUNC0, regs::CCCR_INT_ENABLE, regs::INT_ENABLE_FUNC1)
            .inspect_err(|_| log::error!("Failed to set IEN register"))?;

        if resume {
            Ok(None)
        } else {
            self.identify_chip().map(Some)
        }
    }

    /// Negotiate the bus; `resume` keeps the variant found earlier
    pub(crate) fn negotiate(&self, resume: bool) -> Result<()> {
        if resume && self.variant().is_none() {
            log::error!("Cannot resume: chip was never identified");
            return Err(Error::NotInitialized);
        }

        if let Some(hz) = self.with_host(|host| host.clock_hz()) {
            log::info!("SDIO speed: {} Hz", hz);
        }

        self.set_link(LinkState::Negotiating);
        match self.run_negotiation(resume) {
            Ok(variant) => {
                let mut state = self.lock_state();
                if let Some(variant) = variant {
                    state.variant = Some(variant);
                }
                state.link = LinkState::Ready;
                log::debug!("Bus ready, block size {}", state.block_size);
                Ok(())
            }
            Err(e) => {
                self.set_link(LinkState::Failed);
                Err(e)
            }
        }
    }

    /// Ask the card to reset itself
    pub(crate) fn request_reset(&self) -> Result<()> {
        log::info!("Resetting SDIO device");
        let result = self
            .write_byte_raw(FUNC0, regs::CCCR_IO_ABORT, regs::RESET_REQUEST)
            .map(|_| ());
        if result.is_err() {
            log::error!("Failed to send reset request");
        }
        self.set_link(LinkState::Uninitialized);
        result
    }

    /// Prepare the device for a host low-power transition
    ///
    /// The negotiated block size, variant and interrupt lines are kept for
    /// [`resume`](Self::resume). A failed reset is logged only.
    pub fn suspend(&self, pm: &dyn PowerHandshake) {
        log::info!("SDIO suspend");
        pm.chip_wakeup();
        pm.host_sleep_notify();
        pm.chip_allow_sleep();

        if let Err(e) = self.request_reset() {
            log::warn!("Reset during suspend failed: {}", e);
        }
    }

    /// Renegotiate after a low-power transition
    ///
    /// Chip identification is skipped and the interrupt lines routed before
    /// suspend are routed again. The host is told it is awake even when
    /// renegotiation fails.
    pub fn resume(&self, pm: &dyn PowerHandshake) -> Result<()> {
        log::info!("SDIO resume");
        pm.chip_wakeup();

        let result = self.negotiate(true).and_then(|()| {
            match self.state().irq_lines {
                Some(lines) => self.sync(lines),
                None => Ok(()),
            }
        });

        if let Err(e) = &result {
            log::error!("Renegotiation after resume failed: {}", e);
        }
        pm.host_wakeup_notify();
        pm.chip_allow_sleep();
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use wilchif_core::config::BusConfig;
    use wilchif_core::host::{HostInterface, NoPowerHandshake};
    use wilchif_core::sdio::Direction;
    use wilchif_dummy::{DummyConfig, DummySdio, Transaction};

    use super::*;

    fn bus_with(config: DummyConfig, bus: BusConfig) -> SdioBus<DummySdio> {
        SdioBus::new(DummySdio::new(config), bus)
    }

    #[derive(Default)]
    struct RecordingPm {
        calls: Mutex<Vec<&'static str>>,
    }

    impl RecordingPm {
        fn push(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PowerHandshake for RecordingPm {
        fn chip_wakeup(&self) {
            self.push("chip_wakeup");
        }
        fn chip_allow_sleep(&self) {
            self.push("chip_allow_sleep");
        }
        fn host_sleep_notify(&self) {
            self.push("host_sleep_notify");
        }
        fn host_wakeup_notify(&self) {
            self.push("host_wakeup_notify");
        }
    }

    #[test]
    fn test_retry_bounded() {
        let mut calls = 0;
        assert_eq!(
            retry_bounded(3, || {
                calls += 1;
                Ok(calls == 2)
            }),
            Ok(true)
        );
        assert_eq!(calls, 2);

        let mut calls = 0;
        assert_eq!(
            retry_bounded(3, || {
                calls += 1;
                Ok(false)
            }),
            Ok(false)
        );
        assert_eq!(calls, 3);

        assert_eq!(
            retry_bounded(3, || Err(Error::TransferFailed)),
            Err(Error::TransferFailed)
        );
    }

    #[test]
    fn test_init_wilc1000() {
        let bus = bus_with(
            DummyConfig::for_variant(ChipVariant::Wilc1000),
            BusConfig::default(),
        );
        assert!(!bus.is_initialized());
        bus.init(false).unwrap();

        assert!(bus.is_initialized());
        assert_eq!(bus.variant(), Some(ChipVariant::Wilc1000));
        assert_eq!(bus.block_size(), 512);

        bus.with_host(|card| {
            assert_eq!(card.func0_reg(regs::CSA_CONTROL), 0x80);
            assert_eq!(card.func0_reg(regs::FUNC0_BLOCK_SIZE_LO), 0x00);
            assert_eq!(card.func0_reg(regs::FUNC0_BLOCK_SIZE_HI), 0x02);
            assert_eq!(card.func0_reg(regs::FUNC1_BLOCK_SIZE_LO), 0x00);
            assert_eq!(card.func0_reg(regs::FUNC1_BLOCK_SIZE_HI), 0x02);
            assert_eq!(card.func0_reg(regs::CCCR_IO_ENABLE), 0x02);
            assert_eq!(card.func0_reg(regs::CCCR_INT_ENABLE), 0x03);
        });
    }

    #[test]
    fn test_init_unknown_chip() {
        let bus = bus_with(
            DummyConfig {
                chip_id: 0x0020_0000,
                ..DummyConfig::default()
            },
            BusConfig::default(),
        );
        assert_eq!(bus.init(false), Err(Error::UnsupportedChip(0x0020_0000)));
        assert!(!bus.is_initialized());
        assert_eq!(bus.link_state(), LinkState::Failed);
        assert_eq!(bus.variant(), None);
    }

    #[test]
    fn test_init_waits_for_function_ready() {
        let bus = bus_with(
            DummyConfig {
                ready_polls: 2,
                ..DummyConfig::default()
            },
            BusConfig::default(),
        );
        bus.init(false).unwrap();

        let bus = bus_with(
            DummyConfig {
                ready_polls: 3,
                ..DummyConfig::default()
            },
            BusConfig::default(),
        );
        assert_eq!(bus.init(false), Err(Error::FunctionNotReady));
        assert!(!bus.is_initialized());

        let ior_reads = bus.with_host(|card| {
            card.trace()
                .iter()
                .filter(|t| {
                    matches!(
                        t,
                        Transaction::Cmd52 {
                            address: 0x03,
                            direction: Direction::Read,
                            ..
                        }
                    )
                })
                .count()
        });
        assert_eq!(ior_reads, 3);
    }

    #[test]
    fn test_init_transport_failure() {
        let bus = bus_with(DummyConfig::default(), BusConfig::default());
        bus.with_host(|card| card.fail_after(2));
        assert_eq!(bus.init(false), Err(Error::TransferFailed));
        assert_eq!(bus.link_state(), LinkState::Failed);
    }

    #[test]
    fn test_deinit_and_reset() {
        let bus = bus_with(DummyConfig::default(), BusConfig::default());
        bus.init(false).unwrap();
        bus.deinit().unwrap();
        assert!(!bus.is_initialized());
        assert_eq!(bus.variant(), Some(ChipVariant::Wilc1000));

        bus.init(false).unwrap();
        bus.with_host(|card| card.take_trace());
        bus.reset().unwrap();
        assert!(!bus.is_initialized());

        let trace = bus.with_host(|card| card.take_trace());
        assert_eq!(trace.len(), 1);
        assert!(matches!(
            trace[0],
            Transaction::Cmd52 {
                function: 0,
                address: 0x06,
                direction: Direction::Write,
                raw: true,
                ..
            }
        ));
    }

    #[test]
    fn test_resume_requires_identified_chip() {
        let bus = bus_with(DummyConfig::default(), BusConfig::default());
        let pm = RecordingPm::default();
        assert_eq!(bus.resume(&pm), Err(Error::NotInitialized));
        assert_eq!(
            pm.calls(),
            vec!["chip_wakeup", "host_wakeup_notify", "chip_allow_sleep"]
        );
        assert!(bus.with_host(|card| card.trace().is_empty()));
    }

    #[test]
    fn test_suspend_resume_keeps_configuration() {
        let bus = bus_with(
            DummyConfig::for_variant(ChipVariant::Wilc3000),
            BusConfig::gpio(),
        );
        bus.init(false).unwrap();
        bus.sync_interrupts(6).unwrap();

        let pm = RecordingPm::default();
        bus.suspend(&pm);
        assert_eq!(
            pm.calls(),
            vec!["chip_wakeup", "host_sleep_notify", "chip_allow_sleep"]
        );
        assert!(!bus.is_initialized());

        // Power loss wipes the routing
        bus.with_host(|card| {
            card.write_word(chip_regs::INTR_ENABLE, 0);
            card.write_word(chip_regs::INTR2_ENABLE, 0);
            card.write_word(chip_regs::CHIPID, 0);
            card.take_trace();
        });

        let pm = RecordingPm::default();
        bus.resume(&pm).unwrap();
        assert_eq!(
            pm.calls(),
            vec!["chip_wakeup", "host_wakeup_notify", "chip_allow_sleep"]
        );
        assert!(bus.is_initialized());
        assert_eq!(bus.variant(), Some(ChipVariant::Wilc3000));
        assert_eq!(bus.state().irq_lines, Some(6));

        bus.with_host(|card| {
            assert_eq!(card.read_word(chip_regs::INTR_ENABLE), 0b11111 << 27);
            assert_eq!(card.read_word(chip_regs::INTR2_ENABLE), 0b1);
        });
    }

    #[test]
    fn test_resume_without_synced_lines() {
        let bus = bus_with(DummyConfig::default(), BusConfig::default());
        bus.init(false).unwrap();

        bus.suspend(&NoPowerHandshake);
        bus.resume(&NoPowerHandshake).unwrap();
        assert!(bus.is_initialized());
        assert_eq!(bus.state().irq_lines, None);
    }

    #[test]
    fn test_failed_resume_still_wakes_host() {
        let bus = bus_with(DummyConfig::default(), BusConfig::default());
        bus.init(false).unwrap();
        bus.suspend(&NoPowerHandshake);

        bus.with_host(|card| card.fail_after(0));
        let pm = RecordingPm::default();
        assert_eq!(bus.resume(&pm), Err(Error::TransferFailed));
        assert_eq!(
            pm.calls(),
            vec!["chip_wakeup", "host_wakeup_notify", "chip_allow_sleep"]
        );
        assert_eq!(bus.link_state(), LinkState::Failed);
    }
}
