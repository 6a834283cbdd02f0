//! Interrupt status, acknowledge and line routing

use wilchif_core::chip::{regs as chip_regs, ChipVariant, INTR_ENABLE_LINES, MAX_IRQ_LINES};
use wilchif_core::error::{Error, Result};
use wilchif_core::host::SdioHost;
use wilchif_core::irq::{ClearFlags, InterruptStatus, IrqFlags, IRQ_FLAGS_OFFSET, MAX_NUM_INT};
use wilchif_core::sdio::{regs, FUNC0, FUNC1};

use crate::bus::SdioBus;

/// Status-register bit and the flag it reports
const STATUS_REG_MAP: [(u8, IrqFlags); MAX_NUM_INT as usize] = [
    (1 << 0, IrqFlags::INT_0),
    (1 << 2, IrqFlags::INT_1),
    (1 << 3, IrqFlags::INT_2),
    (1 << 4, IrqFlags::INT_3),
    (1 << 5, IrqFlags::INT_4),
];

/// Mask of `count` consecutive bits starting at `shift`
const fn line_bits(count: u32, shift: u32) -> u32 {
    if count == 0 {
        0
    } else {
        (u32::MAX >> (32 - count)) << shift
    }
}

/// Decode the function 1 status register
fn decode_status_reg(data: u8) -> IrqFlags {
    STATUS_REG_MAP
        .iter()
        .filter(|(bit, _)| data & bit != 0)
        .fold(IrqFlags::empty(), |flags, (_, flag)| flags | *flag)
}

impl<H: SdioHost> SdioBus<H> {
    fn require_variant(&self) -> Result<ChipVariant> {
        self.variant().ok_or_else(|| {
            log::error!("Chip variant unknown, bus was never initialized");
            Error::NotInitialized
        })
    }

    /// Pending DMA transfer size in words
    pub(crate) fn read_size(&self) -> Result<u16> {
        let lo = self.read_byte(FUNC0, regs::DMA_COUNT_LO)?;
        let hi = self.read_byte(FUNC0, regs::DMA_COUNT_HI)?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    pub(crate) fn read_status(&self) -> Result<InterruptStatus> {
        let state = self.state();
        let mut status = InterruptStatus::new(self.read_size()?, IrqFlags::empty());

        if state.irq_mode.is_gpio() {
            let layout = self.require_variant()?.irq_layout();
            let flags = self.read_byte(FUNC1, layout.gpio_flags_reg)? & layout.gpio_flags_mask;
            status.insert(IrqFlags::from_bits_truncate(
                u32::from(flags) << IRQ_FLAGS_OFFSET,
            ));
        } else {
            let data = self.read_byte(FUNC1, regs::FUNC1_INT_STATUS)?;
            status.insert(decode_status_reg(data));

            let lines = state.irq_lines.unwrap_or(0);
            if (lines..MAX_NUM_INT).any(|line| status.has_line(line)) {
                log::warn!(
                    "Unexpected interrupt: status=0x{:08x}, data=0x{:02x}",
                    status.raw(),
                    data
                );
            }
        }

        Ok(status)
    }

    pub(crate) fn clear(&self, mask: ClearFlags) -> Result<()> {
        let variant = self.require_variant()?;
        let layout = variant.irq_layout();
        let gpio = self.state().irq_mode.is_gpio();

        let ack = if gpio { mask.gpio_ack_bits() } else { 0 };
        let mut vmm = 0u8;
        if mask.contains(ClearFlags::SEL_VMM_TBL0) {
            vmm |= layout.vmm_tbl0;
        }
        if mask.contains(ClearFlags::SEL_VMM_TBL1) {
            vmm |= layout.vmm_tbl1;
        }
        if mask.contains(ClearFlags::EN_VMM) {
            vmm |= layout.vmm_enable;
        }

        // The VMM register also takes the acks on both variants
        if !variant.merges_ack_and_vmm() {
            self.write_if_set(layout.gpio_ack_reg, ack)?;
        }
        self.write_if_set(layout.vmm_reg, ack | vmm)
    }

    fn write_if_set(&self, reg: u32, value: u8) -> Result<()> {
        if value == 0 {
            return Ok(());
        }
        self.write_byte(FUNC0, reg, value).inspect_err(|_| {
            log::error!("Failed to write 0x{:02x} to register 0x{:02x}", value, reg);
        })
    }

    fn update_reg(&self, addr: u32, f: impl FnOnce(u32) -> u32) -> Result<()> {
        let value = self.read_word(addr).inspect_err(|_| {
            log::error!("Failed to read register 0x{:08x}", addr);
        })?;
        self.write_word(addr, f(value))
    }

    pub(crate) fn sync(&self, lines: u32) -> Result<()> {
        if lines > MAX_IRQ_LINES {
            log::error!("Too many interrupts: {}", lines);
            return Err(Error::TooManyInterrupts {
                requested: lines,
                max: MAX_IRQ_LINES,
            });
        }
        let variant = self.require_variant()?;

        let gpio = {
            let mut state = self.lock_state();
            state.irq_lines = Some(lines);
            state.irq_mode.is_gpio()
        };

        if variant.has_power_sequencer() {
            self.update_reg(chip_regs::MISC, |reg| reg & !chip_regs::MISC_POWER_SEQ)?;
        }

        if !gpio {
            return Ok(());
        }

        self.update_reg(chip_regs::PIN_MUX_0, |reg| reg | chip_regs::PIN_MUX_IRQ_GPIO)?;

        let first = lines.min(INTR_ENABLE_LINES);
        self.update_reg(chip_regs::INTR_ENABLE, |reg| {
            reg | line_bits(first, chip_regs::INTR_ENABLE_SHIFT)
        })?;

        let rest = lines - first;
        if rest > 0 {
            self.update_reg(chip_regs::INTR2_ENABLE, |reg| {
                reg | line_bits(rest, chip_regs::INTR2_ENABLE_SHIFT)
            })?;
        }

        log::debug!("Routed {} interrupt lines on {}", lines, variant);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use wilchif_core::config::BusConfig;
    use wilchif_core::host::HostInterface;
    use wilchif_core::sdio::Direction;
    use wilchif_dummy::{DummyConfig, DummySdio, Transaction};

    use super::*;

    fn ready_bus(variant: ChipVariant, config: BusConfig) -> SdioBus<DummySdio> {
        let bus = SdioBus::new(DummySdio::new(DummyConfig::for_variant(variant)), config);
        bus.init(false).unwrap();
        bus.with_host(|card| card.take_trace());
        bus
    }

    fn writes(trace: &[Transaction]) -> Vec<(u32, u8)> {
        trace
            .iter()
            .filter_map(|t| match t {
                Transaction::Cmd52 {
                    function: 0,
                    direction: Direction::Write,
                    address,
                    data,
                    ..
                } => Some((*address, *data)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_line_bits() {
        assert_eq!(line_bits(0, 27), 0);
        assert_eq!(line_bits(5, 27), 0xF800_0000);
        assert_eq!(line_bits(2, 0), 0b11);
    }

    #[test]
    fn test_pending_size_only() {
        let bus = ready_bus(ChipVariant::Wilc1000, BusConfig::gpio());
        bus.with_host(|card| card.set_dma_words(0x0010));

        let status = bus.read_interrupt_status().unwrap();
        assert_eq!(status.dma_words(), 0x0010);
        assert!(status.flags().is_empty());
        assert_eq!(status.raw(), 0x0010);
        assert_eq!(bus.read_pending_size().unwrap(), 0x0010);
    }

    #[test]
    fn test_gpio_flags_per_variant() {
        let bus = ready_bus(ChipVariant::Wilc1000, BusConfig::gpio());
        bus.with_host(|card| card.raise_lines(0b1_0001));
        let status = bus.read_interrupt_status().unwrap();
        assert_eq!(status.flags(), IrqFlags::INT_0 | IrqFlags::INT_4);

        // WILC3000 only reports four GPIO lines
        let bus = ready_bus(ChipVariant::Wilc3000, BusConfig::gpio());
        bus.with_host(|card| card.set_func1_reg(regs::WILC3000_IRQ_FLAGS, 0xFF));
        let status = bus.read_interrupt_status().unwrap();
        assert_eq!(
            status.flags(),
            IrqFlags::INT_0 | IrqFlags::INT_1 | IrqFlags::INT_2 | IrqFlags::INT_3
        );
    }

    #[test]
    fn test_status_register_decode() {
        let bus = ready_bus(ChipVariant::Wilc1000, BusConfig::default());
        bus.sync_interrupts(2).unwrap();
        bus.with_host(|card| {
            card.set_dma_words(3);
            // Bit 1 is unused; bit 5 is line 4, beyond the synced lines
            card.set_func1_reg(regs::FUNC1_INT_STATUS, 0b10_0111);
        });

        let status = bus.read_interrupt_status().unwrap();
        assert_eq!(status.dma_words(), 3);
        assert_eq!(
            status.flags(),
            IrqFlags::INT_0 | IrqFlags::INT_1 | IrqFlags::INT_4
        );
    }

    #[test]
    fn test_clear_nothing_writes_nothing() {
        for variant in [ChipVariant::Wilc1000, ChipVariant::Wilc3000] {
            let bus = ready_bus(variant, BusConfig::gpio());
            bus.clear_interrupts(ClearFlags::empty()).unwrap();
            assert!(bus.with_host(|card| card.trace().is_empty()));
        }
    }

    #[test]
    fn test_clear_wilc1000_merges() {
        let bus = ready_bus(ChipVariant::Wilc1000, BusConfig::gpio());
        let mask = ClearFlags::CLR_INT0 | ClearFlags::CLR_INT2 | ClearFlags::ENABLE_RX_VMM;
        bus.clear_interrupts(mask).unwrap();
        let trace = bus.with_host(|card| card.take_trace());
        assert_eq!(writes(&trace), vec![(0xF8, 0b1100_0101)]);

        // Acks are dropped outside GPIO mode
        let bus = ready_bus(ChipVariant::Wilc1000, BusConfig::default());
        bus.clear_interrupts(ClearFlags::CLR_INT0 | ClearFlags::SEL_VMM_TBL0)
            .unwrap();
        let trace = bus.with_host(|card| card.take_trace());
        assert_eq!(writes(&trace), vec![(0xF8, 0b0010_0000)]);
    }

    #[test]
    fn test_clear_wilc3000_splits() {
        let bus = ready_bus(ChipVariant::Wilc3000, BusConfig::gpio());
        bus.clear_interrupts(ClearFlags::CLR_INT1 | ClearFlags::ENABLE_TX_VMM)
            .unwrap();
        let trace = bus.with_host(|card| card.take_trace());
        assert_eq!(writes(&trace), vec![(0xFE, 0b10), (0xF1, 0b111)]);

        bus.clear_interrupts(ClearFlags::CLR_INT0 | ClearFlags::SEL_VMM_TBL1)
            .unwrap();
        let trace = bus.with_host(|card| card.take_trace());
        assert_eq!(writes(&trace), vec![(0xFE, 0x01), (0xF1, 0x03)]);

        // Acks alone still reach the VMM register
        bus.clear_interrupts(ClearFlags::CLR_INT3).unwrap();
        let trace = bus.with_host(|card| card.take_trace());
        assert_eq!(writes(&trace), vec![(0xFE, 0b1000), (0xF1, 0b1000)]);

        // Outside GPIO mode only the VMM bits are written
        let bus = ready_bus(ChipVariant::Wilc3000, BusConfig::default());
        bus.clear_interrupts(ClearFlags::CLR_INT0 | ClearFlags::EN_VMM)
            .unwrap();
        let trace = bus.with_host(|card| card.take_trace());
        assert_eq!(writes(&trace), vec![(0xF1, 0b100)]);
    }

    #[test]
    fn test_clear_requires_variant() {
        let bus = SdioBus::new(DummySdio::new_default(), BusConfig::default());
        assert_eq!(
            bus.clear_interrupts(ClearFlags::EN_VMM),
            Err(Error::NotInitialized)
        );
    }

    #[test]
    fn test_sync_seven_lines_gpio() {
        let bus = ready_bus(ChipVariant::Wilc1000, BusConfig::gpio());
        bus.sync_interrupts(7).unwrap();

        let (pin_mux, enable, enable2) = bus.with_host(|card| {
            (
                card.read_word(chip_regs::PIN_MUX_0),
                card.read_word(chip_regs::INTR_ENABLE),
                card.read_word(chip_regs::INTR2_ENABLE),
            )
        });
        assert_eq!(pin_mux, 1 << 8);
        assert_eq!(enable, 0b11111 << 27);
        assert_eq!(enable2, 0b11);
        assert_eq!(bus.state().irq_lines, Some(7));
    }

    #[test]
    fn test_sync_preserves_other_bits() {
        let bus = ready_bus(ChipVariant::Wilc3000, BusConfig::gpio());
        bus.with_host(|card| {
            card.write_word(chip_regs::MISC, 0x0000_0301);
            card.write_word(chip_regs::INTR_ENABLE, 0x0000_00FF);
            card.write_word(chip_regs::INTR2_ENABLE, 0x1234_0000);
        });
        bus.sync_interrupts(3).unwrap();

        bus.with_host(|card| {
            assert_eq!(card.read_word(chip_regs::MISC), 0x0000_0201);
            assert_eq!(card.read_word(chip_regs::INTR_ENABLE), 0x3800_00FF);
            assert_eq!(card.read_word(chip_regs::INTR2_ENABLE), 0x1234_0000);
        });
    }

    #[test]
    fn test_sync_sdio_mode_skips_routing() {
        let bus = ready_bus(ChipVariant::Wilc1000, BusConfig::default());
        bus.sync_interrupts(5).unwrap();
        assert!(bus.with_host(|card| card.trace().is_empty()));
    }

    #[test]
    fn test_sync_rejects_too_many_lines() {
        let bus = ready_bus(ChipVariant::Wilc1000, BusConfig::gpio());
        assert_eq!(
            bus.sync_interrupts(9),
            Err(Error::TooManyInterrupts {
                requested: 9,
                max: 8
            })
        );
        assert!(bus.with_host(|card| card.trace().is_empty()));
        assert_eq!(bus.state().irq_lines, None);
    }
}
