//! Chip variants and their register layouts
//!
//! WILC1000 and WILC3000 share the bus protocol but place the GPIO
//! interrupt flags and the VMM control bits differently.

use core::fmt;

use crate::sdio::regs as sdio_regs;

/// Registers in chip memory, reached through the indirect window
pub mod regs {
    /// Base of the peripheral register block
    pub const PERIPH_REG_BASE: u32 = 0x1000;
    /// Chip identifier
    pub const CHIPID: u32 = PERIPH_REG_BASE;
    /// Pin multiplexer 0
    pub const PIN_MUX_0: u32 = PERIPH_REG_BASE + 0x408;
    /// Miscellaneous control
    pub const MISC: u32 = PERIPH_REG_BASE + 0x428;
    /// Base of the interrupt controller
    pub const INTR_REG_BASE: u32 = PERIPH_REG_BASE + 0xA00;
    /// Interrupt enable, lines 0..=4 at bits 27..=31
    pub const INTR_ENABLE: u32 = INTR_REG_BASE;
    /// Interrupt enable, lines 5..=7 at bits 0..=2
    pub const INTR2_ENABLE: u32 = INTR_REG_BASE + 4;

    /// Routes the interrupt to the GPIO pin
    pub const PIN_MUX_IRQ_GPIO: u32 = 1 << 8;
    /// Power sequencer bit in [`MISC`] (WILC3000)
    pub const MISC_POWER_SEQ: u32 = 1 << 8;
    /// First line bit in [`INTR_ENABLE`]
    pub const INTR_ENABLE_SHIFT: u32 = 27;
    /// First line bit in [`INTR2_ENABLE`]
    pub const INTR2_ENABLE_SHIFT: u32 = 0;
}

/// Lines that fit in [`regs::INTR_ENABLE`]
pub const INTR_ENABLE_LINES: u32 = 5;
/// Lines that fit in [`regs::INTR2_ENABLE`]
pub const INTR2_ENABLE_LINES: u32 = 3;
/// Maximum interrupt lines a host may request
pub const MAX_IRQ_LINES: u32 = INTR_ENABLE_LINES + INTR2_ENABLE_LINES;

const CHIPID_FAMILY_MASK: u32 = 0xFFFF_F000;
const WILC1000_FAMILY: u32 = 0x0010_0000;
const WILC3000_FAMILY: u32 = 0x0030_0000;

/// Where a variant keeps its interrupt and VMM control bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqLayout {
    /// GPIO interrupt flag register (read on function 1)
    pub gpio_flags_reg: u32,
    /// Valid bits in the GPIO flag register
    pub gpio_flags_mask: u8,
    /// Register receiving GPIO interrupt acks (function 0)
    pub gpio_ack_reg: u32,
    /// Register receiving the VMM bits (function 0)
    pub vmm_reg: u32,
    /// Bit selecting VMM table 0
    pub vmm_tbl0: u8,
    /// Bit selecting VMM table 1
    pub vmm_tbl1: u8,
    /// Bit enabling the VMM
    pub vmm_enable: u8,
}

/// Supported chip generations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChipVariant {
    /// WILC1000 (acks and VMM bits share one register)
    Wilc1000,
    /// WILC3000 (separate ack and VMM registers, power sequencer)
    Wilc3000,
}

impl ChipVariant {
    /// Classify a chip identifier
    pub const fn from_chip_id(id: u32) -> Option<Self> {
        match id & CHIPID_FAMILY_MASK {
            WILC1000_FAMILY => Some(Self::Wilc1000),
            WILC3000_FAMILY => Some(Self::Wilc3000),
            _ => None,
        }
    }

    /// A representative identifier for this family
    pub const fn base_chip_id(&self) -> u32 {
        match self {
            Self::Wilc1000 => WILC1000_FAMILY,
            Self::Wilc3000 => WILC3000_FAMILY,
        }
    }

    /// Register layout for interrupt handling
    pub const fn irq_layout(&self) -> IrqLayout {
        match self {
            Self::Wilc1000 => IrqLayout {
                gpio_flags_reg: sdio_regs::WILC1000_IRQ_FLAGS,
                gpio_flags_mask: 0x1F,
                gpio_ack_reg: sdio_regs::WILC1000_VMM_CTL,
                vmm_reg: sdio_regs::WILC1000_VMM_CTL,
                vmm_tbl0: 1 << 5,
                vmm_tbl1: 1 << 6,
                vmm_enable: 1 << 7,
            },
            Self::Wilc3000 => IrqLayout {
                gpio_flags_reg: sdio_regs::WILC3000_IRQ_FLAGS,
                gpio_flags_mask: 0x0F,
                gpio_ack_reg: sdio_regs::WILC3000_IRQ_FLAGS,
                vmm_reg: sdio_regs::WILC3000_VMM_CTL,
                vmm_tbl0: 1 << 0,
                vmm_tbl1: 1 << 1,
                vmm_enable: 1 << 2,
            },
        }
    }

    /// Whether acks and VMM bits go out in a single write
    pub const fn merges_ack_and_vmm(&self) -> bool {
        matches!(self, Self::Wilc1000)
    }

    /// Whether the power sequencer must be disabled before interrupt setup
    pub const fn has_power_sequencer(&self) -> bool {
        matches!(self, Self::Wilc3000)
    }

    /// Short name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Wilc1000 => "WILC1000",
            Self::Wilc3000 => "WILC3000",
        }
    }
}

impl fmt::Display for ChipVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
