//! Interrupt status and acknowledge words

use bitflags::bitflags;

/// Bit offset of the interrupt flags in a status word
pub const IRQ_FLAGS_OFFSET: u32 = 16;
/// Mask of the pending DMA word count in a status word
pub const IRQ_DMA_WD_CNT_MASK: u32 = (1 << IRQ_FLAGS_OFFSET) - 1;
/// Number of sticky interrupt flags
pub const MAX_NUM_INT: u32 = 5;

bitflags! {
    /// Sticky interrupt flags carried above the DMA count
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct IrqFlags: u32 {
        /// Interrupt line 0 (data)
        const INT_0 = 1 << IRQ_FLAGS_OFFSET;
        /// Interrupt line 1
        const INT_1 = 1 << (IRQ_FLAGS_OFFSET + 1);
        /// Interrupt line 2
        const INT_2 = 1 << (IRQ_FLAGS_OFFSET + 2);
        /// Interrupt line 3
        const INT_3 = 1 << (IRQ_FLAGS_OFFSET + 3);
        /// Interrupt line 4
        const INT_4 = 1 << (IRQ_FLAGS_OFFSET + 4);

        /// Data interrupt
        const DATA = Self::INT_0.bits();
    }
}

bitflags! {
    /// Acknowledge and VMM control request passed to `clear_interrupts`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        /// Acknowledge line 0
        const CLR_INT0 = 1 << 0;
        /// Acknowledge line 1
        const CLR_INT1 = 1 << 1;
        /// Acknowledge line 2
        const CLR_INT2 = 1 << 2;
        /// Acknowledge line 3
        const CLR_INT3 = 1 << 3;
        /// Acknowledge line 4
        const CLR_INT4 = 1 << 4;
        /// Acknowledge line 5
        const CLR_INT5 = 1 << 5;
        /// Select VMM table 0
        const SEL_VMM_TBL0 = 1 << 6;
        /// Select VMM table 1
        const SEL_VMM_TBL1 = 1 << 7;
        /// Enable the VMM
        const EN_VMM = 1 << 8;

        /// Acknowledge the data interrupt
        const DATA_INT_CLR = Self::CLR_INT0.bits();
        /// Hand the RX table to the VMM
        const ENABLE_RX_VMM = Self::SEL_VMM_TBL1.bits() | Self::EN_VMM.bits();
        /// Hand the TX table to the VMM
        const ENABLE_TX_VMM = Self::SEL_VMM_TBL0.bits() | Self::EN_VMM.bits();
    }
}

impl ClearFlags {
    /// Acknowledge bits for the GPIO-routed lines
    pub const fn gpio_ack_bits(&self) -> u8 {
        (self.bits() & ((1 << MAX_NUM_INT) - 1)) as u8
    }
}

/// Decoded interrupt status: pending DMA words plus sticky flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct InterruptStatus(u32);

impl InterruptStatus {
    /// Build a status word from its parts
    pub const fn new(dma_words: u16, flags: IrqFlags) -> Self {
        Self(dma_words as u32 | flags.bits())
    }

    /// Wrap a raw status word
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw status word as the WLAN layer expects it
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// Pending DMA transfer size in 32-bit words
    pub const fn dma_words(&self) -> u16 {
        (self.0 & IRQ_DMA_WD_CNT_MASK) as u16
    }

    /// Sticky interrupt flags
    pub const fn flags(&self) -> IrqFlags {
        IrqFlags::from_bits_truncate(self.0)
    }

    /// Returns true if interrupt line `line` is flagged
    pub const fn has_line(&self, line: u32) -> bool {
        line < MAX_NUM_INT && (self.0 >> (IRQ_FLAGS_OFFSET + line)) & 1 != 0
    }

    /// Merge flags into the word
    pub fn insert(&mut self, flags: IrqFlags) {
        self.0 |= flags.bits();
    }
}
