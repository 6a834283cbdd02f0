//! Bus configuration chosen when a device is attached

/// Block size negotiated for functions 0 and 1
pub const WILC_SDIO_BLOCK_SIZE: u32 = 512;

/// How the chip signals interrupts to the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum IrqMode {
    /// In-band SDIO interrupt; flags come from the function 1 status register
    #[default]
    Sdio,
    /// Dedicated GPIO pin; flags come from the variant's flag register
    Gpio,
}

impl IrqMode {
    /// Returns true for GPIO-routed interrupts
    pub const fn is_gpio(&self) -> bool {
        matches!(self, Self::Gpio)
    }
}

/// Per-device bus configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    /// Interrupt routing
    pub irq_mode: IrqMode,
    /// Block size to negotiate
    pub block_size: u32,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            irq_mode: IrqMode::Sdio,
            block_size: WILC_SDIO_BLOCK_SIZE,
        }
    }
}

impl BusConfig {
    /// Default configuration with GPIO-routed interrupts
    pub fn gpio() -> Self {
        Self {
            irq_mode: IrqMode::Gpio,
            ..Self::default()
        }
    }
}
