//! Emulated WILC card

use std::collections::{HashMap, VecDeque};

use wilchif_core::chip::{regs as mem_regs, ChipVariant};
use wilchif_core::error::{Error, Result as CoreResult};
use wilchif_core::host::SdioHost;
use wilchif_core::sdio::{regs, Cmd52, Cmd53, Cmd53Data, Direction, FUNC0, FUNC1};

use crate::error::{DummyError, Result};

/// Status-register bit for each interrupt line (line 0 skips bit 1)
const STATUS_REG_BITS: [u8; 5] = [1 << 0, 1 << 2, 1 << 3, 1 << 4, 1 << 5];

/// Configuration for the emulated card
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Value of the CHIPID register
    pub chip_id: u32,
    /// IOR reads that report "not ready" after function 1 is enabled
    pub ready_polls: u8,
    /// Reported bus clock
    pub clock_hz: u32,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            chip_id: 0x0010_03A0, // WILC1000 rev A0
            ready_polls: 0,
            clock_hz: 50_000_000,
        }
    }
}

impl DummyConfig {
    /// Configuration reporting the base identifier of `variant`
    pub fn for_variant(variant: ChipVariant) -> Self {
        Self {
            chip_id: variant.base_chip_id() | 0x3A0,
            ..Self::default()
        }
    }
}

/// One recorded bus transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    /// Single-byte access
    Cmd52 {
        /// Function number
        function: u8,
        /// Register address
        address: u32,
        /// Read or write
        direction: Direction,
        /// Read-after-write
        raw: bool,
        /// Byte written, or byte returned
        data: u8,
    },
    /// Block or byte-count access
    Cmd53 {
        /// Function number
        function: u8,
        /// Port address
        address: u32,
        /// Read or write
        direction: Direction,
        /// Count is in blocks
        block_mode: bool,
        /// Blocks or bytes
        count: u16,
        /// Bytes moved
        len: usize,
        /// Indirect window at the time of the transfer
        window: u32,
    },
}

/// Emulated WILC card behind an SDIO host
pub struct DummySdio {
    config: DummyConfig,
    /// Function 0 registers (CCCR, FBR, direct registers)
    func0: HashMap<u32, u8>,
    /// Function 1 single-byte registers
    func1: HashMap<u32, u8>,
    /// Chip address space reached through the window
    memory: HashMap<u32, u8>,
    /// Function 1 data port
    fifo: VecDeque<u8>,
    ior_reads: u8,
    irq_claimed: bool,
    trace: Vec<Transaction>,
    executed: usize,
    fail_from: Option<usize>,
}

impl DummySdio {
    /// Create a card with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let mut card = Self {
            config,
            func0: HashMap::new(),
            func1: HashMap::new(),
            memory: HashMap::new(),
            fifo: VecDeque::new(),
            ior_reads: 0,
            irq_claimed: false,
            trace: Vec::new(),
            executed: 0,
            fail_from: None,
        };
        card.write_word(mem_regs::CHIPID, card.config.chip_id);
        card
    }

    /// Create a WILC1000 card
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Transactions executed so far
    pub fn trace(&self) -> &[Transaction] {
        &self.trace
    }

    /// Return and clear the trace
    pub fn take_trace(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.trace)
    }

    /// Let `n` more transactions succeed, then fail every following one
    pub fn fail_after(&mut self, n: usize) {
        self.fail_from = Some(self.executed + n);
    }

    /// Stop injecting failures
    pub fn clear_failure(&mut self) {
        self.fail_from = None;
    }

    /// Whether the interrupt callback is registered
    pub fn irq_claimed(&self) -> bool {
        self.irq_claimed
    }

    /// Read a little-endian word of chip memory
    pub fn read_word(&self, addr: u32) -> u32 {
        let mut bytes = [0u8; 4];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = self.mem_byte(addr.wrapping_add(i as u32));
        }
        u32::from_le_bytes(bytes)
    }

    /// Write a little-endian word of chip memory
    pub fn write_word(&mut self, addr: u32, value: u32) {
        for (i, b) in value.to_le_bytes().into_iter().enumerate() {
            self.memory.insert(addr.wrapping_add(i as u32), b);
        }
    }

    /// Copy `len` bytes of chip memory starting at `addr`
    pub fn memory_bytes(&self, addr: u32, len: usize) -> Vec<u8> {
        (0..len)
            .map(|i| self.mem_byte(addr.wrapping_add(i as u32)))
            .collect()
    }

    /// Read a function 0 register
    pub fn func0_reg(&self, addr: u32) -> u8 {
        self.func0.get(&addr).copied().unwrap_or(0)
    }

    /// Read a function 1 register
    pub fn func1_reg(&self, addr: u32) -> u8 {
        self.func1.get(&addr).copied().unwrap_or(0)
    }

    /// Set a function 1 register
    pub fn set_func1_reg(&mut self, addr: u32, value: u8) {
        self.func1.insert(addr, value);
    }

    /// Set the pending DMA size reported at 0xF2/0xF3
    pub fn set_dma_words(&mut self, words: u16) {
        let [lo, hi] = words.to_le_bytes();
        self.func0.insert(regs::DMA_COUNT_LO, lo);
        self.func0.insert(regs::DMA_COUNT_HI, hi);
    }

    /// Raise interrupt lines in both the GPIO flag register of this chip
    /// and the function 1 status register
    pub fn raise_lines(&mut self, lines: u8) {
        if let Some(variant) = ChipVariant::from_chip_id(self.config.chip_id) {
            let layout = variant.irq_layout();
            let flags = self.func1_reg(layout.gpio_flags_reg) | (lines & layout.gpio_flags_mask);
            self.set_func1_reg(layout.gpio_flags_reg, flags);
        }
        let mut status = self.func1_reg(regs::FUNC1_INT_STATUS);
        for (line, bit) in STATUS_REG_BITS.iter().enumerate() {
            if lines & (1 << line) != 0 {
                status |= bit;
            }
        }
        self.set_func1_reg(regs::FUNC1_INT_STATUS, status);
    }

    /// Current indirect window address
    pub fn window(&self) -> u32 {
        u32::from_le_bytes([
            self.func0_reg(regs::CSA_ADDR_0),
            self.func0_reg(regs::CSA_ADDR_1),
            self.func0_reg(regs::CSA_ADDR_2),
            0,
        ])
    }

    fn mem_byte(&self, addr: u32) -> u8 {
        self.memory.get(&addr).copied().unwrap_or(0)
    }

    fn check_failure(&mut self) -> CoreResult<()> {
        let index = self.executed;
        self.executed += 1;
        match self.fail_from {
            Some(from) if index >= from => {
                log::debug!("dummy: injected failure at transaction {}", index);
                Err(Error::TransferFailed)
            }
            _ => Ok(()),
        }
    }

    fn reset_card(&mut self) {
        log::debug!("dummy: card reset");
        self.func0.clear();
        self.ior_reads = 0;
        self.fifo.clear();
    }

    fn func0_read(&mut self, addr: u32) -> u8 {
        match addr {
            regs::CCCR_IO_READY => {
                let enabled = self.func0_reg(regs::CCCR_IO_ENABLE) & regs::IO_FUNC1;
                if enabled == 0 {
                    return 0;
                }
                let ready = self.ior_reads >= self.config.ready_polls;
                self.ior_reads = self.ior_reads.saturating_add(1);
                if ready {
                    regs::IO_FUNC1
                } else {
                    0
                }
            }
            _ => self.func0_reg(addr),
        }
    }

    fn func0_write(&mut self, addr: u32, data: u8) {
        match addr {
            regs::CCCR_IO_ABORT if data & regs::RESET_REQUEST != 0 => self.reset_card(),
            regs::WILC1000_VMM_CTL => {
                // Low five bits acknowledge GPIO lines; the rest stays latched
                let flags = self.func1_reg(regs::WILC1000_IRQ_FLAGS) & !(data & 0x1F);
                self.set_func1_reg(regs::WILC1000_IRQ_FLAGS, flags);
                self.func0.insert(addr, data & 0xE0);
            }
            regs::WILC3000_IRQ_FLAGS => {
                let flags = self.func1_reg(regs::WILC3000_IRQ_FLAGS) & !data;
                self.set_func1_reg(regs::WILC3000_IRQ_FLAGS, flags);
            }
            _ => {
                self.func0.insert(addr, data);
            }
        }
    }

    fn window_transfer(&mut self, data: &mut Cmd53Data<'_>, len: usize, increment: bool) {
        let base = self.window();
        for i in 0..len {
            let addr = if increment {
                base.wrapping_add(i as u32)
            } else {
                base
            };
            match data {
                Cmd53Data::Read(buf) => buf[i] = self.mem_byte(addr),
                Cmd53Data::Write(src) => {
                    self.memory.insert(addr, src[i]);
                }
            }
        }
    }

    fn fifo_transfer(&mut self, data: &mut Cmd53Data<'_>, len: usize) {
        match data {
            Cmd53Data::Read(buf) => {
                for b in buf[..len].iter_mut() {
                    *b = self.fifo.pop_front().unwrap_or(0);
                }
            }
            Cmd53Data::Write(src) => self.fifo.extend(&src[..len]),
        }
    }
}

impl SdioHost for DummySdio {
    fn cmd52(&mut self, cmd: &mut Cmd52) -> CoreResult<()> {
        self.check_failure()?;

        // Decode from the packed argument so the encoding is exercised
        let decoded = Cmd52::from_argument(cmd.argument());
        let data = match (decoded.function, decoded.direction) {
            (FUNC0, Direction::Write) => {
                self.func0_write(decoded.address, decoded.data);
                if decoded.raw {
                    self.func0_reg(decoded.address)
                } else {
                    decoded.data
                }
            }
            (FUNC0, Direction::Read) => self.func0_read(decoded.address),
            (FUNC1, Direction::Write) => {
                self.set_func1_reg(decoded.address, decoded.data);
                decoded.data
            }
            (FUNC1, Direction::Read) => self.func1_reg(decoded.address),
            (function, _) => {
                log::debug!("dummy: CMD52 to unsupported function {}", function);
                return Err(Error::TransferFailed);
            }
        };

        if decoded.direction == Direction::Read || decoded.raw {
            cmd.data = data;
        }

        log::trace!(
            "dummy: CMD52 f{} {:?} 0x{:05x} = 0x{:02x}",
            decoded.function,
            decoded.direction,
            decoded.address,
            data
        );
        self.trace.push(Transaction::Cmd52 {
            function: decoded.function,
            address: decoded.address,
            direction: decoded.direction,
            raw: decoded.raw,
            data,
        });
        Ok(())
    }

    fn cmd53(&mut self, cmd: &mut Cmd53<'_>) -> CoreResult<()> {
        self.check_failure()?;

        let len = cmd.transfer_len();
        if !cmd.count_fits() || cmd.data_len() < len {
            return Err(Error::TransferFailed);
        }

        let window = self.window();
        match (cmd.function, cmd.address) {
            (FUNC0, regs::CSA_DATA) => self.window_transfer(&mut cmd.data, len, cmd.increment),
            (FUNC1, 0) => self.fifo_transfer(&mut cmd.data, len),
            (function, address) => {
                log::debug!(
                    "dummy: CMD53 to unsupported port f{} 0x{:05x}",
                    function,
                    address
                );
                return Err(Error::TransferFailed);
            }
        }

        log::trace!(
            "dummy: CMD53 f{} {:?} 0x{:05x} {} bytes (window 0x{:06x})",
            cmd.function,
            cmd.direction(),
            cmd.address,
            len,
            window
        );
        self.trace.push(Transaction::Cmd53 {
            function: cmd.function,
            address: cmd.address,
            direction: cmd.direction(),
            block_mode: cmd.block_mode,
            count: cmd.count,
            len,
            window,
        });
        Ok(())
    }

    fn claim_irq(&mut self) -> CoreResult<()> {
        self.irq_claimed = true;
        Ok(())
    }

    fn release_irq(&mut self) -> CoreResult<()> {
        self.irq_claimed = false;
        Ok(())
    }

    fn clock_hz(&self) -> Option<u32> {
        Some(self.config.clock_hz)
    }
}

fn parse_number(name: &'static str, value: &str) -> Result<u32> {
    let parsed = if let Some(hex) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        u32::from_str_radix(hex, 16)
    } else {
        value.parse::<u32>()
    };
    parsed.map_err(|_| DummyError::InvalidValue {
        name,
        value: value.to_string(),
    })
}

/// Parse dummy options into a configuration
///
/// # Options
///
/// - `chip=wilc1000|wilc3000|<id>` - chip identifier (default WILC1000)
/// - `ready_polls=N` - IOR reads before function 1 reports ready
/// - `clock=N` - reported bus clock in Hz
///
/// Keys not listed here are rejected.
pub fn parse_options(options: &[(&str, &str)]) -> Result<DummyConfig> {
    let mut config = DummyConfig::default();

    for &(key, value) in options {
        match key {
            "chip" => {
                config.chip_id = match value.to_ascii_lowercase().as_str() {
                    "wilc1000" => DummyConfig::for_variant(ChipVariant::Wilc1000).chip_id,
                    "wilc3000" => DummyConfig::for_variant(ChipVariant::Wilc3000).chip_id,
                    _ => parse_number("chip", value)
                        .map_err(|_| DummyError::UnknownChip(value.to_string()))?,
                };
            }
            "ready_polls" => {
                let polls = parse_number("ready_polls", value)?;
                config.ready_polls =
                    u8::try_from(polls).map_err(|_| DummyError::InvalidValue {
                        name: "ready_polls",
                        value: value.to_string(),
                    })?;
            }
            "clock" => config.clock_hz = parse_number("clock", value)?,
            _ => return Err(DummyError::UnknownOption(key.to_string())),
        }
    }

    Ok(config)
}
