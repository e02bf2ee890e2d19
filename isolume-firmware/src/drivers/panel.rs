//! SSD1322 OLED panel driver
//!
//! Drives a 256x64 4-bit grayscale OLED over SPI with a DC (data/command)
//! line. The wire data arrives pre-rotated (column-major), so the remap
//! register is configured for vertical address increment and a full frame
//! is one uninterrupted RAM write burst.

use embedded_hal::digital::OutputPin;
use embedded_hal_async::spi::SpiBus;

/// Panel addressing window base
///
/// The panel auto-increments its write pointer during data bursts; the
/// window is rewritten periodically so a missed clock cannot shift the
/// image horizontally forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelWindow {
    /// First column address (4 pixels per column group)
    pub col_base: u8,
    /// First row address
    pub row_base: u8,
}

/// SSD1322 commands
#[allow(dead_code)]
mod cmd {
    pub const SET_COLUMN_ADDR: u8 = 0x15;
    pub const WRITE_RAM: u8 = 0x5C;
    pub const SET_ROW_ADDR: u8 = 0x75;
    pub const SET_REMAP: u8 = 0xA0;
    pub const SET_START_LINE: u8 = 0xA1;
    pub const SET_DISPLAY_OFFSET: u8 = 0xA2;
    pub const DISPLAY_NORMAL: u8 = 0xA6;
    pub const EXIT_PARTIAL: u8 = 0xA9;
    pub const SLEEP_ON: u8 = 0xAE;
    pub const SLEEP_OFF: u8 = 0xAF;
    pub const SET_PHASE_LENGTH: u8 = 0xB1;
    pub const SET_CLOCK_DIV: u8 = 0xB3;
    pub const SET_SECOND_PRECHARGE: u8 = 0xB6;
    pub const DEFAULT_GRAYSCALE: u8 = 0xB9;
    pub const SET_PRECHARGE_VOLTAGE: u8 = 0xBB;
    pub const SET_VCOMH: u8 = 0xBE;
    pub const SET_CONTRAST: u8 = 0xC1;
    pub const SET_MASTER_CURRENT: u8 = 0xC7;
    pub const SET_MUX_RATIO: u8 = 0xCA;
    pub const SET_COMMAND_LOCK: u8 = 0xFD;
}

/// Column groups per panel line (4 pixels per group)
const COL_GROUPS: u8 = 64;

/// Panel mux ratio (64 rows)
const MUX_RATIO: u8 = 0x3F;

/// SSD1322 OLED driver
pub struct Ssd1322<SPI, DC, CS> {
    spi: SPI,
    dc: DC,
    cs: CS,
}

impl<SPI, DC, CS> Ssd1322<SPI, DC, CS>
where
    SPI: SpiBus,
    DC: OutputPin,
    CS: OutputPin,
{
    /// Create a new SSD1322 driver
    pub fn new(spi: SPI, dc: DC, cs: CS) -> Self {
        Self { spi, dc, cs }
    }

    /// Initialize the display
    pub async fn init(&mut self) -> Result<(), SPI::Error> {
        self.command(cmd::SET_COMMAND_LOCK, &[0x12]).await?; // Unlock
        self.command(cmd::SLEEP_ON, &[]).await?;
        self.command(cmd::SET_CLOCK_DIV, &[0x91]).await?;
        self.command(cmd::SET_MUX_RATIO, &[MUX_RATIO]).await?;
        self.command(cmd::SET_DISPLAY_OFFSET, &[0x00]).await?;
        self.command(cmd::SET_START_LINE, &[0x00]).await?;
        // Vertical address increment, nibble remap: matches the rotated
        // column-major wire layout.
        self.command(cmd::SET_REMAP, &[0x15, 0x11]).await?;
        self.command(cmd::SET_CONTRAST, &[0x9F]).await?;
        self.command(cmd::SET_MASTER_CURRENT, &[0x0F]).await?;
        self.command(cmd::DEFAULT_GRAYSCALE, &[]).await?;
        self.command(cmd::SET_PHASE_LENGTH, &[0xE2]).await?;
        self.command(cmd::SET_PRECHARGE_VOLTAGE, &[0x1F]).await?;
        self.command(cmd::SET_SECOND_PRECHARGE, &[0x08]).await?;
        self.command(cmd::SET_VCOMH, &[0x07]).await?;
        self.command(cmd::DISPLAY_NORMAL, &[]).await?;
        self.command(cmd::EXIT_PARTIAL, &[]).await?;
        self.command(cmd::SLEEP_OFF, &[]).await?;
        Ok(())
    }

    /// Send a command with parameter bytes
    async fn command(&mut self, c: u8, data: &[u8]) -> Result<(), SPI::Error> {
        let _ = self.cs.set_low();
        let _ = self.dc.set_low();
        let mut r = self.spi.write(&[c]).await;
        if r.is_ok() && !data.is_empty() {
            let _ = self.dc.set_high();
            r = self.spi.write(data).await;
        }
        let _ = self.cs.set_high();
        r
    }

    /// Rewrite the addressing window registers
    pub async fn set_window(&mut self, window: PanelWindow) -> Result<(), SPI::Error> {
        self.command(
            cmd::SET_COLUMN_ADDR,
            &[window.col_base, window.col_base + COL_GROUPS - 1],
        )
        .await?;
        self.command(cmd::SET_ROW_ADDR, &[window.row_base, window.row_base + MUX_RATIO])
            .await
    }

    /// Burst one packed frame into the panel RAM
    pub async fn write_frame(&mut self, data: &[u8]) -> Result<(), SPI::Error> {
        self.command(cmd::WRITE_RAM, &[]).await?;
        let _ = self.cs.set_low();
        let _ = self.dc.set_high();
        let r = self.spi.write(data).await;
        let _ = self.cs.set_high();
        r
    }
}
