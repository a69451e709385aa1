//! Native console control surface.
//!
//! Everything the shim needs from the platform console goes through the
//! [`Console`] trait:
//!
//! - **windows**: the real console, via the Win32 console API
//! - **detached**: hosts without a console (every stream is a plain stream)
//! - **fake**: recording console used by the test suites
//!
//! # Attribute word
//!
//! ```text
//! bit  7   6   5   4   3   2   1   0
//!     BI  BR  BG  BB  FI  FR  FG  FB
//! ```
//!
//! Bits above 7 belong to the console (grid lines, DBCS flags) and are
//! carried through untouched.

use bitflags::bitflags;

use crate::error::Result;

#[cfg(windows)]
pub mod windows;
pub mod detached;
#[cfg(test)]
pub mod fake;

#[cfg(windows)]
pub use self::windows::WinConsole as SystemConsole;
#[cfg(not(windows))]
pub use self::detached::Detached as SystemConsole;

bitflags! {
    /// Console character attribute word
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Attr: u16 {
        const FOREGROUND_BLUE = 0x0001;
        const FOREGROUND_GREEN = 0x0002;
        const FOREGROUND_RED = 0x0004;
        const FOREGROUND_INTENSITY = 0x0008;
        const BACKGROUND_BLUE = 0x0010;
        const BACKGROUND_GREEN = 0x0020;
        const BACKGROUND_RED = 0x0040;
        const BACKGROUND_INTENSITY = 0x0080;

        const FOREGROUND_ALL = Self::FOREGROUND_RED.bits()
            | Self::FOREGROUND_GREEN.bits()
            | Self::FOREGROUND_BLUE.bits();
        const BACKGROUND_ALL = Self::BACKGROUND_RED.bits()
            | Self::BACKGROUND_GREEN.bits()
            | Self::BACKGROUND_BLUE.bits();

        // Console-owned bits (COMMON_LVB_*) must survive a round trip.
        const _ = !0;
    }
}

impl Attr {
    /// Light gray on black, the console's stock attribute
    pub const PLAIN: Attr = Attr::FOREGROUND_ALL;

    /// Foreground color bits for ANSI color index 0-7
    pub fn foreground_color(index: u8) -> Attr {
        let mut attr = Attr::empty();
        if index & 1 != 0 {
            attr |= Attr::FOREGROUND_RED;
        }
        if index & 2 != 0 {
            attr |= Attr::FOREGROUND_GREEN;
        }
        if index & 4 != 0 {
            attr |= Attr::FOREGROUND_BLUE;
        }
        attr
    }

    /// Background color bits for ANSI color index 0-7
    pub fn background_color(index: u8) -> Attr {
        Attr::from_bits_retain(Attr::foreground_color(index).bits() << 4)
    }

    /// Swap foreground and background color bits, keeping intensity and
    /// every other bit in place.
    pub fn reversed(self) -> Attr {
        let bits = self.bits();
        let fg = bits & Attr::FOREGROUND_ALL.bits();
        let bg = bits & Attr::BACKGROUND_ALL.bits();
        let rest = bits & !(Attr::FOREGROUND_ALL.bits() | Attr::BACKGROUND_ALL.bits());
        Attr::from_bits_retain(rest | (fg << 4) | (bg >> 4))
    }
}

/// Standard stream selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Stdin,
    Stdout,
    Stderr,
}

/// Character cell coordinate (0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Coord {
    pub x: i16,
    pub y: i16,
}

impl Coord {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

/// Visible window, inclusive bounds in buffer coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    pub left: i16,
    pub top: i16,
    pub right: i16,
    pub bottom: i16,
}

/// Snapshot of the screen buffer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenInfo {
    /// Buffer size in cells
    pub size: Coord,
    pub cursor: Coord,
    pub window: Window,
    pub attributes: Attr,
}

impl ScreenInfo {
    /// Clamp a position into the screen buffer
    pub fn clamp(&self, x: i32, y: i32) -> Coord {
        let max_x = i32::from(self.size.x).saturating_sub(1).max(0);
        let max_y = i32::from(self.size.y).saturating_sub(1).max(0);
        Coord::new(x.clamp(0, max_x) as i16, y.clamp(0, max_y) as i16)
    }
}

/// Native console primitives consumed by the interpreter and the pumps.
pub trait Console {
    /// Whether `stream` is attached to this console
    fn is_console(&self, stream: Stream) -> bool;

    /// Whether `stream` is a pipe
    fn is_pipe(&self, stream: Stream) -> bool;

    fn screen_info(&self) -> Result<ScreenInfo>;

    fn set_attribute(&mut self, attr: Attr) -> Result<()>;

    fn set_cursor(&mut self, pos: Coord) -> Result<()>;

    /// Write `len` cells of `ch` with `attr` starting at `at`, wrapping
    /// across rows.
    fn fill(&mut self, ch: u8, attr: Attr, len: u32, at: Coord) -> Result<()>;

    /// Set the window title; `title` is in the console codepage
    fn set_title(&mut self, title: &[u8]) -> Result<()>;

    /// Set the window title from UTF-16, independent of the codepage
    fn set_title_wide(&mut self, title: &[u16]) -> Result<()>;

    fn input_codepage(&self) -> u32;

    fn output_codepage(&self) -> u32;

    /// Switch both input and output codepages
    fn set_codepages(&mut self, codepage: u32) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_swaps_colors_only() {
        let attr = Attr::FOREGROUND_RED | Attr::FOREGROUND_INTENSITY | Attr::BACKGROUND_BLUE;
        let rev = attr.reversed();
        assert_eq!(
            rev,
            Attr::BACKGROUND_RED | Attr::FOREGROUND_INTENSITY | Attr::FOREGROUND_BLUE
        );
        assert_eq!(rev.reversed(), attr);
    }

    #[test]
    fn test_reverse_keeps_console_bits() {
        let attr = Attr::from_bits_retain(0x8000 | 0x0007);
        assert_eq!(attr.reversed().bits(), 0x8000 | 0x0070);
    }

    #[test]
    fn test_color_index_mapping() {
        assert_eq!(Attr::foreground_color(0), Attr::empty());
        assert_eq!(Attr::foreground_color(1), Attr::FOREGROUND_RED);
        assert_eq!(
            Attr::foreground_color(3),
            Attr::FOREGROUND_RED | Attr::FOREGROUND_GREEN
        );
        assert_eq!(Attr::foreground_color(7), Attr::FOREGROUND_ALL);
        assert_eq!(
            Attr::background_color(6),
            Attr::BACKGROUND_GREEN | Attr::BACKGROUND_BLUE
        );
    }

    #[test]
    fn test_clamp_to_buffer() {
        let info = ScreenInfo {
            size: Coord::new(80, 25),
            cursor: Coord::default(),
            window: Window::default(),
            attributes: Attr::PLAIN,
        };
        assert_eq!(info.clamp(-3, 10), Coord::new(0, 10));
        assert_eq!(info.clamp(200, 200), Coord::new(79, 24));
    }
}
