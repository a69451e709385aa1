//! Sequence interpreter
//!
//! Applies recognized sequences to the context's attribute state and
//! drives the matching native console calls.

use tracing::trace;

use super::scanner::{Direction, Sequence, SgrCode, SgrCodes};
use crate::console::{Attr, Console, Coord};
use crate::context::Context;
use crate::error::Result;

impl<C: Console> Context<C> {
    /// Carry out one recognized sequence
    pub fn apply(&mut self, sequence: &Sequence<'_>) -> Result<()> {
        match *sequence {
            Sequence::SelectGraphicRendition(codes) => self.select_graphic_rendition(codes),
            Sequence::CursorRelative { direction, count } => {
                let n = i32::try_from(count).unwrap_or(i32::MAX);
                match direction {
                    Direction::Up => self.move_cursor_row(-n),
                    Direction::Down => self.move_cursor_row(n),
                    Direction::Forward => self.move_cursor_column(n),
                    Direction::Back => self.move_cursor_column(-n),
                }
            }
            Sequence::CursorPosition { row, col } => {
                let x = col.saturating_sub(1);
                let y = row.saturating_sub(1);
                self.move_cursor(x, y)
            }
            Sequence::EraseScreen => self.erase_till_end_of_screen(),
            Sequence::EraseLine => self.erase_in_line(),
            Sequence::PrivateMode => {
                trace!("Discarding private mode sequence");
                Ok(())
            }
            Sequence::SetTitle(text) => {
                let mut title = text.to_vec();
                self.codepage.to_console_in_place(&mut title);
                self.console.set_title(&title)
            }
        }
    }

    fn select_graphic_rendition(&mut self, codes: SgrCodes<'_>) -> Result<()> {
        for code in codes.iter() {
            match code {
                SgrCode::Reset => {
                    self.current = self.base;
                    self.reverse = false;
                }
                SgrCode::Bold => self.current.insert(Attr::FOREGROUND_INTENSITY),
                SgrCode::NormalIntensity => self.current.remove(Attr::FOREGROUND_INTENSITY),
                // No blink on the console; background intensity is the
                // nearest visible change
                SgrCode::Blink => self.current.insert(Attr::BACKGROUND_INTENSITY),
                SgrCode::NoBlink => self.current.remove(Attr::BACKGROUND_INTENSITY),
                SgrCode::Reverse => self.reverse = true,
                SgrCode::NoReverse => self.reverse = false,
                SgrCode::Unsupported => {}
                SgrCode::Foreground(index) => {
                    self.current.remove(Attr::FOREGROUND_ALL);
                    self.current.insert(Attr::foreground_color(index));
                }
                SgrCode::DefaultForeground => {
                    self.current.remove(Attr::FOREGROUND_ALL);
                    self.current.insert(self.base & Attr::FOREGROUND_ALL);
                }
                SgrCode::Background(index) => {
                    self.current.remove(Attr::BACKGROUND_ALL);
                    self.current.insert(Attr::background_color(index));
                }
                SgrCode::DefaultBackground => {
                    self.current.remove(Attr::BACKGROUND_ALL);
                    self.current.insert(self.base & Attr::BACKGROUND_ALL);
                }
            }
        }
        self.sync_attribute()
    }

    /// Push the effective attribute to the console
    pub fn sync_attribute(&mut self) -> Result<()> {
        let attr = self.effective_attribute();
        self.console.set_attribute(attr)
    }

    /// Move the cursor `n` rows, clamped to the screen buffer
    pub fn move_cursor_row(&mut self, n: i32) -> Result<()> {
        let info = self.console.screen_info()?;
        let pos = info.clamp(
            i32::from(info.cursor.x),
            i32::from(info.cursor.y).saturating_add(n),
        );
        self.console.set_cursor(pos)
    }

    fn move_cursor_column(&mut self, n: i32) -> Result<()> {
        let info = self.console.screen_info()?;
        let pos = info.clamp(
            i32::from(info.cursor.x).saturating_add(n),
            i32::from(info.cursor.y),
        );
        self.console.set_cursor(pos)
    }

    /// 0-based position relative to the visible window
    fn move_cursor(&mut self, x: u32, y: u32) -> Result<()> {
        let info = self.console.screen_info()?;
        let x = i32::try_from(x).unwrap_or(i32::MAX);
        let y = i32::try_from(y).unwrap_or(i32::MAX);
        let pos = info.clamp(
            i32::from(info.window.left).saturating_add(x),
            i32::from(info.window.top).saturating_add(y),
        );
        self.console.set_cursor(pos)
    }

    fn erase_in_line(&mut self) -> Result<()> {
        let info = self.console.screen_info()?;
        let len = i32::from(info.size.x) - i32::from(info.cursor.x);
        self.fill_plain(len, info.cursor)
    }

    fn erase_till_end_of_screen(&mut self) -> Result<()> {
        let info = self.console.screen_info()?;
        let width = i32::from(info.size.x);
        let len = width - i32::from(info.cursor.x)
            + width * (i32::from(info.window.bottom) - i32::from(info.cursor.y));
        self.fill_plain(len, info.cursor)
    }

    /// Set the window title from Unicode text
    pub fn set_title_text(&mut self, title: &str) -> Result<()> {
        let wide: Vec<u16> = title.encode_utf16().collect();
        self.console.set_title_wide(&wide)
    }

    /// Home the cursor and blank the whole screen buffer
    pub fn reset_screen(&mut self) -> Result<()> {
        let info = self.console.screen_info()?;
        let origin = Coord::new(0, 0);
        self.console.set_cursor(origin)?;
        let len = i32::from(info.size.x) * i32::from(info.size.y);
        self.fill_plain(len, origin)
    }

    fn fill_plain(&mut self, len: i32, at: Coord) -> Result<()> {
        let len = u32::try_from(len).unwrap_or(0);
        self.console.fill(b' ', self.base, len, at)
    }
}
