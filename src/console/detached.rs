//! Console stand-in for processes with no console attached.
//!
//! Every stream reports as a plain stream, so the pumps pass bytes through
//! untouched and only the broken-pipe shim stays active.

use super::{Attr, Console, Coord, ScreenInfo, Stream};
use crate::error::{Result, ShimError};

#[derive(Debug, Default, Clone, Copy)]
pub struct Detached;

impl Detached {
    pub fn open() -> Self {
        Self
    }
}

impl Console for Detached {
    fn is_console(&self, _stream: Stream) -> bool {
        false
    }

    fn is_pipe(&self, _stream: Stream) -> bool {
        // EPIPE alone identifies a closed pipe on these hosts
        true
    }

    fn screen_info(&self) -> Result<ScreenInfo> {
        Err(ShimError::NoConsole)
    }

    fn set_attribute(&mut self, _attr: Attr) -> Result<()> {
        Err(ShimError::NoConsole)
    }

    fn set_cursor(&mut self, _pos: Coord) -> Result<()> {
        Err(ShimError::NoConsole)
    }

    fn fill(&mut self, _ch: u8, _attr: Attr, _len: u32, _at: Coord) -> Result<()> {
        Err(ShimError::NoConsole)
    }

    fn set_title(&mut self, _title: &[u8]) -> Result<()> {
        Err(ShimError::NoConsole)
    }

    fn set_title_wide(&mut self, _title: &[u16]) -> Result<()> {
        Err(ShimError::NoConsole)
    }

    fn input_codepage(&self) -> u32 {
        0
    }

    fn output_codepage(&self) -> u32 {
        0
    }

    fn set_codepages(&mut self, _codepage: u32) -> Result<()> {
        Err(ShimError::NoConsole)
    }
}
