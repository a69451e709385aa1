//! Recording console for tests.
//!
//! Native calls are appended to a shared event log. [`FakeOutput`] writes
//! to the same log, so tests can check the ordering of text and console
//! changes.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use super::{Attr, Console, Coord, ScreenInfo, Stream, Window};
use crate::error::{Result, ShimError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Write(Vec<u8>),
    Flush,
    Attribute(Attr),
    Cursor(Coord),
    Fill { ch: u8, attr: Attr, len: u32, at: Coord },
    Title(Vec<u8>),
    WideTitle(Vec<u16>),
    Codepages(u32),
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

pub struct FakeConsole {
    pub info: ScreenInfo,
    pub attached: bool,
    pub pipe: bool,
    pub input_cp: u32,
    pub output_cp: u32,
    pub fail_native: bool,
    pub log: EventLog,
}

impl FakeConsole {
    /// 80x300 buffer showing rows 100..124, cursor at the window origin
    pub fn new() -> Self {
        Self {
            info: ScreenInfo {
                size: Coord::new(80, 300),
                cursor: Coord::new(0, 100),
                window: Window {
                    left: 0,
                    top: 100,
                    right: 79,
                    bottom: 124,
                },
                attributes: Attr::PLAIN,
            },
            attached: true,
            pipe: false,
            input_cp: 850,
            output_cp: 850,
            fail_native: false,
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn with_codepage(mut self, codepage: u32) -> Self {
        self.input_cp = codepage;
        self.output_cp = codepage;
        self
    }

    pub fn with_attribute(mut self, attr: Attr) -> Self {
        self.info.attributes = attr;
        self
    }

    pub fn output(&self) -> FakeOutput {
        FakeOutput {
            log: Rc::clone(&self.log),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.borrow().clone()
    }

    /// Console-side events only, without writes and flushes
    pub fn native_events(&self) -> Vec<Event> {
        self.log
            .borrow()
            .iter()
            .filter(|e| !matches!(e, Event::Write(_) | Event::Flush))
            .cloned()
            .collect()
    }

    /// Concatenation of everything written through [`FakeOutput`]
    pub fn written(&self) -> Vec<u8> {
        self.log
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Write(bytes) => Some(bytes.as_slice()),
                _ => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    pub fn clear_log(&self) {
        self.log.borrow_mut().clear();
    }

    fn record(&mut self, event: Event) -> Result<()> {
        if self.fail_native {
            return Err(ShimError::NoConsole);
        }
        self.log.borrow_mut().push(event);
        Ok(())
    }
}

impl Console for FakeConsole {
    fn is_console(&self, _stream: Stream) -> bool {
        self.attached
    }

    fn is_pipe(&self, _stream: Stream) -> bool {
        self.pipe
    }

    fn screen_info(&self) -> Result<ScreenInfo> {
        if self.fail_native {
            return Err(ShimError::NoConsole);
        }
        Ok(self.info)
    }

    fn set_attribute(&mut self, attr: Attr) -> Result<()> {
        self.record(Event::Attribute(attr))?;
        self.info.attributes = attr;
        Ok(())
    }

    fn set_cursor(&mut self, pos: Coord) -> Result<()> {
        self.record(Event::Cursor(pos))?;
        self.info.cursor = pos;
        Ok(())
    }

    fn fill(&mut self, ch: u8, attr: Attr, len: u32, at: Coord) -> Result<()> {
        self.record(Event::Fill { ch, attr, len, at })
    }

    fn set_title(&mut self, title: &[u8]) -> Result<()> {
        self.record(Event::Title(title.to_vec()))
    }

    fn set_title_wide(&mut self, title: &[u16]) -> Result<()> {
        self.record(Event::WideTitle(title.to_vec()))
    }

    fn input_codepage(&self) -> u32 {
        self.input_cp
    }

    fn output_codepage(&self) -> u32 {
        self.output_cp
    }

    fn set_codepages(&mut self, codepage: u32) -> Result<()> {
        self.record(Event::Codepages(codepage))?;
        self.input_cp = codepage;
        self.output_cp = codepage;
        Ok(())
    }
}

/// Writer half of the fake, sharing the console's event log
pub struct FakeOutput {
    log: EventLog,
}

impl Write for FakeOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.log.borrow_mut().push(Event::Write(buf.to_vec()));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.log.borrow_mut().push(Event::Flush);
        Ok(())
    }
}
