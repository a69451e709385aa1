//! Win32 console wrapper
//!
//! Thin safe layer over the console API calls the interpreter needs.
//! Handles are looked up once when the context opens the console.

use std::io;

use crossterm::tty::IsTty;
use windows::core::{PCSTR, PCWSTR};
use windows::Win32::Foundation::HANDLE;
use windows::Win32::Storage::FileSystem::{GetFileType, FILE_TYPE_CHAR, FILE_TYPE_PIPE};
use windows::Win32::System::Console::{
    FillConsoleOutputAttribute, FillConsoleOutputCharacterW, GetConsoleCP, GetConsoleMode,
    GetConsoleOutputCP, GetConsoleScreenBufferInfo, GetStdHandle, SetConsoleCP,
    SetConsoleCursorPosition, SetConsoleOutputCP, SetConsoleTextAttribute, SetConsoleTitleA,
    SetConsoleTitleW, CONSOLE_CHARACTER_ATTRIBUTES, CONSOLE_MODE, CONSOLE_SCREEN_BUFFER_INFO,
    COORD, STD_ERROR_HANDLE, STD_HANDLE, STD_INPUT_HANDLE, STD_OUTPUT_HANDLE,
};

use super::{Attr, Console, Coord, ScreenInfo, Stream, Window};
use crate::error::{Result, ShimError};

/// Process console, drawing through the stdout screen buffer
pub struct WinConsole {
    output: Option<HANDLE>,
    attached: [bool; 3],
}

// Safety: console handles are process-wide and only used behind the
// context mutex
unsafe impl Send for WinConsole {}

fn std_handle(which: STD_HANDLE) -> Option<HANDLE> {
    unsafe { GetStdHandle(which) }
        .ok()
        .filter(|h| !h.is_invalid() && !h.0.is_null())
}

fn stream_handle(stream: Stream) -> Option<HANDLE> {
    std_handle(match stream {
        Stream::Stdin => STD_INPUT_HANDLE,
        Stream::Stdout => STD_OUTPUT_HANDLE,
        Stream::Stderr => STD_ERROR_HANDLE,
    })
}

/// A real console: a character device that answers `GetConsoleMode`.
/// The NUL device is a character device too, but has no console mode.
fn is_console_handle(handle: HANDLE) -> bool {
    unsafe {
        if GetFileType(handle) != FILE_TYPE_CHAR {
            return false;
        }
        let mut mode = CONSOLE_MODE::default();
        GetConsoleMode(handle, &mut mode).is_ok()
    }
}

fn probe(stream: Stream) -> bool {
    let tty = match stream {
        Stream::Stdin => io::stdin().is_tty(),
        Stream::Stdout => io::stdout().is_tty(),
        Stream::Stderr => io::stderr().is_tty(),
    };
    tty && stream_handle(stream).map_or(false, is_console_handle)
}

impl WinConsole {
    pub fn open() -> Self {
        let output = std_handle(STD_OUTPUT_HANDLE);
        let input = std_handle(STD_INPUT_HANDLE);

        // Output streams need the screen buffer, input needs its handle
        let attached = [
            input.is_some() && probe(Stream::Stdin),
            output.is_some() && probe(Stream::Stdout),
            output.is_some() && probe(Stream::Stderr),
        ];

        Self { output, attached }
    }

    fn output(&self) -> Result<HANDLE> {
        self.output.ok_or(ShimError::NoConsole)
    }
}

impl Console for WinConsole {
    fn is_console(&self, stream: Stream) -> bool {
        match stream {
            Stream::Stdin => self.attached[0],
            Stream::Stdout => self.attached[1],
            Stream::Stderr => self.attached[2],
        }
    }

    fn is_pipe(&self, stream: Stream) -> bool {
        stream_handle(stream).map_or(false, |h| unsafe { GetFileType(h) } == FILE_TYPE_PIPE)
    }

    fn screen_info(&self) -> Result<ScreenInfo> {
        let handle = self.output()?;
        let mut sbi = CONSOLE_SCREEN_BUFFER_INFO::default();
        unsafe { GetConsoleScreenBufferInfo(handle, &mut sbi)? };

        Ok(ScreenInfo {
            size: Coord::new(sbi.dwSize.X, sbi.dwSize.Y),
            cursor: Coord::new(sbi.dwCursorPosition.X, sbi.dwCursorPosition.Y),
            window: Window {
                left: sbi.srWindow.Left,
                top: sbi.srWindow.Top,
                right: sbi.srWindow.Right,
                bottom: sbi.srWindow.Bottom,
            },
            attributes: Attr::from_bits_retain(sbi.wAttributes.0),
        })
    }

    fn set_attribute(&mut self, attr: Attr) -> Result<()> {
        let handle = self.output()?;
        unsafe { SetConsoleTextAttribute(handle, CONSOLE_CHARACTER_ATTRIBUTES(attr.bits()))? };
        Ok(())
    }

    fn set_cursor(&mut self, pos: Coord) -> Result<()> {
        let handle = self.output()?;
        unsafe { SetConsoleCursorPosition(handle, COORD { X: pos.x, Y: pos.y })? };
        Ok(())
    }

    fn fill(&mut self, ch: u8, attr: Attr, len: u32, at: Coord) -> Result<()> {
        let handle = self.output()?;
        let at = COORD { X: at.x, Y: at.y };
        // Written counts are unused; the out-params must still be valid
        let mut written = 0u32;
        unsafe {
            FillConsoleOutputCharacterW(handle, u16::from(ch), len, at, &mut written)?;
            FillConsoleOutputAttribute(handle, attr.bits(), len, at, &mut written)?;
        }
        Ok(())
    }

    fn set_title(&mut self, title: &[u8]) -> Result<()> {
        let mut title = title.to_vec();
        title.push(0);
        unsafe { SetConsoleTitleA(PCSTR(title.as_ptr()))? };
        Ok(())
    }

    fn set_title_wide(&mut self, title: &[u16]) -> Result<()> {
        let mut title = title.to_vec();
        title.push(0);
        unsafe { SetConsoleTitleW(PCWSTR(title.as_ptr()))? };
        Ok(())
    }

    fn input_codepage(&self) -> u32 {
        unsafe { GetConsoleCP() }
    }

    fn output_codepage(&self) -> u32 {
        unsafe { GetConsoleOutputCP() }
    }

    fn set_codepages(&mut self, codepage: u32) -> Result<()> {
        unsafe {
            SetConsoleCP(codepage)?;
            SetConsoleOutputCP(codepage)?;
        }
        Ok(())
    }
}
