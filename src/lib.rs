//! vtshim - ANSI escape emulation for the legacy Windows console
//!
//! Programs write VT100 style escape sequences as if to a terminal; on a
//! console that does not understand them, vtshim intercepts the bytes,
//! applies recognized sequences through native console calls and writes
//! the remaining text transcoded to the console codepage.
//!
//! # Modules
//!
//! - [`ansi`]: Escape sequence scanner and interpreter
//! - [`codepage`]: Application charset to console codepage tables
//! - [`console`]: Native console primitives behind the `Console` trait
//! - [`context`]: Process-wide console state
//! - [`output`]: Output pump and `Write` adapters
//! - [`input`]: Input pump and `Read` adapter
//! - [`signal`]: Broken-pipe emulation
//!
//! # Example
//!
//! ```no_run
//! use std::io::Write;
//!
//! let mut out = vtshim::stdout();
//! write!(out, "\x1b[1;31mred\x1b[0m plain\n")?;
//! out.flush()?;
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod ansi;
pub mod codepage;
pub mod config;
pub mod console;
pub mod context;
pub mod error;
pub mod input;
pub mod output;
pub mod signal;

pub use context::{init, Options};
pub use error::{Result, ShimError};
pub use input::{stdin, ConsoleReader};
pub use output::{stderr, stdout, ConsoleWriter};
pub use signal::{signal, Disposition, Signal};

use console::Stream;

/// Set the console window title.
///
/// Does nothing when standard output is not a console.
pub fn set_title(title: &str) -> Result<()> {
    let mut ctx = context::global();
    if !ctx.is_console(Stream::Stdout) {
        return Ok(());
    }
    ctx.set_title_text(title)
}

/// Home the cursor and blank the screen buffer with the startup attribute
pub fn reset_screen() -> Result<()> {
    let mut ctx = context::global();
    if !ctx.is_console(Stream::Stdout) {
        return Err(ShimError::NoConsole);
    }
    ctx.reset_screen()
}

/// Move the cursor `n` rows down (up when negative)
pub fn move_cursor_row(n: i32) -> Result<()> {
    let mut ctx = context::global();
    if !ctx.is_console(Stream::Stdout) {
        return Err(ShimError::NoConsole);
    }
    ctx.move_cursor_row(n)
}
