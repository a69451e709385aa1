//! ANSI escape sequence emulation.
//!
//! - **scanner**: recognizes the supported sequences in a byte buffer
//! - **interp**: applies them to the console context
//!
//! Anything the scanner does not recognize is written out literally.

pub mod interp;
pub mod scanner;

pub use scanner::{scan, Direction, Scan, Sequence, SgrCode, BEL, ESC, TITLE_LOOKAHEAD};
