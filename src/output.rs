//! Output pump
//!
//! Splits outgoing bytes into literal runs and escape sequences. Literal
//! runs are transcoded to the console charset and written; sequences go to
//! the interpreter. Plain ASCII without an ESC is written straight through.

use std::io::{self, Write};

use tracing::debug;

use crate::ansi::scanner::{self, Scan, ESC};
use crate::console::{Console, Stream};
use crate::context::{self, Context};
use crate::signal;

/// True if `chunk` needs the slow path: an ESC or a non-ASCII byte
pub fn needs_translation(chunk: &[u8]) -> bool {
    chunk.iter().any(|&b| b == ESC || b > 0x7F)
}

/// Write `chunk` to `out`, interpreting escape sequences against `ctx`.
///
/// `carry` holds an unfinished sequence from the previous call and
/// receives the unfinished tail of this one. Returns the number of input
/// bytes consumed, which is `chunk.len()` unless the fast path's single
/// write comes up short.
pub fn emit<C: Console, W: Write>(
    ctx: &mut Context<C>,
    out: &mut W,
    carry: &mut Vec<u8>,
    chunk: &[u8],
) -> io::Result<usize> {
    if carry.is_empty() && !needs_translation(chunk) {
        return out.write(chunk);
    }

    // Sequences are parsed and transcoded in place, in a buffer the
    // context keeps between calls
    let mut scratch = std::mem::take(&mut ctx.scratch);
    scratch.clear();
    scratch.extend_from_slice(carry);
    scratch.extend_from_slice(chunk);
    carry.clear();

    let result = pump(ctx, out, carry, &mut scratch);
    ctx.scratch = scratch;
    result.map(|()| chunk.len())
}

fn pump<C: Console, W: Write>(
    ctx: &mut Context<C>,
    out: &mut W,
    carry: &mut Vec<u8>,
    buf: &mut [u8],
) -> io::Result<()> {
    if ctx.skip_emulation() {
        ctx.codepage.to_console_in_place(buf);
        return out.write_all(buf);
    }

    let mut pos = 0;
    while pos < buf.len() {
        let Some(offset) = buf[pos..].iter().position(|&b| b == ESC) else {
            write_literal(ctx, out, &mut buf[pos..])?;
            break;
        };
        let esc = pos + offset;

        if esc > pos {
            write_literal(ctx, out, &mut buf[pos..esc])?;
        }
        // Text must reach the console before its attributes change
        out.flush()?;

        match scanner::scan(&buf[esc..]) {
            Scan::Matched { sequence, len } => {
                if let Err(e) = ctx.apply(&sequence) {
                    debug!("Console call for {:?} failed: {}", sequence, e);
                }
                pos = esc + len;
            }
            Scan::Unrecognized => {
                out.write_all(&[ESC])?;
                pos = esc + 1;
            }
            Scan::Incomplete => {
                carry.extend_from_slice(&buf[esc..]);
                pos = buf.len();
            }
        }
    }
    Ok(())
}

fn write_literal<C: Console, W: Write>(
    ctx: &Context<C>,
    out: &mut W,
    span: &mut [u8],
) -> io::Result<()> {
    ctx.codepage.to_console_in_place(span);
    out.write_all(span)
}

/// Write a held-back partial sequence as literal bytes
pub fn flush_carry<C: Console, W: Write>(
    ctx: &Context<C>,
    out: &mut W,
    carry: &mut Vec<u8>,
) -> io::Result<()> {
    if carry.is_empty() {
        return Ok(());
    }
    let mut pending = std::mem::take(carry);
    write_literal(ctx, out, &mut pending)
}

/// Write `buf` to `stream` through `out`, emulating escapes if the stream is
/// the console. Failures go through the broken-pipe shim.
pub fn write_stream<C: Console, W: Write>(
    ctx: &mut Context<C>,
    stream: Stream,
    out: &mut W,
    carry: &mut Vec<u8>,
    buf: &[u8],
) -> io::Result<usize> {
    let result = if ctx.is_console(stream) {
        emit(ctx, out, carry, buf)
    } else {
        out.write(buf)
    };
    signal::check_write(result, || ctx.console().is_pipe(stream))
}

/// Flush `out`, writing any held-back partial sequence literally first
pub fn flush_stream<C: Console, W: Write>(
    ctx: &Context<C>,
    stream: Stream,
    out: &mut W,
    carry: &mut Vec<u8>,
) -> io::Result<()> {
    let result = flush_carry(ctx, out, carry).and_then(|()| out.flush());
    signal::check_write(result, || ctx.console().is_pipe(stream))
}

/// Write one byte, transcoded but never interpreted
pub fn put_byte<C: Console, W: Write>(
    ctx: &Context<C>,
    stream: Stream,
    out: &mut W,
    byte: u8,
) -> io::Result<()> {
    let byte = if ctx.is_console(stream) {
        ctx.codepage().to_console_byte(byte)
    } else {
        byte
    };
    signal::check_write(out.write_all(&[byte]), || ctx.console().is_pipe(stream))
}

/// `Write` adapter that emulates escape sequences on the process console.
///
/// Destinations that are not the console get the bytes untouched. Every
/// write failure passes through the broken-pipe shim.
///
/// A write made while this thread is already inside the context, such as
/// a tracing subscriber logging from within a pump, goes to the inner
/// writer unmodified. A subscriber on another thread that holds its own
/// lock while writing here can still deadlock against a pump that logs.
pub struct ConsoleWriter<W: Write> {
    inner: W,
    stream: Stream,
    carry: Vec<u8>,
}

impl<W: Write> ConsoleWriter<W> {
    pub fn new(inner: W, stream: Stream) -> Self {
        Self {
            inner,
            stream,
            carry: Vec::new(),
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Write one byte, transcoded but never interpreted
    pub fn put_byte(&mut self, byte: u8) -> io::Result<()> {
        match context::try_global() {
            Some(ctx) => put_byte(&*ctx, self.stream, &mut self.inner, byte),
            None => self.inner.write_all(&[byte]),
        }
    }
}

impl<W: Write> Write for ConsoleWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match context::try_global() {
            Some(mut ctx) => {
                write_stream(&mut *ctx, self.stream, &mut self.inner, &mut self.carry, buf)
            }
            None => self.inner.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match context::try_global() {
            Some(ctx) => flush_stream(&*ctx, self.stream, &mut self.inner, &mut self.carry),
            None => self.inner.flush(),
        }
    }
}

impl<W: Write> Drop for ConsoleWriter<W> {
    fn drop(&mut self) {
        if !self.carry.is_empty() {
            let _ = self.flush();
        }
    }
}

pub fn stdout() -> ConsoleWriter<io::Stdout> {
    ConsoleWriter::new(io::stdout(), Stream::Stdout)
}

pub fn stderr() -> ConsoleWriter<io::Stderr> {
    ConsoleWriter::new(io::stderr(), Stream::Stderr)
}
