//! Input pump
//!
//! Bytes typed at the console arrive in the console codepage and are
//! mapped back to the application charset.

use std::io::{self, Read};
use std::ops::Deref;

use crate::console::{Console, Stream};
use crate::context::{self, Context};

/// Transcode `buf`, just read from `stream`, if it came from the console
pub fn transcode_input<C: Console>(ctx: &Context<C>, stream: Stream, buf: &mut [u8]) {
    if !buf.is_empty() && ctx.is_console(stream) {
        ctx.codepage().to_app_in_place(buf);
    }
}

/// Read from `inner`, then transcode with the context `lock` yields.
///
/// The context is only taken once the read returns, so a blocking console
/// read does not hold up writers.
pub fn read_transcoded<C, G, R>(
    lock: impl FnOnce() -> G,
    stream: Stream,
    inner: &mut R,
    buf: &mut [u8],
) -> io::Result<usize>
where
    C: Console,
    G: Deref<Target = Context<C>>,
    R: Read,
{
    let n = inner.read(buf)?;
    transcode_input(&*lock(), stream, &mut buf[..n]);
    Ok(n)
}

/// Read a single byte; `None` at end of input
pub fn read_byte_transcoded<C, G, R>(
    lock: impl FnOnce() -> G,
    stream: Stream,
    inner: &mut R,
) -> io::Result<Option<u8>>
where
    C: Console,
    G: Deref<Target = Context<C>>,
    R: Read,
{
    let mut byte = [0u8; 1];
    loop {
        match inner.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    transcode_input(&*lock(), stream, &mut byte);
    Ok(Some(byte[0]))
}

/// `Read` adapter over console input
pub struct ConsoleReader<R: Read> {
    inner: R,
    stream: Stream,
}

impl<R: Read> ConsoleReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            stream: Stream::Stdin,
        }
    }

    /// Read a single byte; `None` at end of input
    pub fn read_byte(&mut self) -> io::Result<Option<u8>> {
        read_byte_transcoded(context::global, self.stream, &mut self.inner)
    }
}

impl<R: Read> Read for ConsoleReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        read_transcoded(context::global, self.stream, &mut self.inner, buf)
    }
}

pub fn stdin() -> ConsoleReader<io::Stdin> {
    ConsoleReader::new(io::stdin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::fake::FakeConsole;
    use crate::context::Options;

    #[test]
    fn test_console_input_is_transcoded() {
        let ctx = Context::new(FakeConsole::new(), Options::default());
        let mut buf = *b"\x82t\x82";
        transcode_input(&ctx, Stream::Stdin, &mut buf);
        assert_eq!(&buf, b"\xe9t\xe9");
    }

    #[test]
    fn test_redirected_input_untouched() {
        let mut console = FakeConsole::new();
        console.attached = false;
        let ctx = Context::new(console, Options::default());
        let mut buf = *b"\x82";
        transcode_input(&ctx, Stream::Stdin, &mut buf);
        assert_eq!(&buf, b"\x82");
    }

    #[test]
    fn test_euro_read_back_on_cp858() {
        let ctx = Context::new(FakeConsole::new().with_codepage(858), Options::default());
        let mut buf = [0xD5];
        transcode_input(&ctx, Stream::Stdin, &mut buf);
        assert_eq!(buf, [0x80]);
    }

    #[test]
    fn test_reader_byte_at_a_time() {
        let mut reader = ConsoleReader::new(&b"ab"[..]);
        assert_eq!(reader.read_byte().unwrap(), Some(b'a'));
        assert_eq!(reader.read_byte().unwrap(), Some(b'b'));
        assert_eq!(reader.read_byte().unwrap(), None);
    }

    #[test]
    fn test_read_transcodes_console_input() {
        let ctx = Context::new(FakeConsole::new(), Options::default());
        let mut input = &b"caf\x82\n"[..];
        let mut buf = [0u8; 16];
        let n = read_transcoded(|| &ctx, Stream::Stdin, &mut input, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"caf\xe9\n");
    }

    #[test]
    fn test_read_leaves_redirected_input() {
        let mut console = FakeConsole::new();
        console.attached = false;
        let ctx = Context::new(console, Options::default());
        let mut input = &b"caf\x82"[..];
        let mut buf = [0u8; 16];
        let n = read_transcoded(|| &ctx, Stream::Stdin, &mut input, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"caf\x82");
    }

    #[test]
    fn test_read_byte_transcodes_each_byte() {
        let ctx = Context::new(FakeConsole::new().with_codepage(858), Options::default());
        let mut input = &b"\xd5a"[..];
        let lock = || &ctx;
        assert_eq!(read_byte_transcoded(lock, Stream::Stdin, &mut input).unwrap(), Some(0x80));
        assert_eq!(read_byte_transcoded(lock, Stream::Stdin, &mut input).unwrap(), Some(b'a'));
        assert_eq!(read_byte_transcoded(lock, Stream::Stdin, &mut input).unwrap(), None);
    }
}
