//! Escape sequence recognizer
//!
//! Recognizes the small grammar of sequences the console can emulate:
//!
//! ```text
//! ESC [ <n>(;<n>)* m          SGR
//! ESC [ <n>? A|B|C|D          cursor relative
//! ESC [ <row>?(;<col>)? H     cursor absolute
//! ESC [ J / ESC [ K           erase to end of screen / line
//! ESC [ ? <digits> <any>      private mode, discarded
//! ESC ] 0|2 ; <text> BEL      window title
//! ```
//!
//! Title text cannot contain ESC, CR or LF.
//!
//! Scanning never mutates state. The caller gets the consumed length, or
//! learns that nothing matched so the ESC byte goes out literally.

pub const ESC: u8 = 0x1B;
pub const BEL: u8 = 0x07;

/// The title BEL must sit at an offset below this from the ESC;
/// also the longest prefix worth carrying between writes.
pub const TITLE_LOOKAHEAD: usize = 260;

/// Cursor direction for relative moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Forward,
    Back,
}

/// One SGR parameter, decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SgrCode {
    Reset,
    Bold,
    /// Faint (2) and normal intensity (22)
    NormalIntensity,
    /// Slow/fast blink, rendered as background intensity
    Blink,
    NoBlink,
    Reverse,
    NoReverse,
    /// Accepted but has no console equivalent
    Unsupported,
    Foreground(u8),
    DefaultForeground,
    Background(u8),
    DefaultBackground,
}

impl SgrCode {
    pub fn from_code(code: u32) -> Option<Self> {
        let code = match code {
            0 => Self::Reset,
            1 => Self::Bold,
            2 | 22 => Self::NormalIntensity,
            5 | 6 => Self::Blink,
            25 => Self::NoBlink,
            7 => Self::Reverse,
            27 => Self::NoReverse,
            3 | 4 | 8 | 21 | 24 | 28 | 38 | 48 => Self::Unsupported,
            30..=37 => Self::Foreground((code - 30) as u8),
            39 => Self::DefaultForeground,
            40..=47 => Self::Background((code - 40) as u8),
            49 => Self::DefaultBackground,
            _ => return None,
        };
        Some(code)
    }
}

/// Raw `[0-9;]*` parameter bytes of a CSI sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params<'a>(&'a [u8]);

impl<'a> Params<'a> {
    pub fn new(raw: &'a [u8]) -> Self {
        Self(raw)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Each `;`-separated field; an empty field reads as 0
    pub fn values(&self) -> impl Iterator<Item = u32> + 'a {
        let raw: &'a [u8] = self.0;
        raw.split(|&b| b == b';').map(|field| {
            field.iter().fold(0u32, |acc, &d| {
                acc.saturating_mul(10).saturating_add(u32::from(d - b'0'))
            })
        })
    }

    pub fn get(&self, index: usize) -> Option<u32> {
        self.values().nth(index)
    }

    /// Decoded SGR codes, or `None` if any code is unknown
    fn sgr_codes(&self) -> Option<SgrCodes<'a>> {
        if self.values().all(|v| SgrCode::from_code(v).is_some()) {
            Some(SgrCodes(*self))
        } else {
            None
        }
    }
}

/// Validated SGR parameter list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SgrCodes<'a>(Params<'a>);

impl<'a> SgrCodes<'a> {
    pub fn iter(&self) -> impl Iterator<Item = SgrCode> + 'a {
        self.0.values().filter_map(SgrCode::from_code)
    }
}

/// A recognized sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence<'a> {
    SelectGraphicRendition(SgrCodes<'a>),
    CursorRelative { direction: Direction, count: u32 },
    /// 1-based row and column as written; 0 means "before the first"
    CursorPosition { row: u32, col: u32 },
    EraseScreen,
    EraseLine,
    PrivateMode,
    /// Title text in the application charset
    SetTitle(&'a [u8]),
}

/// Result of scanning at an ESC byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan<'a> {
    Matched { sequence: Sequence<'a>, len: usize },
    /// Emit the ESC literally and carry on with the next byte
    Unrecognized,
    /// The buffer ends inside a sequence that may still match
    Incomplete,
}

/// Scan `buf`, whose first byte is ESC.
pub fn scan(buf: &[u8]) -> Scan<'_> {
    debug_assert_eq!(buf.first(), Some(&ESC));

    match buf.get(1) {
        None => incomplete(buf),
        Some(b'[') => scan_csi(buf),
        Some(b']') => scan_osc(buf),
        Some(_) => Scan::Unrecognized,
    }
}

fn incomplete(buf: &[u8]) -> Scan<'static> {
    if buf.len() >= TITLE_LOOKAHEAD {
        Scan::Unrecognized
    } else {
        Scan::Incomplete
    }
}

fn scan_csi(buf: &[u8]) -> Scan<'_> {
    let body = &buf[2..];
    let n = body
        .iter()
        .take_while(|b| b.is_ascii_digit() || **b == b';')
        .count();
    let params = Params::new(&body[..n]);
    let Some(&final_byte) = body.get(n) else {
        return incomplete(buf);
    };
    let len = 2 + n + 1;

    let sequence = match final_byte {
        b'm' => match params.sgr_codes() {
            Some(codes) => Sequence::SelectGraphicRendition(codes),
            None => return Scan::Unrecognized,
        },
        b'A' | b'B' | b'C' | b'D' => {
            let direction = match final_byte {
                b'A' => Direction::Up,
                b'B' => Direction::Down,
                b'C' => Direction::Forward,
                _ => Direction::Back,
            };
            let count = params.get(0).unwrap_or(1).max(1);
            Sequence::CursorRelative { direction, count }
        }
        b'H' => {
            if params.is_empty() {
                Sequence::CursorPosition { row: 1, col: 1 }
            } else {
                let row = params.get(0).unwrap_or(1);
                let col = params.get(1).unwrap_or(1);
                Sequence::CursorPosition { row, col }
            }
        }
        b'J' => Sequence::EraseScreen,
        b'K' => Sequence::EraseLine,
        b'?' => {
            let mode = &body[n + 1..];
            let digits = mode.iter().take_while(|b| b.is_ascii_digit()).count();
            if mode.get(digits).is_none() {
                return incomplete(buf);
            }
            return Scan::Matched {
                sequence: Sequence::PrivateMode,
                len: len + digits + 1,
            };
        }
        _ => return Scan::Unrecognized,
    };

    Scan::Matched { sequence, len }
}

fn scan_osc(buf: &[u8]) -> Scan<'_> {
    match (buf.get(2), buf.get(3)) {
        (Some(b'0' | b'2'), Some(b';')) => {}
        (Some(b'0' | b'2'), None) | (None, _) => return incomplete(buf),
        _ => return Scan::Unrecognized,
    }

    // A line break or another escape ends the text without a BEL
    let window = &buf[..buf.len().min(TITLE_LOOKAHEAD)];
    match window[4..]
        .iter()
        .position(|&b| matches!(b, BEL | ESC | b'\r' | b'\n'))
    {
        Some(i) if window[4 + i] == BEL => Scan::Matched {
            sequence: Sequence::SetTitle(&buf[4..4 + i]),
            len: 4 + i + 1,
        },
        Some(_) => Scan::Unrecognized,
        None => incomplete(buf),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(buf: &[u8]) -> (Sequence<'_>, usize) {
        match scan(buf) {
            Scan::Matched { sequence, len } => (sequence, len),
            other => panic!("expected match for {buf:?}, got {other:?}"),
        }
    }

    fn sgr(buf: &[u8]) -> Vec<SgrCode> {
        match matched(buf).0 {
            Sequence::SelectGraphicRendition(codes) => codes.iter().collect(),
            other => panic!("expected SGR, got {other:?}"),
        }
    }

    #[test]
    fn test_sgr_params() {
        assert_eq!(sgr(b"\x1b[31m"), vec![SgrCode::Foreground(1)]);
        assert_eq!(
            sgr(b"\x1b[1;44m"),
            vec![SgrCode::Bold, SgrCode::Background(4)]
        );
        // Omitted parameters read as 0
        assert_eq!(sgr(b"\x1b[m"), vec![SgrCode::Reset]);
        assert_eq!(sgr(b"\x1b[;1m"), vec![SgrCode::Reset, SgrCode::Bold]);
        assert_eq!(sgr(b"\x1b[1;m"), vec![SgrCode::Bold, SgrCode::Reset]);
    }

    #[test]
    fn test_sgr_length() {
        assert_eq!(matched(b"\x1b[0;31mtext").1, 7);
    }

    #[test]
    fn test_sgr_unknown_code_rejects_whole_sequence() {
        assert_eq!(scan(b"\x1b[1;99m"), Scan::Unrecognized);
        assert_eq!(scan(b"\x1b[90m"), Scan::Unrecognized);
        assert_eq!(scan(b"\x1b[99999999999999m"), Scan::Unrecognized);
    }

    #[test]
    fn test_cursor_relative() {
        assert_eq!(
            matched(b"\x1b[A").0,
            Sequence::CursorRelative { direction: Direction::Up, count: 1 }
        );
        assert_eq!(
            matched(b"\x1b[12C").0,
            Sequence::CursorRelative { direction: Direction::Forward, count: 12 }
        );
        assert_eq!(
            matched(b"\x1b[0D").0,
            Sequence::CursorRelative { direction: Direction::Back, count: 1 }
        );
    }

    #[test]
    fn test_cursor_position() {
        assert_eq!(matched(b"\x1b[H").0, Sequence::CursorPosition { row: 1, col: 1 });
        assert_eq!(matched(b"\x1b[2;5H").0, Sequence::CursorPosition { row: 2, col: 5 });
        assert_eq!(matched(b"\x1b[7H").0, Sequence::CursorPosition { row: 7, col: 1 });
        assert_eq!(matched(b"\x1b[;9H").0, Sequence::CursorPosition { row: 0, col: 9 });
    }

    #[test]
    fn test_erase() {
        assert_eq!(matched(b"\x1b[J"), (Sequence::EraseScreen, 3));
        assert_eq!(matched(b"\x1b[K"), (Sequence::EraseLine, 3));
        assert_eq!(matched(b"\x1b[2J"), (Sequence::EraseScreen, 4));
    }

    #[test]
    fn test_private_mode_consumes_final_byte() {
        assert_eq!(matched(b"\x1b[?25lrest"), (Sequence::PrivateMode, 6));
        assert_eq!(matched(b"\x1b[?1049h"), (Sequence::PrivateMode, 8));
        assert_eq!(matched(b"\x1b[?x"), (Sequence::PrivateMode, 4));
    }

    #[test]
    fn test_unknown_final_byte() {
        assert_eq!(scan(b"\x1b[999zXYZ"), Scan::Unrecognized);
        assert_eq!(scan(b"\x1b(B"), Scan::Unrecognized);
        assert_eq!(scan(b"\x1b[5:3m"), Scan::Unrecognized);
    }

    #[test]
    fn test_title() {
        let (seq, len) = matched(b"\x1b]0;hello\x07after");
        assert_eq!(seq, Sequence::SetTitle(b"hello"));
        assert_eq!(len, 10);
        assert_eq!(matched(b"\x1b]2;\x07").0, Sequence::SetTitle(b""));
    }

    #[test]
    fn test_title_other_osc_rejected() {
        assert_eq!(scan(b"\x1b]1;icon\x07"), Scan::Unrecognized);
        assert_eq!(scan(b"\x1b]0hello\x07"), Scan::Unrecognized);
    }

    #[test]
    fn test_title_ended_by_line_break_or_escape() {
        assert_eq!(scan(b"\x1b]0;x\nprompt> "), Scan::Unrecognized);
        assert_eq!(scan(b"\x1b]2;x\r"), Scan::Unrecognized);
        assert_eq!(scan(b"\x1b]0;x\x1b[31m"), Scan::Unrecognized);
    }

    #[test]
    fn test_title_lookahead_bound() {
        let mut long = b"\x1b]0;".to_vec();
        long.extend(std::iter::repeat(b'x').take(TITLE_LOOKAHEAD));
        long.push(BEL);
        assert_eq!(scan(&long), Scan::Unrecognized);

        // BEL at offset 259 is the last accepted position
        let mut edge = b"\x1b]0;".to_vec();
        edge.extend(std::iter::repeat(b'x').take(TITLE_LOOKAHEAD - 5));
        edge.push(BEL);
        assert_eq!(edge.len(), TITLE_LOOKAHEAD);
        assert!(matches!(scan(&edge), Scan::Matched { len: TITLE_LOOKAHEAD, .. }));
    }

    #[test]
    fn test_incomplete_prefixes() {
        for prefix in [
            &b"\x1b"[..],
            b"\x1b[",
            b"\x1b[3",
            b"\x1b[1;3",
            b"\x1b[?25",
            b"\x1b]",
            b"\x1b]0",
            b"\x1b]0;partial title",
        ] {
            assert_eq!(scan(prefix), Scan::Incomplete, "prefix {prefix:?}");
        }
    }
}
