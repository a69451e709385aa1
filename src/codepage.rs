//! Application ↔ console charset transcoding.
//!
//! Applications write Windows-1252 ("ANSI"); the legacy console renders
//! its OEM codepage. Both maps are built once per context from Unicode
//! tables and applied byte-for-byte in place.
//!
//! CP858 is CP850 with `€` at 0xD5 in place of `ı`. The system OEM table
//! still decodes 0xD5 as `ı`, so that one slot is special-cased in each
//! direction.
//!
//! The application side is always Windows-1252, not the system ANSI
//! codepage, and only the Western OEM codepages have tables. A console on
//! any other codepage (CP866, CP932, UTF-8) gets the identity map, so
//! bytes reach it unchanged.

/// Unicode for Windows-1252 0x80..=0x9F; the rest of the high half is Latin-1
const CP1252_C1: [u16; 32] = [
    0x20AC, 0x0081, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021,
    0x02C6, 0x2030, 0x0160, 0x2039, 0x0152, 0x008D, 0x017D, 0x008F,
    0x0090, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014,
    0x02DC, 0x2122, 0x0161, 0x203A, 0x0153, 0x009D, 0x017E, 0x0178,
];

/// Unicode for CP437 0x80..=0xFF
const CP437_HIGH: [u16; 128] = [
    0x00C7, 0x00FC, 0x00E9, 0x00E2, 0x00E4, 0x00E0, 0x00E5, 0x00E7,
    0x00EA, 0x00EB, 0x00E8, 0x00EF, 0x00EE, 0x00EC, 0x00C4, 0x00C5,
    0x00C9, 0x00E6, 0x00C6, 0x00F4, 0x00F6, 0x00F2, 0x00FB, 0x00F9,
    0x00FF, 0x00D6, 0x00DC, 0x00A2, 0x00A3, 0x00A5, 0x20A7, 0x0192,
    0x00E1, 0x00ED, 0x00F3, 0x00FA, 0x00F1, 0x00D1, 0x00AA, 0x00BA,
    0x00BF, 0x2310, 0x00AC, 0x00BD, 0x00BC, 0x00A1, 0x00AB, 0x00BB,
    0x2591, 0x2592, 0x2593, 0x2502, 0x2524, 0x2561, 0x2562, 0x2556,
    0x2555, 0x2563, 0x2551, 0x2557, 0x255D, 0x255C, 0x255B, 0x2510,
    0x2514, 0x2534, 0x252C, 0x251C, 0x2500, 0x253C, 0x255E, 0x255F,
    0x255A, 0x2554, 0x2569, 0x2566, 0x2560, 0x2550, 0x256C, 0x2567,
    0x2568, 0x2564, 0x2565, 0x2559, 0x2558, 0x2552, 0x2553, 0x256B,
    0x256A, 0x2518, 0x250C, 0x2588, 0x2584, 0x258C, 0x2590, 0x2580,
    0x03B1, 0x00DF, 0x0393, 0x03C0, 0x03A3, 0x03C3, 0x00B5, 0x03C4,
    0x03A6, 0x0398, 0x03A9, 0x03B4, 0x221E, 0x03C6, 0x03B5, 0x2229,
    0x2261, 0x00B1, 0x2265, 0x2264, 0x2320, 0x2321, 0x00F7, 0x2248,
    0x00B0, 0x2219, 0x00B7, 0x221A, 0x207F, 0x00B2, 0x25A0, 0x00A0,
];

/// Unicode for CP850 0x80..=0xFF
const CP850_HIGH: [u16; 128] = [
    0x00C7, 0x00FC, 0x00E9, 0x00E2, 0x00E4, 0x00E0, 0x00E5, 0x00E7,
    0x00EA, 0x00EB, 0x00E8, 0x00EF, 0x00EE, 0x00EC, 0x00C4, 0x00C5,
    0x00C9, 0x00E6, 0x00C6, 0x00F4, 0x00F6, 0x00F2, 0x00FB, 0x00F9,
    0x00FF, 0x00D6, 0x00DC, 0x00F8, 0x00A3, 0x00D8, 0x00D7, 0x0192,
    0x00E1, 0x00ED, 0x00F3, 0x00FA, 0x00F1, 0x00D1, 0x00AA, 0x00BA,
    0x00BF, 0x00AE, 0x00AC, 0x00BD, 0x00BC, 0x00A1, 0x00AB, 0x00BB,
    0x2591, 0x2592, 0x2593, 0x2502, 0x2524, 0x00C1, 0x00C2, 0x00C0,
    0x00A9, 0x2563, 0x2551, 0x2557, 0x255D, 0x00A2, 0x00A5, 0x2510,
    0x2514, 0x2534, 0x252C, 0x251C, 0x2500, 0x253C, 0x00E3, 0x00C3,
    0x255A, 0x2554, 0x2569, 0x2566, 0x2560, 0x2550, 0x256C, 0x00A4,
    0x00F0, 0x00D0, 0x00CA, 0x00CB, 0x00C8, 0x0131, 0x00CD, 0x00CE,
    0x00CF, 0x2518, 0x250C, 0x2588, 0x2584, 0x00A6, 0x00CC, 0x2580,
    0x00D3, 0x00DF, 0x00D4, 0x00D2, 0x00F5, 0x00D5, 0x00B5, 0x00FE,
    0x00DE, 0x00DA, 0x00DB, 0x00D9, 0x00FD, 0x00DD, 0x00AF, 0x00B4,
    0x00AD, 0x00B1, 0x2017, 0x00BE, 0x00B6, 0x00A7, 0x00F7, 0x00B8,
    0x00B0, 0x00A8, 0x00B7, 0x00B9, 0x00B3, 0x00B2, 0x25A0, 0x00A0,
];

const EURO: u16 = 0x20AC;
const DOTLESS_I: u16 = 0x0131;
/// Euro sign slot in CP858
const CP858_EURO: u8 = 0xD5;
/// Euro sign slot in Windows-1252
const CP1252_EURO: u8 = 0x80;

/// Supported console codepages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codepage {
    /// OEM United States
    Cp437,
    /// OEM Multilingual Latin 1
    Cp850,
    /// CP850 with the euro sign
    Cp858,
}

impl Codepage {
    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            437 => Some(Self::Cp437),
            850 => Some(Self::Cp850),
            858 => Some(Self::Cp858),
            _ => None,
        }
    }

    fn high_half(self) -> &'static [u16; 128] {
        match self {
            Self::Cp437 => &CP437_HIGH,
            Self::Cp850 | Self::Cp858 => &CP850_HIGH,
        }
    }
}

fn cp1252_to_unicode(b: u8) -> u16 {
    match b {
        0x80..=0x9F => CP1252_C1[usize::from(b - 0x80)],
        _ => u16::from(b),
    }
}

fn unicode_to_console(codepage: Codepage, u: u16) -> u8 {
    if u < 0x80 {
        return u as u8;
    }
    match codepage {
        Codepage::Cp858 if u == EURO => CP858_EURO,
        _ => codepage
            .high_half()
            .iter()
            .position(|&c| c == u)
            .map_or_else(|| best_fit(u), |i| 0x80 + i as u8),
    }
}

/// ASCII stand-ins for characters missing from the target charset
fn best_fit(u: u16) -> u8 {
    match u {
        0x2018 | 0x2019 | 0x201A | 0x2039 | 0x203A => b'\'',
        0x201C | 0x201D | 0x201E => b'"',
        0x2013 | 0x2014 | 0x2017 => b'-',
        0x2026 | 0x2022 | 0x2219 | 0x00B7 => b'.',
        0x02C6 => b'^',
        0x02DC => b'~',
        0x0160 => b'S',
        0x0161 => b's',
        0x017D => b'Z',
        0x017E => b'z',
        0x0152 => b'O',
        0x0153 => b'o',
        0x0178 => b'Y',
        0x0131 => b'i',
        0x2500 | 0x2550 => b'-',
        0x2502 | 0x2551 => b'|',
        0x2500..=0x257F => b'+',
        _ => b'?',
    }
}

/// Bidirectional byte map between application and console charsets
#[derive(Clone)]
pub struct CodepageMap {
    codepage: Option<Codepage>,
    to_console: [u8; 256],
    to_app: [u8; 256],
}

impl std::fmt::Debug for CodepageMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodepageMap")
            .field("codepage", &self.codepage)
            .finish()
    }
}

impl CodepageMap {
    pub fn new(codepage: Codepage) -> Self {
        let table = codepage.high_half();
        let mut map = Self::identity();
        map.codepage = Some(codepage);

        for b in 0x80..=0xFFu8 {
            map.to_console[usize::from(b)] = unicode_to_console(codepage, cp1252_to_unicode(b));
        }

        for o in 0x80..=0xFFu8 {
            let u = table[usize::from(o - 0x80)];
            map.to_app[usize::from(o)] = if codepage == Codepage::Cp858 && u == DOTLESS_I {
                CP1252_EURO
            } else {
                (0x80..=0xFFu8)
                    .find(|&b| cp1252_to_unicode(b) == u)
                    .unwrap_or_else(|| best_fit(u))
            };
        }

        map
    }

    /// No transcoding, for consoles running an unsupported codepage
    pub fn identity() -> Self {
        let mut table = [0u8; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = i as u8;
        }
        Self {
            codepage: None,
            to_console: table,
            to_app: table,
        }
    }

    pub fn for_console(id: u32) -> Self {
        Codepage::from_id(id).map_or_else(Self::identity, Self::new)
    }

    pub fn codepage(&self) -> Option<Codepage> {
        self.codepage
    }

    pub fn to_console_byte(&self, b: u8) -> u8 {
        self.to_console[usize::from(b)]
    }

    pub fn to_app_byte(&self, b: u8) -> u8 {
        self.to_app[usize::from(b)]
    }

    pub fn to_console_in_place(&self, buf: &mut [u8]) {
        if self.codepage.is_none() {
            return;
        }
        for b in buf.iter_mut() {
            *b = self.to_console[usize::from(*b)];
        }
    }

    pub fn to_app_in_place(&self, buf: &mut [u8]) {
        if self.codepage.is_none() {
            return;
        }
        for b in buf.iter_mut() {
            *b = self.to_app[usize::from(*b)];
        }
    }
}
