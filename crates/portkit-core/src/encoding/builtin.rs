//! Self-contained transcoder for the Unicode encodings and their 8-bit
//! subsets.
//!
//! Works one character at a time: a character is consumed only once its
//! target representation has been written, so a full output buffer or a
//! truncated input sequence never loses position.

use super::{Conversion, ConvertStatus};

/// A character set the builtin backend understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Utf8,
    /// Byte order from a leading BOM, big-endian without one. Written
    /// big-endian with a BOM.
    Utf16,
    Utf16Le,
    Utf16Be,
    /// Same BOM rules as [`Charset::Utf16`].
    Utf32,
    Utf32Le,
    Utf32Be,
    Ascii,
    Latin1,
}

impl Charset {
    /// Look a charset up by name. Case, `-`, `_` and spaces are ignored.
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .map(|c| c.to_ascii_uppercase())
            .collect();

        let charset = match key.as_str() {
            "UTF8" => Charset::Utf8,
            "UTF16" => Charset::Utf16,
            "UTF16LE" => Charset::Utf16Le,
            "UTF16BE" => Charset::Utf16Be,
            "UTF32" => Charset::Utf32,
            "UTF32LE" => Charset::Utf32Le,
            "UTF32BE" => Charset::Utf32Be,
            "ASCII" | "USASCII" | "ANSIX3.41968" => Charset::Ascii,
            "ISO88591" | "LATIN1" | "L1" => Charset::Latin1,
            _ => return None,
        };
        Some(charset)
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::Utf16 => "UTF-16",
            Charset::Utf16Le => "UTF-16LE",
            Charset::Utf16Be => "UTF-16BE",
            Charset::Utf32 => "UTF-32",
            Charset::Utf32Le => "UTF-32LE",
            Charset::Utf32Be => "UTF-32BE",
            Charset::Ascii => "US-ASCII",
            Charset::Latin1 => "ISO-8859-1",
        }
    }

    fn has_bom(self) -> bool {
        matches!(self, Charset::Utf16 | Charset::Utf32)
    }

    fn endian(self) -> Endian {
        match self {
            Charset::Utf16Le | Charset::Utf32Le => Endian::Little,
            _ => Endian::Big,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endian {
    Little,
    Big,
}

enum Decoded {
    Char(char, usize),
    Incomplete,
    Invalid,
}

enum BomScan {
    NeedMore,
    Found(Endian, usize),
    Absent,
}

/// Stateful converter between two [`Charset`]s.
#[derive(Debug)]
pub(super) struct UnicodeCodec {
    from: Charset,
    to: Charset,
    source_endian: Endian,
    awaiting_bom: bool,
    bom_pending: bool,
}

impl UnicodeCodec {
    pub(super) fn new(to: &str, from: &str) -> Option<Self> {
        let to = Charset::from_name(to)?;
        let from = Charset::from_name(from)?;
        Some(Self {
            from,
            to,
            source_endian: from.endian(),
            awaiting_bom: from.has_bom(),
            bom_pending: to.has_bom(),
        })
    }

    pub(super) fn convert(&mut self, input: &[u8], output: &mut [u8]) -> Conversion {
        let mut consumed = 0;
        let mut produced = 0;

        let status = loop {
            let rest = &input[consumed..];
            if rest.is_empty() {
                break ConvertStatus::Complete;
            }

            if self.awaiting_bom {
                match scan_bom(self.from, rest) {
                    BomScan::NeedMore => break ConvertStatus::IncompleteInput,
                    BomScan::Found(endian, len) => {
                        self.source_endian = endian;
                        self.awaiting_bom = false;
                        consumed += len;
                        continue;
                    }
                    BomScan::Absent => self.awaiting_bom = false,
                }
            }

            let (c, len) = match self.decode(rest) {
                Decoded::Char(c, len) => (c, len),
                Decoded::Incomplete => break ConvertStatus::IncompleteInput,
                Decoded::Invalid => break ConvertStatus::InvalidInput,
            };

            let mut buf = [0u8; 8];
            let Some(n) = self.encode(c, &mut buf) else {
                break ConvertStatus::InvalidInput;
            };
            if n > output.len() - produced {
                break ConvertStatus::OutputFull;
            }

            output[produced..produced + n].copy_from_slice(&buf[..n]);
            produced += n;
            consumed += len;
            self.bom_pending = false;
        };

        Conversion {
            consumed,
            produced,
            status,
        }
    }

    fn decode(&self, input: &[u8]) -> Decoded {
        match self.from {
            Charset::Utf8 => decode_utf8(input),
            Charset::Utf16 | Charset::Utf16Le | Charset::Utf16Be => {
                decode_utf16(input, self.source_endian)
            }
            Charset::Utf32 | Charset::Utf32Le | Charset::Utf32Be => {
                decode_utf32(input, self.source_endian)
            }
            Charset::Ascii => match input.first() {
                Some(&b) if b.is_ascii() => Decoded::Char(char::from(b), 1),
                Some(_) => Decoded::Invalid,
                None => Decoded::Incomplete,
            },
            Charset::Latin1 => match input.first() {
                Some(&b) => Decoded::Char(char::from(b), 1),
                None => Decoded::Incomplete,
            },
        }
    }

    /// Encode `c` (preceded by the BOM if one is still owed) into `buf`.
    /// `None` if the target cannot represent `c`.
    fn encode(&self, c: char, buf: &mut [u8; 8]) -> Option<usize> {
        let mut len = 0;
        if self.bom_pending {
            len += encode_unit(self.to, '\u{FEFF}', &mut buf[..4])?;
        }
        len += encode_unit(self.to, c, &mut buf[len..len + 4])?;
        Some(len)
    }
}

fn scan_bom(charset: Charset, input: &[u8]) -> BomScan {
    let width = match charset {
        Charset::Utf16 => 2,
        Charset::Utf32 => 4,
        _ => return BomScan::Absent,
    };
    if input.len() < width {
        return BomScan::NeedMore;
    }
    match &input[..width] {
        [0xFE, 0xFF] | [0x00, 0x00, 0xFE, 0xFF] => BomScan::Found(Endian::Big, width),
        [0xFF, 0xFE] | [0xFF, 0xFE, 0x00, 0x00] => BomScan::Found(Endian::Little, width),
        _ => BomScan::Absent,
    }
}

fn decode_utf8(input: &[u8]) -> Decoded {
    let window = &input[..input.len().min(4)];
    let valid = match std::str::from_utf8(window) {
        Ok(s) => s,
        Err(e) if e.valid_up_to() > 0 => match std::str::from_utf8(&window[..e.valid_up_to()]) {
            Ok(s) => s,
            Err(_) => return Decoded::Invalid,
        },
        Err(e) => {
            return match e.error_len() {
                None => Decoded::Incomplete,
                Some(_) => Decoded::Invalid,
            }
        }
    };
    match valid.chars().next() {
        Some(c) => Decoded::Char(c, c.len_utf8()),
        None => Decoded::Incomplete,
    }
}

fn read_u16(bytes: &[u8], endian: Endian) -> u16 {
    let pair = [bytes[0], bytes[1]];
    match endian {
        Endian::Little => u16::from_le_bytes(pair),
        Endian::Big => u16::from_be_bytes(pair),
    }
}

fn decode_utf16(input: &[u8], endian: Endian) -> Decoded {
    if input.len() < 2 {
        return Decoded::Incomplete;
    }
    let unit = read_u16(input, endian);
    match unit {
        0xD800..=0xDBFF => {
            if input.len() < 4 {
                return Decoded::Incomplete;
            }
            let low = read_u16(&input[2..], endian);
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Decoded::Invalid;
            }
            let scalar = 0x10000 + ((u32::from(unit) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
            match char::from_u32(scalar) {
                Some(c) => Decoded::Char(c, 4),
                None => Decoded::Invalid,
            }
        }
        0xDC00..=0xDFFF => Decoded::Invalid,
        _ => match char::from_u32(u32::from(unit)) {
            Some(c) => Decoded::Char(c, 2),
            None => Decoded::Invalid,
        },
    }
}

fn decode_utf32(input: &[u8], endian: Endian) -> Decoded {
    if input.len() < 4 {
        return Decoded::Incomplete;
    }
    let quad = [input[0], input[1], input[2], input[3]];
    let scalar = match endian {
        Endian::Little => u32::from_le_bytes(quad),
        Endian::Big => u32::from_be_bytes(quad),
    };
    match char::from_u32(scalar) {
        Some(c) => Decoded::Char(c, 4),
        None => Decoded::Invalid,
    }
}

/// Encode one character without any BOM. `out` must hold 4 bytes.
fn encode_unit(charset: Charset, c: char, out: &mut [u8]) -> Option<usize> {
    let endian = charset.endian();
    match charset {
        Charset::Utf8 => Some(c.encode_utf8(out).len()),
        Charset::Utf16 | Charset::Utf16Le | Charset::Utf16Be => {
            let mut units = [0u16; 2];
            let units = c.encode_utf16(&mut units);
            for (i, unit) in units.iter().enumerate() {
                let bytes = match endian {
                    Endian::Little => unit.to_le_bytes(),
                    Endian::Big => unit.to_be_bytes(),
                };
                out[i * 2..i * 2 + 2].copy_from_slice(&bytes);
            }
            Some(units.len() * 2)
        }
        Charset::Utf32 | Charset::Utf32Le | Charset::Utf32Be => {
            let bytes = match endian {
                Endian::Little => u32::from(c).to_le_bytes(),
                Endian::Big => u32::from(c).to_be_bytes(),
            };
            out[..4].copy_from_slice(&bytes);
            Some(4)
        }
        Charset::Ascii => {
            let b = u8::try_from(c).ok().filter(u8::is_ascii)?;
            out[0] = b;
            Some(1)
        }
        Charset::Latin1 => {
            out[0] = u8::try_from(c).ok()?;
            Some(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(to: &str, from: &str) -> UnicodeCodec {
        UnicodeCodec::new(to, from).unwrap()
    }

    #[test]
    fn test_charset_names() {
        assert_eq!(Charset::from_name("utf-8"), Some(Charset::Utf8));
        assert_eq!(Charset::from_name("UTF_16le"), Some(Charset::Utf16Le));
        assert_eq!(Charset::from_name("latin1"), Some(Charset::Latin1));
        assert_eq!(Charset::from_name("ANSI_X3.4-1968"), Some(Charset::Ascii));
        assert_eq!(Charset::from_name("EBCDIC-US"), None);
        assert_eq!(Charset::Utf32Be.name(), "UTF-32BE");
    }

    #[test]
    fn test_utf8_to_utf16le() {
        let mut c = codec("UTF-16LE", "UTF-8");
        let mut out = [0u8; 16];
        let step = c.convert("aé€".as_bytes(), &mut out);
        assert_eq!(step.status, ConvertStatus::Complete);
        assert_eq!(step.consumed, 6);
        assert_eq!(&out[..step.produced], &[0x61, 0, 0xE9, 0, 0xAC, 0x20]);
    }

    #[test]
    fn test_astral_char_uses_surrogates() {
        let mut c = codec("UTF-16BE", "UTF-8");
        let mut out = [0u8; 4];
        let step = c.convert("𝄞".as_bytes(), &mut out);
        assert_eq!(step.status, ConvertStatus::Complete);
        assert_eq!(out, [0xD8, 0x34, 0xDD, 0x1E]);

        let mut back = codec("UTF-8", "UTF-16BE");
        let mut utf8 = [0u8; 4];
        let step = back.convert(&out, &mut utf8);
        assert_eq!(step.consumed, 4);
        assert_eq!(&utf8[..step.produced], "𝄞".as_bytes());
    }

    #[test]
    fn test_truncated_utf8_is_not_consumed() {
        let mut c = codec("UTF-16LE", "UTF-8");
        let mut out = [0u8; 8];
        let euro = "€".as_bytes();
        let step = c.convert(&[b'x', euro[0], euro[1]], &mut out);
        assert_eq!(step.status, ConvertStatus::IncompleteInput);
        assert_eq!(step.consumed, 1);
        assert_eq!(step.produced, 2);
    }

    #[test]
    fn test_lone_low_surrogate_is_invalid() {
        let mut c = codec("UTF-8", "UTF-16LE");
        let mut out = [0u8; 8];
        let step = c.convert(&[0x41, 0x00, 0x00, 0xDC], &mut out);
        assert_eq!(step.status, ConvertStatus::InvalidInput);
        assert_eq!(step.consumed, 2);
        assert_eq!(&out[..step.produced], b"A");
    }

    #[test]
    fn test_unpaired_high_surrogate_is_invalid() {
        let mut c = codec("UTF-8", "UTF-16BE");
        let mut out = [0u8; 8];
        let step = c.convert(&[0xD8, 0x00, 0x00, 0x41], &mut out);
        assert_eq!(step.status, ConvertStatus::InvalidInput);
        assert_eq!(step.consumed, 0);
    }

    #[test]
    fn test_bom_detection() {
        let mut c = codec("UTF-8", "UTF-16");
        let mut out = [0u8; 8];
        let step = c.convert(&[0xFF, 0xFE, b'h', 0, b'i', 0], &mut out);
        assert_eq!(step.status, ConvertStatus::Complete);
        assert_eq!(step.consumed, 6);
        assert_eq!(&out[..step.produced], b"hi");

        // Without a BOM the input is big-endian
        let mut c = codec("UTF-8", "UTF-16");
        let step = c.convert(&[0, b'h', 0, b'i'], &mut out);
        assert_eq!(&out[..step.produced], b"hi");
    }

    #[test]
    fn test_bom_written_once_with_first_char() {
        let mut c = codec("UTF-32", "UTF-8");
        let mut out = [0u8; 16];

        // Room for the character but not the BOM in front of it
        let step = c.convert(b"a", &mut out[..4]);
        assert_eq!(step.status, ConvertStatus::OutputFull);
        assert_eq!(step.consumed, 0);

        let step = c.convert(b"a", &mut out);
        assert_eq!(&out[..step.produced], &[0, 0, 0xFE, 0xFF, 0, 0, 0, b'a']);

        let step = c.convert(b"b", &mut out);
        assert_eq!(&out[..step.produced], &[0, 0, 0, b'b']);
    }

    #[test]
    fn test_unrepresentable_char_is_invalid_input() {
        let mut c = codec("ISO-8859-1", "UTF-8");
        let mut out = [0u8; 8];
        let step = c.convert("é€".as_bytes(), &mut out);
        assert_eq!(step.status, ConvertStatus::InvalidInput);
        assert_eq!(step.consumed, 2);
        assert_eq!(&out[..step.produced], &[0xE9]);

        let mut ascii = codec("US-ASCII", "ISO-8859-1");
        let step = ascii.convert(&[b'o', 0xE9], &mut out);
        assert_eq!(step.status, ConvertStatus::InvalidInput);
        assert_eq!(step.produced, 1);
    }

    #[test]
    fn test_utf32_rejects_out_of_range_scalars() {
        let mut c = codec("UTF-8", "UTF-32LE");
        let mut out = [0u8; 8];
        let step = c.convert(&[0x00, 0x00, 0x11, 0x00], &mut out);
        assert_eq!(step.status, ConvertStatus::InvalidInput);
        assert_eq!(step.consumed, 0);
    }
}
