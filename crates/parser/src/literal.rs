//! Go string and rune literal decoding.
//!
//! Used by the lexer to validate literals and by callers that need the value
//! of an import path or a struct tag.

use std::borrow::Cow;

use crate::error::LexErrorKind;

#[inline(always)]
pub const fn is_dec_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

const HEX_LUT: [u8; 256] = {
    let mut t = [0xFFu8; 256];

    let mut i = b'0';
    while i <= b'9' {
        t[i as usize] = i - b'0';
        i += 1;
    }

    let mut i = b'a';
    while i <= b'f' {
        t[i as usize] = (i - b'a') + 10;
        t[(i - 32) as usize] = (i - b'a') + 10;
        i += 1;
    }

    t
};

#[inline(always)]
pub const fn is_hex_digit(b: u8) -> bool {
    HEX_LUT[b as usize] != 0xFF
}

#[inline(always)]
const fn hex_value(b: u8) -> u32 {
    HEX_LUT[b as usize] as u32
}

#[inline(always)]
const fn is_valid_unicode_scalar(x: u32) -> bool {
    x <= 0x10_FFFF && !(x >= 0xD800 && x <= 0xDFFF)
}

/// Decodes a quoted Go string literal (interpreted or raw).
///
/// Borrows from the input when the body contains no escapes.
pub fn unquote(raw: &str) -> Result<Cow<'_, str>, LexErrorKind> {
    let bytes = raw.as_bytes();
    if bytes.len() < 2 {
        return Err(LexErrorKind::InvalidToken);
    }
    let quote = bytes[0];
    if bytes[bytes.len() - 1] != quote {
        return Err(LexErrorKind::InvalidToken);
    }
    let body = &raw[1..raw.len() - 1];

    match quote {
        b'`' => {
            if body.contains('`') {
                return Err(LexErrorKind::InvalidToken);
            }
            // Carriage returns are discarded from raw strings.
            if body.contains('\r') {
                Ok(Cow::Owned(body.replace('\r', "")))
            } else {
                Ok(Cow::Borrowed(body))
            }
        }
        b'"' => {
            if !body.contains('\\') {
                if body.contains(['"', '\n']) {
                    return Err(LexErrorKind::InvalidToken);
                }
                return Ok(Cow::Borrowed(body));
            }
            let mut out = Vec::with_capacity(body.len());
            let b = body.as_bytes();
            let mut i = 0;
            while i < b.len() {
                match b[i] {
                    b'\\' => {
                        i += 1;
                        decode_escape(b, &mut i, b'"', &mut out)?;
                    }
                    b'"' | b'\n' => return Err(LexErrorKind::InvalidToken),
                    c => {
                        out.push(c);
                        i += 1;
                    }
                }
            }
            // \x and octal escapes may produce invalid UTF-8; keep what decodes.
            Ok(Cow::Owned(String::from_utf8_lossy(&out).into_owned()))
        }
        _ => Err(LexErrorKind::InvalidToken),
    }
}

/// Decodes a Go rune literal such as `'a'`, `'\n'` or `'é'`.
pub fn unquote_char(raw: &str) -> Result<char, LexErrorKind> {
    let bytes = raw.as_bytes();
    if bytes.len() < 3 || bytes[0] != b'\'' || bytes[bytes.len() - 1] != b'\'' {
        return Err(LexErrorKind::InvalidToken);
    }
    let body = &raw[1..raw.len() - 1];
    let b = body.as_bytes();

    if b[0] != b'\\' {
        let mut chars = body.chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) if c != '\n' && c != '\'' => Ok(c),
            _ => Err(LexErrorKind::InvalidToken),
        };
    }

    let mut out = Vec::with_capacity(4);
    let mut i = 1;
    let value = decode_escape(b, &mut i, b'\'', &mut out)?;
    if i != b.len() {
        return Err(LexErrorKind::InvalidToken);
    }
    char::from_u32(value).ok_or(LexErrorKind::InvalidEscape)
}

/// Decodes one escape; `i` points just past the backslash.
///
/// Appends the UTF-8 (or raw byte) encoding to `out` and returns the code
/// point value.
fn decode_escape(
    b: &[u8],
    i: &mut usize,
    quote: u8,
    out: &mut Vec<u8>,
) -> Result<u32, LexErrorKind> {
    let c = *b.get(*i).ok_or(LexErrorKind::InvalidEscape)?;
    *i += 1;

    let simple = match c {
        b'a' => Some(0x07),
        b'b' => Some(0x08),
        b'f' => Some(0x0C),
        b'n' => Some(b'\n'),
        b'r' => Some(b'\r'),
        b't' => Some(b'\t'),
        b'v' => Some(0x0B),
        b'\\' => Some(b'\\'),
        q if q == quote => Some(q),
        _ => None,
    };
    if let Some(byte) = simple {
        out.push(byte);
        return Ok(byte as u32);
    }

    match c {
        b'x' => {
            let v = take_digits(b, i, 2, 16)?;
            out.push(v as u8);
            Ok(v)
        }
        b'u' | b'U' => {
            let width = if c == b'u' { 4 } else { 8 };
            let v = take_digits(b, i, width, 16)?;
            if !is_valid_unicode_scalar(v) {
                return Err(LexErrorKind::InvalidEscape);
            }
            let ch = char::from_u32(v).ok_or(LexErrorKind::InvalidEscape)?;
            let mut buf = [0u8; 4];
            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            Ok(v)
        }
        b'0'..=b'7' => {
            *i -= 1;
            let v = take_digits(b, i, 3, 8)?;
            if v > 255 {
                return Err(LexErrorKind::InvalidEscape);
            }
            out.push(v as u8);
            Ok(v)
        }
        _ => Err(LexErrorKind::InvalidEscape),
    }
}

fn take_digits(b: &[u8], i: &mut usize, width: usize, radix: u32) -> Result<u32, LexErrorKind> {
    let digits = b
        .get(*i..*i + width)
        .ok_or(LexErrorKind::InvalidEscape)?;
    let mut v = 0u32;
    for &d in digits {
        let ok = match radix {
            8 => (b'0'..=b'7').contains(&d),
            _ => is_hex_digit(d),
        };
        if !ok {
            return Err(LexErrorKind::InvalidEscape);
        }
        v = v * radix + hex_value(d);
    }
    *i += width;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borrows_plain_strings() {
        assert!(matches!(unquote(r#""fmt""#), Ok(Cow::Borrowed("fmt"))));
        assert!(matches!(unquote("`a\"b`"), Ok(Cow::Borrowed("a\"b"))));
    }

    #[test]
    fn decodes_escapes() {
        assert_eq!(unquote(r#""a\tb\"c""#).unwrap(), "a\tb\"c");
        assert_eq!(unquote(r#""é\101""#).unwrap(), "éA");
        assert_eq!(unquote("`x\r\ny`").unwrap(), "x\ny");
    }

    #[test]
    fn rejects_bad_escapes() {
        assert_eq!(unquote(r#""\q""#), Err(LexErrorKind::InvalidEscape));
        assert_eq!(unquote(r#""\'""#), Err(LexErrorKind::InvalidEscape));
        assert_eq!(unquote(r#""\400""#), Err(LexErrorKind::InvalidEscape));
        assert_eq!(unquote(r#""\uD800""#), Err(LexErrorKind::InvalidEscape));
    }

    #[test]
    fn runes() {
        assert_eq!(unquote_char("'a'"), Ok('a'));
        assert_eq!(unquote_char("'世'"), Ok('世'));
        assert_eq!(unquote_char(r"'\''"), Ok('\''));
        assert_eq!(unquote_char(r"'\x41'"), Ok('A'));
        assert!(unquote_char("'ab'").is_err());
        assert!(unquote_char(r#"'\"'"#).is_err());
    }
}
