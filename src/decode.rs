//! Record decoding for `<key>;<value>` lines.
//!
//! Values are returned as tenths (`-12.3` becomes `-123`). The fast path reads
//! the fixed `-?d?d.d` layout from the tail of the line with integer
//! arithmetic only. Lines that do not match it can be retried through
//! [`decode_lenient`], which accepts any decimal `fast-float` understands.

use memchr::memrchr;

/// Outcome of decoding one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded<'a> {
    Record { key: &'a [u8], value: i32 },
    Empty,
    Malformed,
}

#[inline(always)]
fn digit(b: u8) -> i32 {
    (b - b'0') as i32
}

/// Decode a line that satisfies the fixed format: `key;d.d`, `key;-d.d`,
/// `key;dd.d` or `key;-dd.d`. Returns `None` for anything else.
///
/// The returned key borrows from `line`.
#[inline]
pub fn decode_fixed(line: &[u8]) -> Option<(&[u8], i32)> {
    let end = line.len();
    if end < 4 {
        return None;
    }

    let tenths = line[end - 1];
    let ones = line[end - 3];
    if !tenths.is_ascii_digit() || line[end - 2] != b'.' || !ones.is_ascii_digit() {
        return None;
    }
    let low = digit(ones) * 10 + digit(tenths);

    match line[end - 4] {
        b';' => Some((&line[..end - 4], low)),
        b'-' if end >= 5 && line[end - 5] == b';' => Some((&line[..end - 5], -low)),
        c if c.is_ascii_digit() && end >= 5 => {
            let value = digit(c) * 100 + low;
            match line[end - 5] {
                b';' => Some((&line[..end - 5], value)),
                b'-' if end >= 6 && line[end - 6] == b';' => Some((&line[..end - 6], -value)),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Slow path for lines the fixed decoder rejects: splits at the last `;`,
/// trims ASCII whitespace around the value and parses it as a decimal,
/// rounding to the nearest tenth.
pub fn decode_lenient(line: &[u8]) -> Option<(&[u8], i32)> {
    let sep = memrchr(b';', line)?;
    let key = &line[..sep];
    let raw = line[sep + 1..].trim_ascii();
    if raw.is_empty() {
        return None;
    }
    let value: f64 = fast_float::parse(raw).ok()?;
    let scaled = (value * 10.0).round();
    if !scaled.is_finite() || scaled < i32::MIN as f64 || scaled > i32::MAX as f64 {
        return None;
    }
    Some((key, scaled as i32))
}

/// Decode one line (without its terminator). With `strict` set, lines that
/// miss the fixed format are reported as malformed without a retry.
#[inline]
pub fn decode_record(line: &[u8], strict: bool) -> Decoded<'_> {
    if line.is_empty() {
        return Decoded::Empty;
    }
    let parsed = match decode_fixed(line) {
        Some(parsed) => Some(parsed),
        None if strict => None,
        None => decode_lenient(line),
    };
    match parsed {
        Some((key, value)) => Decoded::Record { key, value },
        None => Decoded::Malformed,
    }
}
