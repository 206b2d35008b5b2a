//! Parsers for the numeric strings found in partition tables and packager
//! configs: hex addresses, decimal counts and sizes such as `"4K"`.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    Empty,
    InvalidDigit(char),
    MissingDigits,
    MissingUnit,
    InvalidUnit,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "empty string"),
            ParseError::InvalidDigit(c) => write!(f, "invalid digit {:?}", c),
            ParseError::MissingDigits => write!(f, "no digits found"),
            ParseError::MissingUnit => write!(f, "missing size unit"),
            ParseError::InvalidUnit => {
                write!(f, "invalid size unit, must be \"b/B/k/K/m/M/g/G\"")
            }
        }
    }
}

impl core::error::Error for ParseError {}

/// Parses base 16, with or without a `0x` prefix, reduced modulo 2^32.
pub fn hex2int(s: &str) -> Result<u32, ParseError> {
    parse_wrapping(s, 16)
}

/// Parses base 10, reduced modulo 2^32.
pub fn decimal2int(s: &str) -> Result<u32, ParseError> {
    parse_wrapping(s, 10)
}

fn parse_wrapping(s: &str, radix: u32) -> Result<u32, ParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ParseError::Empty);
    }

    let (negative, s) = match s.as_bytes()[0] {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    let (prefixed, s) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(rest) if radix == 16 => (true, rest),
        _ => (false, s),
    };

    // A single `_` may follow the base prefix or sit between two digits.
    let mut acc = 0u32;
    let mut digits = 0;
    let mut underscore_ok = prefixed;
    for c in s.chars() {
        if c == '_' {
            if !underscore_ok {
                return Err(ParseError::InvalidDigit(c));
            }
            underscore_ok = false;
            continue;
        }
        let d = c.to_digit(radix).ok_or(ParseError::InvalidDigit(c))?;
        acc = acc.wrapping_mul(radix).wrapping_add(d);
        digits += 1;
        underscore_ok = true;
    }
    if s.ends_with('_') {
        return Err(ParseError::InvalidDigit('_'));
    }
    if digits == 0 {
        return Err(ParseError::MissingDigits);
    }

    Ok(if negative { acc.wrapping_neg() } else { acc })
}

fn is_unit_char(c: char) -> bool {
    matches!(c, 'b' | 'B' | 'k' | 'K' | 'm' | 'M' | 'g' | 'G' | '|')
}

/// First maximal run of characters matching `pred`.
fn first_run(s: &str, pred: impl Fn(char) -> bool) -> Option<&str> {
    let start = s.find(|c: char| pred(c))?;
    let rest = &s[start..];
    let end = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Parses sizes such as `"512b"`, `"4K"`, `"16m"` or `"2G"` into bytes.
///
/// The unit must be a single letter; `"4KB"` is rejected.
pub fn size2int(s: &str) -> Result<u64, ParseError> {
    let digits = first_run(s, |c| c.is_ascii_digit()).ok_or(ParseError::MissingDigits)?;
    let size = decimal2int(digits)? as u64;

    let unit = first_run(s, is_unit_char).ok_or(ParseError::MissingUnit)?;
    let shift = match unit {
        "b" | "B" => 0,
        "k" | "K" => 10,
        "m" | "M" => 20,
        "g" | "G" => 30,
        _ => return Err(ParseError::InvalidUnit),
    };
    Ok(size << shift)
}

/// Config booleans are the literal `TRUE`; everything else is false.
pub fn parse_bool(s: &str) -> bool {
    s == "TRUE"
}
