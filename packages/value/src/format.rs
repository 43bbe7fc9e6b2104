//! Printf-style numeric formats.
//!
//! The interpreter renders non-integral numbers through a user-settable
//! format string (CONVFMT). Only the numeric conversions make sense there,
//! so `NumberFormat` accepts exactly one of `d i e E f F g G`, with the usual
//! flags, width and precision, surrounded by literal text.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::FormatError;

/// Default conversion used when no format has been configured.
pub const DEFAULT_CONVFMT: &str = "%.6g";

/// Largest width or precision accepted in a format.
pub const MAX_FIELD: usize = u16::MAX as usize;

/// A parsed printf-style numeric format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NumberFormat {
    source: String,
    prefix: String,
    suffix: String,
    conversion: Conversion,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Flags {
    left_align: bool,
    plus: bool,
    space: bool,
    alternate: bool,
    zero_pad: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Integer,
    Fixed,
    Exponent,
    General,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Conversion {
    flags: Flags,
    width: usize,
    precision: Option<usize>,
    kind: Kind,
    upper: bool,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            source: DEFAULT_CONVFMT.to_string(),
            prefix: String::new(),
            suffix: String::new(),
            conversion: Conversion {
                flags: Flags::default(),
                width: 0,
                precision: Some(6),
                kind: Kind::General,
                upper: false,
            },
        }
    }
}

impl std::fmt::Display for NumberFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for NumberFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl NumberFormat {
    /// Parse a format string such as `"%.6g"` or `"n=%08.3f"`.
    pub fn parse(spec: &str) -> Result<Self, FormatError> {
        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut conversion = None;
        let mut chars = spec.char_indices().peekable();

        while let Some((position, c)) = chars.next() {
            let literal = if c != '%' {
                Some(c)
            } else if matches!(chars.peek(), Some((_, '%'))) {
                chars.next();
                Some('%')
            } else {
                None
            };

            match literal {
                Some(c) if conversion.is_some() => suffix.push(c),
                Some(c) => prefix.push(c),
                None => {
                    if conversion.is_some() {
                        return Err(FormatError::MultipleConversions {
                            spec: spec.to_string(),
                        });
                    }
                    conversion = Some(parse_conversion(spec, position, &mut chars)?);
                }
            }
        }

        let conversion = conversion.ok_or_else(|| FormatError::MissingConversion {
            spec: spec.to_string(),
        })?;

        Ok(Self {
            source: spec.to_string(),
            prefix,
            suffix,
            conversion,
        })
    }

    /// The format string this was parsed from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Render a number through this format.
    pub fn format(&self, x: f64) -> String {
        let body = self.conversion.render(x);
        let mut out = String::with_capacity(self.prefix.len() + body.len() + self.suffix.len());
        out.push_str(&self.prefix);
        out.push_str(&body);
        out.push_str(&self.suffix);
        out
    }
}

fn parse_conversion(
    spec: &str,
    start: usize,
    chars: &mut Peekable<CharIndices<'_>>,
) -> Result<Conversion, FormatError> {
    let malformed = |position: usize| FormatError::Malformed {
        spec: spec.to_string(),
        position,
    };

    let mut flags = Flags::default();
    while let Some(&(_, c)) = chars.peek() {
        match c {
            '-' => flags.left_align = true,
            '+' => flags.plus = true,
            ' ' => flags.space = true,
            '#' => flags.alternate = true,
            '0' => flags.zero_pad = true,
            _ => break,
        }
        chars.next();
    }

    let width = parse_number(chars).ok_or_else(|| malformed(start))?;

    let precision = if matches!(chars.peek(), Some((_, '.'))) {
        chars.next();
        Some(parse_number(chars).ok_or_else(|| malformed(start))?)
    } else {
        None
    };

    let (position, c) = chars.next().ok_or_else(|| malformed(spec.len()))?;
    let (kind, upper) = match c {
        'd' | 'i' => (Kind::Integer, false),
        'f' => (Kind::Fixed, false),
        'F' => (Kind::Fixed, true),
        'e' => (Kind::Exponent, false),
        'E' => (Kind::Exponent, true),
        'g' => (Kind::General, false),
        'G' => (Kind::General, true),
        c if c.is_ascii_alphabetic() => {
            return Err(FormatError::UnsupportedConversion {
                spec: spec.to_string(),
                conversion: c,
            })
        }
        _ => return Err(malformed(position)),
    };

    Ok(Conversion {
        flags,
        width,
        precision,
        kind,
        upper,
    })
}

/// Parse a run of decimal digits; an empty run is zero. `None` above
/// [`MAX_FIELD`].
fn parse_number(chars: &mut Peekable<CharIndices<'_>>) -> Option<usize> {
    let mut n: usize = 0;
    while let Some(&(_, c)) = chars.peek() {
        let Some(digit) = c.to_digit(10) else {
            break;
        };
        n = n.checked_mul(10)?.checked_add(digit as usize)?;
        if n > MAX_FIELD {
            return None;
        }
        chars.next();
    }
    Some(n)
}

impl Conversion {
    fn render(&self, x: f64) -> String {
        let (negative, body) = if !x.is_finite() {
            let word = if x.is_nan() { "nan" } else { "inf" };
            let word = if self.upper {
                word.to_uppercase()
            } else {
                word.to_string()
            };
            (x.is_sign_negative() && !x.is_nan(), word)
        } else {
            match self.kind {
                Kind::Integer => {
                    let t = x.trunc();
                    let mut digits = format!("{:.0}", t.abs());
                    if let Some(min_digits) = self.precision {
                        if digits.len() < min_digits {
                            digits = format!("{:0>width$}", digits, width = min_digits);
                        }
                    }
                    (t < 0.0, digits)
                }
                Kind::Fixed => {
                    let mut s = format!("{:.*}", self.precision.unwrap_or(6), x.abs());
                    if self.flags.alternate && !s.contains('.') {
                        s.push('.');
                    }
                    (x.is_sign_negative(), s)
                }
                Kind::Exponent => (
                    x.is_sign_negative(),
                    exponential(
                        x.abs(),
                        self.precision.unwrap_or(6),
                        self.upper,
                        self.flags.alternate,
                    ),
                ),
                Kind::General => (
                    x.is_sign_negative(),
                    general(x.abs(), self.precision, self.upper, self.flags.alternate),
                ),
            }
        };

        let sign = if negative {
            "-"
        } else if self.flags.plus {
            "+"
        } else if self.flags.space {
            " "
        } else {
            ""
        };

        let len = sign.len() + body.len();
        if len >= self.width {
            return format!("{}{}", sign, body);
        }
        let pad = self.width - len;

        // '0' is ignored for left alignment, non-finite values, and %d with a precision.
        let zero_pad = self.flags.zero_pad
            && !self.flags.left_align
            && x.is_finite()
            && !(self.kind == Kind::Integer && self.precision.is_some());

        if self.flags.left_align {
            format!("{}{}{}", sign, body, " ".repeat(pad))
        } else if zero_pad {
            format!("{}{}{}", sign, "0".repeat(pad), body)
        } else {
            format!("{}{}{}", " ".repeat(pad), sign, body)
        }
    }
}

/// `%e` for a non-negative magnitude: sign and at least two exponent digits.
fn exponential(magnitude: f64, precision: usize, upper: bool, alternate: bool) -> String {
    let raw = format!("{:.*e}", precision, magnitude);
    let (mantissa, exponent) = match raw.split_once('e') {
        Some((m, e)) => (m.to_string(), e.parse::<i32>().unwrap_or(0)),
        None => (raw.clone(), 0),
    };
    let mut out = mantissa;
    if alternate && precision == 0 {
        out.push('.');
    }
    out.push(if upper { 'E' } else { 'e' });
    out.push(if exponent < 0 { '-' } else { '+' });
    out.push_str(&format!("{:02}", exponent.unsigned_abs()));
    out
}

/// `%g` for a non-negative magnitude.
fn general(magnitude: f64, precision: Option<usize>, upper: bool, alternate: bool) -> String {
    let p = match precision {
        None => 6,
        Some(0) => 1,
        Some(p) => p,
    };

    // The exponent is taken after rounding to `p` significant digits.
    let exponent = format!("{:.*e}", p - 1, magnitude)
        .split_once('e')
        .and_then(|(_, e)| e.parse::<i64>().ok())
        .unwrap_or(0);

    let out = if exponent < -4 || exponent >= p as i64 {
        exponential(magnitude, p - 1, upper, alternate)
    } else {
        let decimals = (p as i64 - 1 - exponent) as usize;
        // Small magnitudes can ask for a few digits past MAX_FIELD; those are zeros.
        let rendered = decimals.min(MAX_FIELD);
        let mut s = format!("{:.*}", rendered, magnitude);
        s.push_str(&"0".repeat(decimals - rendered));
        if alternate && !s.contains('.') {
            s.push('.');
        }
        s
    };

    if alternate {
        out
    } else {
        strip_trailing_zeros(&out)
    }
}

fn strip_trailing_zeros(s: &str) -> String {
    let split = s.find(['e', 'E']).unwrap_or(s.len());
    let (mantissa, exponent) = s.split_at(split);
    if !mantissa.contains('.') {
        return s.to_string();
    }
    let trimmed = mantissa.trim_end_matches('0').trim_end_matches('.');
    format!("{}{}", trimmed, exponent)
}
