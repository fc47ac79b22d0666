//! printf-style conversion specs
//!
//! Shared by message argument expansion (`"user %s logged in"`) and the
//! percent formatting style (`"%(levelname)-8s %(message)s"`).

use super::error::{LoggerError, Result};
use super::value::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Flags {
    pub left: bool,
    pub zero: bool,
    pub plus: bool,
    pub space: bool,
    pub alt: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Conversion {
    pub key: Option<String>,
    pub flags: Flags,
    pub width: Option<usize>,
    pub precision: Option<usize>,
    pub kind: char,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Piece {
    Literal(String),
    Spec(Conversion),
}

const CONVERSIONS: &str = "diouxXeEfFgGcrsa";

/// Split a template into literal text and conversion specs.
pub(crate) fn parse(template: &str) -> Result<Vec<Piece>> {
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }
        if let Some(&(_, '%')) = chars.peek() {
            chars.next();
            literal.push('%');
            continue;
        }

        let mut conversion = Conversion {
            key: None,
            flags: Flags::default(),
            width: None,
            precision: None,
            kind: 's',
        };

        if let Some(&(_, '(')) = chars.peek() {
            chars.next();
            let mut key = String::new();
            let mut depth = 1;
            loop {
                match chars.next() {
                    Some((_, '(')) => {
                        depth += 1;
                        key.push('(');
                    }
                    Some((_, ')')) => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                        key.push(')');
                    }
                    Some((_, ch)) => key.push(ch),
                    None => return Err(LoggerError::format("incomplete format key")),
                }
            }
            conversion.key = Some(key);
        }

        while let Some(&(_, flag)) = chars.peek() {
            match flag {
                '-' => conversion.flags.left = true,
                '0' => conversion.flags.zero = true,
                '+' => conversion.flags.plus = true,
                ' ' => conversion.flags.space = true,
                '#' => conversion.flags.alt = true,
                _ => break,
            }
            chars.next();
        }

        if let Some(&(_, '*')) = chars.peek() {
            return Err(LoggerError::format("'*' width is not supported"));
        }
        conversion.width = take_number(&mut chars);

        if let Some(&(_, '.')) = chars.peek() {
            chars.next();
            conversion.precision = Some(take_number(&mut chars).unwrap_or(0));
        }

        while let Some(&(_, 'h' | 'l' | 'L')) = chars.peek() {
            chars.next();
        }

        match chars.next() {
            Some((_, kind)) if CONVERSIONS.contains(kind) => conversion.kind = kind,
            Some((pos, kind)) => {
                return Err(LoggerError::format(format!(
                    "unsupported format character '{}' at index {}",
                    kind, pos
                )))
            }
            None => return Err(LoggerError::format("incomplete format")),
        }

        if !literal.is_empty() {
            pieces.push(Piece::Literal(std::mem::take(&mut literal)));
        }
        pieces.push(Piece::Spec(conversion));
    }

    if !literal.is_empty() {
        pieces.push(Piece::Literal(literal));
    }
    Ok(pieces)
}

fn take_number<I>(chars: &mut std::iter::Peekable<I>) -> Option<usize>
where
    I: Iterator<Item = (usize, char)>,
{
    let mut digits = String::new();
    while let Some(&(_, d)) = chars.peek() {
        if !d.is_ascii_digit() {
            break;
        }
        digits.push(d);
        chars.next();
    }
    digits.parse().ok()
}

/// Render one value through a conversion spec.
pub(crate) fn render(conversion: &Conversion, value: &Value) -> Result<String> {
    let flags = conversion.flags;
    let (sign, prefix, body, numeric) = match conversion.kind {
        's' => (
            "",
            "",
            truncate(value.to_string(), conversion.precision),
            false,
        ),
        'r' | 'a' => ("", "", truncate(value.repr(), conversion.precision), false),
        'c' => ("", "", render_char(value)?, false),
        'd' | 'i' | 'u' => {
            let n = require_int(conversion.kind, value)?;
            (sign_of(n < 0, flags), "", n.unsigned_abs().to_string(), true)
        }
        'o' => {
            let n = require_int(conversion.kind, value)?;
            let prefix = if flags.alt { "0o" } else { "" };
            (sign_of(n < 0, flags), prefix, format!("{:o}", n.unsigned_abs()), true)
        }
        'x' => {
            let n = require_int(conversion.kind, value)?;
            let prefix = if flags.alt { "0x" } else { "" };
            (sign_of(n < 0, flags), prefix, format!("{:x}", n.unsigned_abs()), true)
        }
        'X' => {
            let n = require_int(conversion.kind, value)?;
            let prefix = if flags.alt { "0X" } else { "" };
            (sign_of(n < 0, flags), prefix, format!("{:X}", n.unsigned_abs()), true)
        }
        kind => {
            let f = value.as_float().ok_or_else(|| {
                LoggerError::format(format!(
                    "%{} format: a real number is required, not {}",
                    kind,
                    value.type_name()
                ))
            })?;
            let negative = f.is_sign_negative() && f != 0.0;
            let body = render_float(kind, f.abs(), conversion.precision.unwrap_or(6), flags.alt);
            (sign_of(negative, flags), "", body, true)
        }
    };

    let len = sign.chars().count() + prefix.chars().count() + body.chars().count();
    let pad = conversion.width.unwrap_or(0).saturating_sub(len);
    let mut out = String::with_capacity(len + pad);
    if flags.left {
        out.push_str(sign);
        out.push_str(prefix);
        out.push_str(&body);
        out.extend(std::iter::repeat(' ').take(pad));
    } else if flags.zero && numeric {
        out.push_str(sign);
        out.push_str(prefix);
        out.extend(std::iter::repeat('0').take(pad));
        out.push_str(&body);
    } else {
        out.extend(std::iter::repeat(' ').take(pad));
        out.push_str(sign);
        out.push_str(prefix);
        out.push_str(&body);
    }
    Ok(out)
}

fn sign_of(negative: bool, flags: Flags) -> &'static str {
    if negative {
        "-"
    } else if flags.plus {
        "+"
    } else if flags.space {
        " "
    } else {
        ""
    }
}

fn truncate(s: String, precision: Option<usize>) -> String {
    match precision {
        Some(p) if s.chars().count() > p => s.chars().take(p).collect(),
        _ => s,
    }
}

fn require_int(kind: char, value: &Value) -> Result<i64> {
    value.as_int().ok_or_else(|| {
        LoggerError::format(format!(
            "%{} format: a real number is required, not {}",
            kind,
            value.type_name()
        ))
    })
}

fn render_char(value: &Value) -> Result<String> {
    match value {
        Value::Int(i) => u32::try_from(*i)
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .ok_or_else(|| LoggerError::format("%c arg not in range")),
        Value::Str(s) if s.chars().count() == 1 => Ok(s.clone()),
        other => Err(LoggerError::format(format!(
            "%c requires int or char, not {}",
            other.type_name()
        ))),
    }
}

fn render_float(kind: char, f: f64, precision: usize, alt: bool) -> String {
    if f.is_nan() {
        return if kind.is_ascii_uppercase() { "NAN" } else { "nan" }.to_string();
    }
    if f.is_infinite() {
        return if kind.is_ascii_uppercase() { "INF" } else { "inf" }.to_string();
    }
    match kind {
        'f' | 'F' => format!("{:.*}", precision, f),
        'e' | 'E' => {
            let s = exponent_form(f, precision);
            if kind == 'E' {
                s.to_uppercase()
            } else {
                s
            }
        }
        _ => {
            let p = precision.max(1);
            let exp = if f == 0.0 {
                0
            } else {
                f.abs().log10().floor() as i32
            };
            let mut s = if exp >= -4 && exp < p as i32 {
                let decimals = (p as i32 - 1 - exp).max(0) as usize;
                format!("{:.*}", decimals, f)
            } else {
                exponent_form(f, p - 1)
            };
            if !alt {
                s = strip_fraction_zeros(&s);
            }
            if kind == 'G' {
                s.to_uppercase()
            } else {
                s
            }
        }
    }
}

/// `1.500000e+03` rather than the `1.5e3` the std formatter produces
fn exponent_form(f: f64, precision: usize) -> String {
    let raw = format!("{:.*e}", precision, f);
    match raw.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        None => raw,
    }
}

fn strip_fraction_zeros(s: &str) -> String {
    let (number, exponent) = match s.find('e') {
        Some(idx) => s.split_at(idx),
        None => (s, ""),
    };
    let number = if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    };
    format!("{}{}", number, exponent)
}
