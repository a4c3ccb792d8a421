use crate::lang::{ast, Label};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// ## Runtime value
///
/// BASIC here has two types. Which one a variable holds is decided by
/// its name; the value itself only knows what it is.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Val {
    Number(f64),
    String(Rc<str>),
}

impl Val {
    pub fn is_string(&self) -> bool {
        matches!(self, Val::String(_))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Val::Number(n) => *n != 0.0 && !n.is_nan(),
            Val::String(s) => !s.is_empty(),
        }
    }

    /// The key this value selects in the label map.
    pub fn to_label(&self) -> Label {
        match self {
            Val::Number(n) => number_to_string(*n).into(),
            Val::String(s) => s.clone(),
        }
    }
}

impl From<f64> for Val {
    fn from(n: f64) -> Val {
        Val::Number(n)
    }
}

impl From<&str> for Val {
    fn from(s: &str) -> Val {
        Val::String(s.into())
    }
}

impl From<String> for Val {
    fn from(s: String) -> Val {
        Val::String(s.into())
    }
}

impl From<&ast::Literal> for Val {
    fn from(lit: &ast::Literal) -> Val {
        match lit {
            ast::Literal::Number(n) => Val::Number(*n),
            ast::Literal::String(s) => Val::String(s.clone()),
        }
    }
}

impl std::fmt::Display for Val {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Val::Number(n) => write!(f, "{}", number_to_string(*n)),
            Val::String(s) => write!(f, "{}", s),
        }
    }
}

/// Shortest text that reads back as the same number. Exponent form
/// below 1e-6 and from 1e21 up, written `1e-7` and `1.5e+21`.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let abs = n.abs();
    if abs >= 1e21 || abs < 1e-6 {
        signed_exponent(&format!("{:e}", n))
    } else {
        format!("{}", n)
    }
}

/// `prec` significant digits, switching to exponent form when the
/// exponent is below -6 or does not fit in `prec` digits.
pub fn to_precision(n: f64, prec: usize) -> String {
    if !n.is_finite() {
        return number_to_string(n);
    }
    let prec = prec.max(1);
    let sci = format!("{:.*e}", prec - 1, n);
    let exp: i32 = match sci.split_once('e') {
        Some((_, e)) => e.parse().unwrap_or(0),
        None => 0,
    };
    if exp < -6 || exp >= prec as i32 {
        signed_exponent(&sci)
    } else {
        let decimals = (prec as i32 - 1 - exp).max(0) as usize;
        format!("{:.*}", decimals, n)
    }
}

fn signed_exponent(sci: &str) -> String {
    match sci.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => sci.to_string(),
    }
}

/// Reads the longest numeric prefix, ignoring leading whitespace.
/// `None` when there is no number at all.
pub fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    if s[end..].starts_with("Infinity") {
        return Some(if bytes[0] == b'-' {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    s[..end].trim_end_matches('.').parse::<f64>().ok()
}

/// How PRINT shows a number. Precision shrinks until the digits fit in
/// a print zone with room for sign and spacing.
pub fn format_number(n: f64, zone: usize, padding: bool) -> String {
    let mut s = number_to_string(n).to_ascii_uppercase();
    if zone > 4 {
        let width = zone - 4;
        let mut prec = width;
        while s.len() > width && prec >= 1 {
            s = to_precision(n, prec).to_ascii_uppercase();
            prec -= 1;
        }
        if let Some(rest) = s.strip_prefix("0.") {
            s = format!(".{}", rest);
        } else if let Some(rest) = s.strip_prefix("-0.") {
            s = format!("-.{}", rest);
        }
    }
    if !padding {
        s
    } else if s.starts_with('-') {
        format!("{} ", s)
    } else {
        format!(" {} ", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(1024.0), "1024");
        assert_eq!(number_to_string(-0.5), "-0.5");
        assert_eq!(number_to_string(0.1), "0.1");
        assert_eq!(number_to_string(1e-7), "1e-7");
        assert_eq!(number_to_string(1.5e21), "1.5e+21");
        assert_eq!(number_to_string(1e20), "100000000000000000000");
    }

    #[test]
    fn test_to_precision() {
        assert_eq!(to_precision(123.456, 4), "123.5");
        assert_eq!(to_precision(0.000123, 2), "0.00012");
        assert_eq!(to_precision(123456.0, 2), "1.2e+5");
        assert_eq!(to_precision(1.0 / 3.0, 3), "0.333");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("  42abc"), Some(42.0));
        assert_eq!(parse_number("-1.5e3"), Some(-1500.0));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("7."), Some(7.0));
        assert_eq!(parse_number("1e"), Some(1.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("-"), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.5, 15, true), " .5 ");
        assert_eq!(format_number(-0.5, 15, true), "-.5 ");
        assert_eq!(format_number(3.0, 15, false), "3");
        assert_eq!(format_number(1.0 / 3.0, 15, true), " .333333333 ");
        assert_eq!(format_number(1e21, 15, false), "1E+21");
    }

    #[test]
    fn test_label_key() {
        assert_eq!(Val::Number(100.0).to_label().as_ref(), "100");
        assert_eq!(Val::from("LOOP").to_label().as_ref(), "LOOP");
    }
}
