//! Numeric values with exact decimal digit-string fidelity (`spec.md` §3, §4.3).
//!
//! `spec.md` §9 is explicit that the dual representation — the digit strings
//! plus a binary approximation — must not collapse to a single `f64`:
//! crystallographic precision routinely exceeds what `f64` can carry. The
//! digit string is the source of truth; `approx` exists only so callers who
//! want fast arithmetic don't have to re-parse the text form themselves.

use std::fmt;

/// A CIF `NUMB` value: an exact decimal digit string, an optional standard
/// uncertainty digit string, the scale (digits right of the decimal point,
/// negative for trailing-zero exponent forms), and a binary approximation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Number {
    /// The original token text, reproduced verbatim on write (`spec.md` §4.4:
    /// "NUMB is emitted from its preserved text form verbatim").
    text: String,
    /// `true` if the value is negative. The digit strings below never carry
    /// a sign (`spec.md` §3: "digit strings contain only decimal digits").
    negative: bool,
    /// Unsigned decimal digits of the value, no decimal point.
    digits: String,
    /// Number of `digits` that lie to the right of the decimal point. May be
    /// negative when the token used a positive exponent past the point
    /// implied by the fractional part.
    scale: i32,
    /// Unsigned decimal digits of the standard uncertainty, if any.
    su_digits: Option<String>,
    /// Binary floating point approximation of `text`.
    approx: f64,
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.negative == other.negative
            && self.digits == other.digits
            && self.scale == other.scale
            && self.su_digits == other.su_digits
    }
}

/// Error returned when a token does not match the CIF number grammar
/// (`spec.md` §4.3). Callers (the parser's value classifier) treat this as
/// "fall back to CHAR", not as a hard failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotANumber;

impl fmt::Display for NotANumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a valid CIF number token")
    }
}

impl Number {
    /// Parse a bare token against the CIF number grammar (`spec.md` §4.3):
    /// `[+-]? digits ('.' digits?)? ([eE][+-]?digits)? ('(' digits ')')?`
    pub fn parse(token: &str) -> Result<Self, NotANumber> {
        let bytes: Vec<char> = token.chars().collect();
        let mut i = 0usize;
        let n = bytes.len();
        if n == 0 {
            return Err(NotANumber);
        }

        let negative = match bytes.get(i) {
            Some('-') => {
                i += 1;
                true
            }
            Some('+') => {
                i += 1;
                false
            }
            _ => false,
        };

        let int_start = i;
        while i < n && bytes[i].is_ascii_digit() {
            i += 1;
        }
        let int_part: String = bytes[int_start..i].iter().collect();

        let mut frac_part = String::new();
        if i < n && bytes[i] == '.' {
            i += 1;
            let frac_start = i;
            while i < n && bytes[i].is_ascii_digit() {
                i += 1;
            }
            frac_part = bytes[frac_start..i].iter().collect();
        }

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(NotANumber);
        }

        let mut exponent: i32 = 0;
        if i < n && (bytes[i] == 'e' || bytes[i] == 'E') {
            let mut j = i + 1;
            let exp_negative = match bytes.get(j) {
                Some('-') => {
                    j += 1;
                    true
                }
                Some('+') => {
                    j += 1;
                    false
                }
                _ => false,
            };
            let exp_start = j;
            while j < n && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if j == exp_start {
                return Err(NotANumber);
            }
            let exp_digits: String = bytes[exp_start..j].iter().collect();
            let exp_val: i32 = exp_digits.parse().map_err(|_| NotANumber)?;
            exponent = if exp_negative { -exp_val } else { exp_val };
            i = j;
        }

        let mut su_digits: Option<String> = None;
        if i < n && bytes[i] == '(' {
            let su_start = i + 1;
            let mut j = su_start;
            while j < n && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if j == su_start || j >= n || bytes[j] != ')' {
                return Err(NotANumber);
            }
            su_digits = Some(bytes[su_start..j].iter().collect());
            i = j + 1;
        }

        if i != n {
            return Err(NotANumber);
        }

        let mut digits = format!("{}{}", int_part, frac_part);
        let scale = frac_part.len() as i32 - exponent;
        if digits.is_empty() {
            digits = "0".to_string();
        }

        let approx: f64 = token
            .trim_end_matches(|c: char| c == '(')
            .split('(')
            .next()
            .unwrap_or(token)
            .parse()
            .unwrap_or(f64::NAN);

        Ok(Number {
            text: token.to_string(),
            negative,
            digits,
            scale,
            su_digits,
            approx,
        })
    }

    /// Build a `Number` from a binary value, its uncertainty, and an `su_rule`
    /// per `spec.md` §4.3's "Auto-initialization": choose the largest integer
    /// `scale` such that `su` rounded to that scale, read as an integer, is
    /// `<= su_rule`. `su == 0.0` preserves all significant digits of `value`.
    pub fn from_value_su_rule(value: f64, su: f64, su_rule: u32) -> Self {
        if su == 0.0 {
            return Self::exact_from_f64(value);
        }
        let su_rule = su_rule.max(1) as f64;
        // Start from a scale large enough that su rounds to at least 1 digit,
        // then walk down until the rounded integer su fits within su_rule.
        let mut scale: i32 = 15;
        loop {
            let factor = 10f64.powi(scale);
            let rounded_su = (su.abs() * factor).round();
            if rounded_su <= su_rule || scale <= -6 {
                break;
            }
            scale -= 1;
        }
        Self::fixed_scale(value, su, scale)
    }

    /// Build a `Number` at a fixed `scale` (`spec.md` §4.3, "Fixed-scale
    /// initialization"). If the uncertainty rounds to zero at this scale the
    /// number becomes exact. Equivalent to
    /// [`Number::fixed_scale_with_notation`] with no scientific-notation
    /// cutoff, matching this crate's historical (plain-decimal-only) text
    /// rendering.
    pub fn fixed_scale(value: f64, su: f64, scale: i32) -> Self {
        Self::fixed_scale_with_notation(value, su, scale, usize::MAX)
    }

    /// As [`Number::fixed_scale`], but switches the emitted `text` to
    /// scientific notation once the plain-decimal rendering would need more
    /// than `max_leading_zeroes` leading zero digits between the decimal
    /// point and the first significant digit (`spec.md` §4.3, "Fixed-scale
    /// initialization": "scientific notation is used ... when the number
    /// would otherwise require more than `max_leading_zeroes` leading
    /// zeroes"). `digits`/`scale`/`su_digits` — the canonical representation
    /// — are unaffected; only the reproduced token text changes shape.
    pub fn fixed_scale_with_notation(value: f64, su: f64, scale: i32, max_leading_zeroes: usize) -> Self {
        let factor = 10f64.powi(scale);
        let rounded_value = (value * factor).round();
        let rounded_su = (su.abs() * factor).round();

        let negative = rounded_value < 0.0;
        let abs_value = rounded_value.abs() as i128;
        let mut digits = abs_value.to_string();
        if scale > 0 {
            while (digits.len() as i32) <= scale {
                digits.insert(0, '0');
            }
        }

        let su_digits = if rounded_su > 0.0 {
            Some((rounded_su as i128).to_string())
        } else {
            None
        };

        let text = format_digits_with_notation(
            negative,
            &digits,
            scale,
            su_digits.as_deref(),
            max_leading_zeroes,
        );
        let approx = if negative { -(abs_value as f64) } else { abs_value as f64 } / factor;

        Number {
            text,
            negative,
            digits,
            scale: scale.max(0),
            su_digits,
            approx,
        }
    }

    fn exact_from_f64(value: f64) -> Self {
        let text = format!("{}", value);
        // `f64::to_string` never produces a CIF-illegal token for finite
        // values; reuse the parser to derive the digit string/scale.
        Number::parse(&text).unwrap_or(Number {
            text: text.clone(),
            negative: value < 0.0,
            digits: "0".to_string(),
            scale: 0,
            su_digits: None,
            approx: value,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn digits(&self) -> &str {
        &self.digits
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    pub fn su_digits(&self) -> Option<&str> {
        self.su_digits.as_deref()
    }

    pub fn is_exact(&self) -> bool {
        self.su_digits.is_none()
    }

    pub fn approx(&self) -> f64 {
        self.approx
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Render digits/scale/su back to CIF token text, used by [`Number::fixed_scale`]
/// and by the writer's fallback path for synthesized (non-parsed) numbers.
fn format_digits(negative: bool, digits: &str, scale: i32, su_digits: Option<&str>) -> String {
    let mut s = String::new();
    if negative {
        s.push('-');
    }
    if scale <= 0 {
        s.push_str(digits);
    } else {
        let scale = scale as usize;
        let int_len = digits.len().saturating_sub(scale);
        if int_len == 0 {
            s.push('0');
        } else {
            s.push_str(&digits[..int_len]);
        }
        s.push('.');
        s.push_str(&digits[int_len..]);
    }
    if let Some(su) = su_digits {
        s.push('(');
        s.push_str(su);
        s.push(')');
    }
    s
}

/// As [`format_digits`], but renders in scientific notation (`d.ddd...eN`)
/// when the plain-decimal form would carry more than `max_leading_zeroes`
/// leading zero digits right of the decimal point before the first
/// significant digit (`spec.md` §4.3).
fn format_digits_with_notation(
    negative: bool,
    digits: &str,
    scale: i32,
    su_digits: Option<&str>,
    max_leading_zeroes: usize,
) -> String {
    if scale > 0 {
        let scale_u = scale as usize;
        let int_len = digits.len().saturating_sub(scale_u).max(1);
        if int_len == 1 && digits.as_bytes().first() == Some(&b'0') {
            let frac = &digits[1..];
            let leading_zeroes = frac.len() - frac.trim_start_matches('0').len();
            if leading_zeroes > max_leading_zeroes {
                return format_scientific(negative, digits, scale, su_digits);
            }
        }
    }
    format_digits(negative, digits, scale, su_digits)
}

/// Render `digits * 10^-scale` as `d[.ddd...]eN`, `N` chosen so the mantissa
/// has exactly one digit before the point. Used only when
/// [`format_digits_with_notation`] decides plain decimal would carry too
/// many leading zeroes.
fn format_scientific(negative: bool, digits: &str, scale: i32, su_digits: Option<&str>) -> String {
    let trimmed = digits.trim_start_matches('0');
    let leading_zero_digits = (digits.len() - trimmed.len()) as i32;
    let significant = if trimmed.is_empty() { "0" } else { trimmed };

    let mut s = String::new();
    if negative {
        s.push('-');
    }
    s.push_str(&significant[0..1]);
    if significant.len() > 1 {
        s.push('.');
        s.push_str(&significant[1..]);
    }
    let exponent = digits.len() as i32 - scale - leading_zero_digits - 1;
    s.push('e');
    s.push_str(&exponent.to_string());
    if let Some(su) = su_digits {
        s.push('(');
        s.push_str(su);
        s.push(')');
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_number_with_uncertainty() {
        let n = Number::parse("-10.250(125)").unwrap();
        assert!(n.is_negative());
        assert_eq!(n.digits(), "10250");
        assert_eq!(n.scale(), 3);
        assert_eq!(n.su_digits(), Some("125"));
        assert_eq!(n.text(), "-10.250(125)");
    }

    #[test]
    fn parses_plain_integer() {
        let n = Number::parse("42").unwrap();
        assert_eq!(n.digits(), "42");
        assert_eq!(n.scale(), 0);
        assert!(n.is_exact());
    }

    #[test]
    fn parses_scientific_notation() {
        // frac_part.len() (1) - exponent (3) is negative: the grammar's scale
        // formula (`spec.md` §4.3) is preserved as computed, not padded/clamped.
        let n = Number::parse("1.5e3").unwrap();
        assert_eq!(n.scale(), -2);
        assert_eq!(n.digits(), "15");
        assert_eq!(n.approx(), 1500.0);
    }

    #[test]
    fn rejects_non_numbers() {
        assert!(Number::parse("abc").is_err());
        assert!(Number::parse("1.2.3").is_err());
        assert!(Number::parse("").is_err());
    }

    #[test]
    fn rejects_malformed_uncertainty() {
        assert!(Number::parse("1.0(").is_err());
        assert!(Number::parse("1.0(a)").is_err());
    }

    #[test]
    fn fixed_scale_stays_plain_decimal_by_default() {
        let n = Number::fixed_scale(0.0000123, 0.0, 7);
        assert!(!n.text().contains('e'));
    }

    #[test]
    fn fixed_scale_with_notation_switches_to_scientific_past_the_leading_zero_budget() {
        let n = Number::fixed_scale_with_notation(0.0000123, 0.0, 7, 2);
        assert_eq!(n.text(), "1.23e-5");
        // the canonical digits/scale representation is untouched by the
        // choice of text rendering.
        assert_eq!(n.digits(), "00000123");
        assert_eq!(n.scale(), 7);
    }

    #[test]
    fn fixed_scale_with_notation_keeps_plain_form_within_the_budget() {
        let n = Number::fixed_scale_with_notation(0.25, 0.0, 2, 2);
        assert_eq!(n.text(), "0.25");
    }
}
