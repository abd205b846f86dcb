//! Decoding of literal payloads: escape processing, radix-aware integers,
//! and the multi-line string indentation rule from spec.md §4.2. Kept
//! separate from the lexer proper since decoding happens on demand at the
//! AST layer, not during tokenization.

/// A decoded numeric literal: which variant depends on whether the lexeme
/// had a radix prefix, a decimal point, or an exponent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberValue {
    Int(i128),
    Float(f64),
}

/// Parse an `IntLiteral`/`FloatLiteral` lexeme (digit separators already
/// tolerated by the lexer) into its numeric value.
pub fn decode_number(text: &str) -> Option<NumberValue> {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();

    if let Some(hex) = cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
        return i128::from_str_radix(hex, 16).ok().map(NumberValue::Int);
    }
    if let Some(oct) = cleaned.strip_prefix("0o").or_else(|| cleaned.strip_prefix("0O")) {
        return i128::from_str_radix(oct, 8).ok().map(NumberValue::Int);
    }
    if let Some(bin) = cleaned.strip_prefix("0b").or_else(|| cleaned.strip_prefix("0B")) {
        return i128::from_str_radix(bin, 2).ok().map(NumberValue::Int);
    }
    if cleaned.contains('.') || cleaned.contains('e') || cleaned.contains('E') {
        cleaned.parse::<f64>().ok().map(NumberValue::Float)
    } else {
        cleaned.parse::<i128>().ok().map(NumberValue::Int)
    }
}

/// Unescape the shared character/string escape table: `\n \t \r \\ \' \" \0`,
/// `\xNN`, `\u{...}`. Malformed escapes (already diagnosed at lex time) are
/// passed through best-effort rather than causing a panic here.
pub fn decode_escapes(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('0') => out.push('\0'),
            Some('x') => {
                let digits: String = [chars.next(), chars.next()].into_iter().flatten().collect();
                if let Ok(byte) = u8::from_str_radix(&digits, 16) {
                    out.push(byte as char);
                }
            }
            Some('u') => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    let mut hex = String::new();
                    for c in chars.by_ref() {
                        if c == '}' {
                            break;
                        }
                        hex.push(c);
                    }
                    if let Some(ch) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                        out.push(ch);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}

/// Decode a character literal's content (without the surrounding quotes) to
/// its single code point.
pub fn decode_char(content: &str) -> Option<char> {
    decode_escapes(content).chars().next()
}

/// Remove the longest common leading-whitespace prefix shared by every
/// non-empty line, as spec.md §4.2 requires for both multi-line string
/// forms.
pub fn normalize_multiline_indent(content: &str) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let common = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|l| if l.len() >= common { &l[common..] } else { l.trim_start() })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_decimal_int() {
        assert_eq!(decode_number("42"), Some(NumberValue::Int(42)));
    }

    #[test]
    fn decode_hex_int() {
        assert_eq!(decode_number("0x2A"), Some(NumberValue::Int(42)));
    }

    #[test]
    fn decode_octal_int() {
        assert_eq!(decode_number("0o52"), Some(NumberValue::Int(42)));
    }

    #[test]
    fn decode_binary_int() {
        assert_eq!(decode_number("0b101010"), Some(NumberValue::Int(42)));
    }

    #[test]
    fn decode_float_with_exponent() {
        assert_eq!(decode_number("1.5e2"), Some(NumberValue::Float(150.0)));
    }

    #[test]
    fn decode_digit_separators() {
        assert_eq!(decode_number("1_000_000"), Some(NumberValue::Int(1_000_000)));
    }

    #[test]
    fn decode_escapes_basic_table() {
        assert_eq!(decode_escapes(r"a\nb\tc"), "a\nb\tc");
    }

    #[test]
    fn decode_escapes_hex_byte() {
        assert_eq!(decode_escapes(r"\x41"), "A");
    }

    #[test]
    fn decode_escapes_unicode_scalar() {
        assert_eq!(decode_escapes(r"\u{1F600}"), "\u{1F600}");
    }

    #[test]
    fn decode_char_single_codepoint() {
        assert_eq!(decode_char(r"\n"), Some('\n'));
        assert_eq!(decode_char("x"), Some('x'));
    }

    #[test]
    fn normalize_strips_common_indent() {
        let content = "\n    line one\n    line two\n    ";
        assert_eq!(normalize_multiline_indent(content), "\nline one\nline two\n");
    }

    #[test]
    fn normalize_ignores_blank_lines_when_computing_prefix() {
        let content = "  a\n\n  b";
        assert_eq!(normalize_multiline_indent(content), "a\n\nb");
    }
}
