//! Lenient JSON repair.
//!
//! Rewrites the common ways model output deviates from strict JSON so that `serde_json`
//! can parse it:
//! - trailing commas before `}` / `]`
//! - unquoted object keys (`{name: "x"}`)
//! - single-quoted strings (`{'a': 'b'}`)
//! - `True` / `False` / `None` / `undefined` literals
//! - `//` and `/* */` comments
//!
//! Content inside double-quoted strings is never touched.

/// Rewrite `input` into something closer to strict JSON.
pub fn repair(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' => {
                i = copy_double_quoted(&chars, i, &mut out);
            }
            '\'' => {
                i = convert_single_quoted(&chars, i, &mut out);
            }
            ',' => {
                let next = skip_insignificant(&chars, i + 1);
                match chars.get(next) {
                    Some('}') | Some(']') | None => {}
                    _ => out.push(','),
                }
                i += 1;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i = (i + 2).min(chars.len());
            }
            c if is_ident_start(c) && !follows_number(&chars, i) => {
                let start = i;
                while i < chars.len() && is_ident_continue(chars[i]) {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                let next = skip_insignificant(&chars, i);
                if chars.get(next) == Some(&':') {
                    out.push('"');
                    out.push_str(&ident);
                    out.push('"');
                } else {
                    out.push_str(literal(&ident));
                }
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }

    out
}

fn literal(ident: &str) -> &str {
    match ident {
        "True" => "true",
        "False" => "false",
        "None" | "undefined" => "null",
        other => other,
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '-'
}

/// Exponent markers (`1e5`, `2E-3`) belong to the number before them.
fn follows_number(chars: &[char], i: usize) -> bool {
    i > 0 && chars[i - 1].is_ascii_digit() && matches!(chars[i], 'e' | 'E')
}

fn skip_insignificant(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    i
}

/// Copy a double-quoted string verbatim. Returns the index after the closing quote.
fn copy_double_quoted(chars: &[char], start: usize, out: &mut String) -> usize {
    out.push('"');
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;
        match c {
            '\\' => {
                if let Some(&escaped) = chars.get(i) {
                    out.push(escaped);
                    i += 1;
                }
            }
            '"' => return i,
            _ => {}
        }
    }
    i
}

/// Re-emit a single-quoted string as a double-quoted one.
fn convert_single_quoted(chars: &[char], start: usize, out: &mut String) -> usize {
    out.push('"');
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        i += 1;
        match c {
            '\\' => match chars.get(i) {
                Some('\'') => {
                    out.push('\'');
                    i += 1;
                }
                Some(&escaped) => {
                    out.push('\\');
                    out.push(escaped);
                    i += 1;
                }
                None => {}
            },
            '"' => out.push_str("\\\""),
            '\'' => {
                out.push('"');
                return i;
            }
            other => out.push(other),
        }
    }
    out.push('"');
    i
}
