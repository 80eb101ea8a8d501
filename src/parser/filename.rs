//! File names as they appear in diff headers.
//!
//! Git wraps names containing non-ASCII or control bytes in double quotes and
//! writes those bytes as C-style escapes, e.g. `"a/\303\244.txt"` for `ä.txt`.

use log::warn;

/// Decode a `---`/`+++`/`Binary files` name token.
///
/// Strips the `a/` or `b/` side prefix and, for quoted tokens, unescapes the
/// inner text. A token whose escapes do not decode is returned unchanged.
pub fn decode_path(token: &str) -> String {
    match strip_quotes(token) {
        Some(inner) => unescape(strip_side_prefix(inner)).unwrap_or_else(|| {
            warn!("could not decode quoted file name {token}");
            token.to_string()
        }),
        None => strip_side_prefix(token).to_string(),
    }
}

/// Decode a name that carries no side prefix, as in `rename from`/`rename to`.
pub fn decode_name(token: &str) -> String {
    match strip_quotes(token) {
        Some(inner) => unescape(inner).unwrap_or_else(|| {
            warn!("could not decode quoted file name {token}");
            token.to_string()
        }),
        None => token.to_string(),
    }
}

/// Write `prefix` + `name` the way git would, quoting and escaping when needed.
pub fn encode_path(prefix: &str, name: &str) -> String {
    if !needs_quoting(name) {
        return format!("{prefix}{name}");
    }

    let mut out = String::with_capacity(name.len() + prefix.len() + 2);
    out.push('"');
    out.push_str(prefix);
    for byte in name.bytes() {
        match byte {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\t' => out.push_str("\\t"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            0x20..=0x7e => out.push(char::from(byte)),
            _ => out.push_str(&format!("\\{byte:03o}")),
        }
    }
    out.push('"');
    out
}

/// Like [`encode_path`] without a side prefix.
pub fn encode_name(name: &str) -> String {
    encode_path("", name)
}

fn needs_quoting(name: &str) -> bool {
    name.bytes()
        .any(|b| b == b'"' || b == b'\\' || !(0x20..=0x7e).contains(&b))
}

fn strip_quotes(token: &str) -> Option<&str> {
    token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
}

fn strip_side_prefix(name: &str) -> &str {
    name.strip_prefix("a/")
        .or_else(|| name.strip_prefix("b/"))
        .unwrap_or(name)
}

/// Resolve C-style escapes. Octal escapes are exactly three digits and name
/// raw bytes; the collected bytes must form valid UTF-8.
fn unescape(text: &str) -> Option<String> {
    let src = text.as_bytes();
    let mut out = Vec::with_capacity(src.len());
    let mut i = 0;

    while i < src.len() {
        let byte = src[i];
        if byte == b'"' {
            return None;
        }
        if byte != b'\\' {
            out.push(byte);
            i += 1;
            continue;
        }

        let escaped = *src.get(i + 1)?;
        let decoded = match escaped {
            b'0'..=b'7' => {
                let digits = src.get(i + 1..i + 4)?;
                let mut value: u32 = 0;
                for &d in digits {
                    if !(b'0'..=b'7').contains(&d) {
                        return None;
                    }
                    value = value * 8 + u32::from(d - b'0');
                }
                out.push(u8::try_from(value).ok()?);
                i += 4;
                continue;
            }
            b'a' => 0x07,
            b'b' => 0x08,
            b'f' => 0x0c,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'v' => 0x0b,
            b'"' => b'"',
            b'\\' => b'\\',
            _ => return None,
        };
        out.push(decoded);
        i += 2;
    }

    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_side_prefixes() {
        assert_eq!(decode_path("a/src/main.rs"), "src/main.rs");
        assert_eq!(decode_path("b/src/main.rs"), "src/main.rs");
        assert_eq!(decode_path("src/main.rs"), "src/main.rs");
    }

    #[test]
    fn strips_only_one_prefix() {
        assert_eq!(decode_path("a/b/c.txt"), "b/c.txt");
    }

    #[test]
    fn decodes_quoted_octal_escapes() {
        assert_eq!(decode_path(r#""a/\303\244.txt""#), "ä.txt");
        assert_eq!(
            decode_path(r#""b/\346\227\245\346\234\254.md""#),
            "日本.md"
        );
    }

    #[test]
    fn decodes_named_escapes() {
        assert_eq!(decode_path(r#""a/tab\there""#), "tab\there");
        assert_eq!(decode_path(r#""a/say \"hi\"""#), "say \"hi\"");
        assert_eq!(decode_path(r#""a/back\\slash""#), "back\\slash");
    }

    #[test]
    fn quoted_name_without_prefix() {
        assert_eq!(decode_path(r#""plain name""#), "plain name");
    }

    #[test]
    fn malformed_escape_returns_token() {
        let token = r#""a/bad\q""#;
        assert_eq!(decode_path(token), token);

        let truncated = r#""a/short\30""#;
        assert_eq!(decode_path(truncated), truncated);
    }

    #[test]
    fn invalid_utf8_returns_token() {
        let token = r#""a/\377.bin""#;
        assert_eq!(decode_path(token), token);
    }

    #[test]
    fn decode_name_keeps_prefix_like_directories() {
        assert_eq!(decode_name("a/inner.txt"), "a/inner.txt");
        assert_eq!(decode_name(r#""\303\244""#), "ä");
    }

    #[test]
    fn encode_leaves_plain_names_alone() {
        assert_eq!(encode_path("a/", "src/lib.rs"), "a/src/lib.rs");
        assert_eq!(encode_path("b/", "with space.txt"), "b/with space.txt");
    }

    #[test]
    fn encode_quotes_non_ascii() {
        assert_eq!(encode_path("a/", "ä.txt"), r#""a/\303\244.txt""#);
        assert_eq!(encode_name("tab\there"), r#""tab\there""#);
    }

    #[test]
    fn encode_then_decode_restores_name() {
        for name in ["ä.txt", "quote\"d", "back\\slash", "日本/語.rs", "bell\u{7}"] {
            assert_eq!(decode_path(&encode_path("a/", name)), name);
            assert_eq!(decode_name(&encode_name(name)), name);
        }
    }
}
