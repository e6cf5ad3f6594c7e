//! The `key:{value}` text format of language files.
//!
//! Values may span lines and contain `:`, `%` and `{n}` format tokens. A value
//! ends at the first `}` that is followed (after optional whitespace) by the end
//! of the text or by the start of another entry. A value that itself contains
//! `}` directly followed by `word:{` is therefore split there.

/// Render `(key, value)` pairs, one entry per line.
pub fn render_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut text = String::new();
    for (key, value) in entries {
        text.push_str(key);
        text.push_str(":{");
        text.push_str(value);
        text.push_str("}\n");
    }
    text
}

/// Parse every well-formed entry in `text`, in order.
///
/// Lines that do not start an entry are skipped. An entry without a closing
/// brace ends parsing.
pub fn parse_entries(text: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            break;
        }
        pos += rest.len() - trimmed.len();

        let Some((key, value_offset)) = entry_start(trimmed) else {
            match trimmed.find('\n') {
                Some(newline) => {
                    pos += newline + 1;
                    continue;
                }
                None => break,
            }
        };

        let value_start = pos + value_offset;
        let mut search = value_start;
        let mut value_end = None;
        while let Some(offset) = text[search..].find('}') {
            let close = search + offset;
            if closes_entry(&text[close + 1..]) {
                value_end = Some(close);
                break;
            }
            search = close + 1;
        }

        let Some(end) = value_end else {
            break;
        };
        entries.push((key.to_string(), text[value_start..end].to_string()));
        pos = end + 1;
    }

    entries
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// If `s` starts with `key:{`, return the key and the byte offset of the value.
fn entry_start(s: &str) -> Option<(&str, usize)> {
    let key_len = s
        .char_indices()
        .take_while(|(_, c)| is_key_char(*c))
        .last()
        .map(|(i, c)| i + c.len_utf8())?;
    let key = &s[..key_len];
    let after_key = s[key_len..].trim_start_matches([' ', '\t']);
    let after_colon = after_key.strip_prefix(':')?;
    let value = after_colon.trim_start_matches([' ', '\t']).strip_prefix('{')?;
    Some((key, s.len() - value.len()))
}

fn closes_entry(after_brace: &str) -> bool {
    let rest = after_brace.trim_start();
    rest.is_empty() || entry_start(rest).is_some()
}
