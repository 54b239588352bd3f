use super::{StoreError, StoreResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Line {
    Section(String),
    Entry {
        section: String,
        key: String,
        value: String,
    },
}

pub(super) fn parse_lines(contents: &str) -> StoreResult<Vec<Line>> {
    let mut lines = Vec::new();
    let mut current: Option<String> = None;

    for (index, raw) in contents.lines().enumerate() {
        let line_number = index + 1;
        let line = raw.trim_start();
        if line.trim_end().is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(name) = parse_section_header(line) {
            current = Some(name.to_string());
            lines.push(Line::Section(name.to_string()));
            continue;
        }

        let Some((raw_key, raw_value)) = split_entry(line) else {
            return Err(StoreError::Parse {
                line: line_number,
                message: format!("expected `[section]` or `key=value`, found {line:?}"),
            });
        };
        let Some(section) = current.clone() else {
            return Err(StoreError::Parse {
                line: line_number,
                message: "key/value pair outside of any section".to_string(),
            });
        };

        lines.push(Line::Entry {
            section,
            key: unescape(raw_key.trim_end(), line_number)?,
            value: unescape(raw_value, line_number)?,
        });
    }

    Ok(lines)
}

fn parse_section_header(line: &str) -> Option<&str> {
    let inner = line.strip_prefix('[')?;
    let end = inner.rfind(']')?;
    if !inner[end + 1..].trim().is_empty() {
        return None;
    }
    Some(inner[..end].trim())
}

/// Splits on the first `=` that is not escaped.
fn split_entry(line: &str) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '\\' if !escaped => escaped = true,
            '=' if !escaped => return Some((&line[..index], &line[index + 1..])),
            _ => escaped = false,
        }
    }
    None
}

fn unescape(raw: &str, line_number: usize) -> StoreResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('=') => out.push('='),
            Some('[') => out.push('['),
            Some(';') => out.push(';'),
            Some('#') => out.push('#'),
            Some('s') => out.push(' '),
            Some('t') => out.push('\t'),
            other => {
                return Err(StoreError::Parse {
                    line: line_number,
                    message: format!("invalid escape sequence \\{}", other.unwrap_or(' ')),
                })
            }
        }
    }
    Ok(out)
}

/// Keys additionally escape `=` and `[` so they never read as a separator
/// or a section header, a leading `;` or `#` so they never read as a
/// comment, and edge whitespace so trimming cannot eat it.
fn escape(raw: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    let last = raw.chars().count().saturating_sub(1);
    for (index, ch) in raw.chars().enumerate() {
        let at_edge = index == 0 || index == last;
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '=' if is_key => out.push_str("\\="),
            '[' if is_key => out.push_str("\\["),
            ';' | '#' if is_key && index == 0 => {
                out.push('\\');
                out.push(ch);
            }
            ' ' if is_key && at_edge => out.push_str("\\s"),
            '\t' if is_key && at_edge => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

pub(super) fn render<'a, I>(sections: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a [(String, String)])>,
{
    let mut out = String::new();
    for (index, (name, entries)) in sections.into_iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        out.push('[');
        out.push_str(name);
        out.push_str("]\n");
        for (key, value) in entries {
            out.push_str(&escape(key, true));
            out.push('=');
            out.push_str(&escape(value, false));
            out.push('\n');
        }
    }
    out
}
