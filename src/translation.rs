use std::borrow::Cow;

use crate::types::SqlSyntax;

/// Rewrite numbered placeholders into `target`'s style: `$N` for PostgreSQL,
/// `?N` for SQLite. Other dialects are returned untouched.
///
/// Placeholders inside string literals, quoted identifiers, comments and
/// dollar-quoted blocks are left alone. Returns a borrowed `Cow` when nothing
/// changes.
#[must_use]
pub fn translate_placeholders(sql: &str, target: SqlSyntax) -> Cow<'_, str> {
    let (from, to) = match target {
        SqlSyntax::PostgreSql => (b'?', '$'),
        SqlSyntax::Sqlite => (b'$', '?'),
        SqlSyntax::MySql | SqlSyntax::Unknown => return Cow::Borrowed(sql),
    };

    let bytes = sql.as_bytes();
    let mut out: Option<String> = None;
    let mut copied_to = 0;
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'-' if bytes.get(idx + 1) == Some(&b'-') => {
                    state = State::LineComment;
                    idx += 1;
                }
                b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'$' | b'?' => {
                    let opener = if b == b'$' {
                        try_start_dollar_quote(bytes, idx)
                    } else {
                        None
                    };
                    if let Some((tag, tag_end)) = opener {
                        state = State::DollarQuoted(tag);
                        idx = tag_end;
                    } else if b == from {
                        if let Some(digits_end) = scan_digits(bytes, idx + 1) {
                            let buf = out.get_or_insert_with(|| String::with_capacity(sql.len()));
                            buf.push_str(&sql[copied_to..idx]);
                            buf.push(to);
                            buf.push_str(&sql[idx + 1..digits_end]);
                            copied_to = digits_end;
                            idx = digits_end;
                            continue;
                        }
                    }
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if b == b'/' && bytes.get(idx + 1) == Some(&b'*') {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if b == b'*' && bytes.get(idx + 1) == Some(&b'/') {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
            State::DollarQuoted(tag) => {
                if b == b'$' && closes_dollar_quote(bytes, idx, tag) {
                    state = State::Normal;
                    idx += tag.len() + 1;
                }
            }
        }
        idx += 1;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied_to..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    }
}

#[derive(Debug, Clone, Copy)]
enum State<'a> {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(&'a [u8]),
}

/// End (exclusive) of the run of ASCII digits starting at `start`, if any.
fn scan_digits(bytes: &[u8], start: usize) -> Option<usize> {
    let end = bytes[start.min(bytes.len())..]
        .iter()
        .position(|b| !b.is_ascii_digit())
        .map_or(bytes.len(), |len| start + len);
    (end > start).then_some(end)
}

/// `$tag$` opener at `start`: returns the tag and the index of its closing `$`.
/// `$1` and friends are not openers since a tag cannot start with a digit.
fn try_start_dollar_quote(bytes: &[u8], start: usize) -> Option<(&[u8], usize)> {
    let first = *bytes.get(start + 1)?;
    if first.is_ascii_digit() {
        return None;
    }
    let mut idx = start + 1;
    while idx < bytes.len() && bytes[idx] != b'$' {
        let b = bytes[idx];
        if !(b.is_ascii_alphanumeric() || b == b'_') {
            return None;
        }
        idx += 1;
    }
    (idx < bytes.len()).then(|| (&bytes[start + 1..idx], idx))
}

fn closes_dollar_quote(bytes: &[u8], idx: usize, tag: &[u8]) -> bool {
    let end = idx + 1 + tag.len();
    bytes.get(idx + 1..end) == Some(tag) && bytes.get(end) == Some(&b'$')
}
