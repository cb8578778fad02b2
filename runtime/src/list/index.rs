//! Index arguments: `N`, `end`, `end+N`, `end-N`, `N+M` and `N-M`

use crate::value::Value;

use super::ListError;

/// Resolve an index argument against the index of the last element.  The
/// result may be negative or past the end, callers decide what that means.
pub fn resolve_index(index: &Value, end: isize) -> Result<isize, ListError> {
    let text = index.text();

    parse_index(text.trim(), end).ok_or_else(|| ListError::BadIndex {
        index: text.to_string(),
    })
}

fn parse_index(text: &str, end: isize) -> Option<isize> {
    if let Some(rest) = text.strip_prefix("end") {
        if rest.is_empty() {
            return Some(end);
        }
        return end.checked_add(offset(rest)?);
    }

    // skip the first character so a leading sign is part of the base
    let split = text
        .char_indices()
        .skip(1)
        .find(|(_, ch)| *ch == '+' || *ch == '-')
        .map(|(idx, _)| idx);

    match split {
        None => text.parse().ok(),
        Some(idx) => {
            let base: isize = text[..idx].parse().ok()?;
            base.checked_add(offset(&text[idx..])?)
        }
    }
}

/// A signed offset, the sign is required
fn offset(text: &str) -> Option<isize> {
    let digits = text.strip_prefix('+').or_else(|| text.strip_prefix('-'))?;
    if !digits.starts_with(|ch: char| ch.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

#[cfg(test)]
mod test {
    use super::*;

    fn resolve(text: &str, end: isize) -> Option<isize> {
        resolve_index(&Value::from(text), end).ok()
    }

    #[test]
    fn forms() {
        assert_eq!(resolve("3", 9), Some(3));
        assert_eq!(resolve("-1", 9), Some(-1));
        assert_eq!(resolve("end", 9), Some(9));
        assert_eq!(resolve("end-2", 9), Some(7));
        assert_eq!(resolve("end+1", 9), Some(10));
        assert_eq!(resolve("2+3", 9), Some(5));
        assert_eq!(resolve("2-3", 9), Some(-1));
        assert_eq!(resolve(" 4 ", 9), Some(4));
    }

    #[test]
    fn invalid() {
        assert_eq!(resolve("", 9), None);
        assert_eq!(resolve("ends", 9), None);
        assert_eq!(resolve("end--1", 9), None);
        assert_eq!(resolve("1+", 9), None);
        assert_eq!(resolve("one", 9), None);
    }
}
