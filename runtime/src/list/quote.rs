//! Conversion of element strings into the canonical list text

use std::borrow::Cow;

use super::parse::is_list_space;

/// Characters that would change how a bare element is read back
fn is_special(ch: char) -> bool {
    matches!(ch, '{' | '}' | '[' | ']' | '$' | ';' | '"' | '\\')
}

/// Can the element be wrapped in braces and read back unchanged
fn can_brace(element: &str) -> bool {
    let mut depth = 0usize;

    for ch in element.chars() {
        match ch {
            '\\' => return false,
            '{' => depth += 1,
            '}' => match depth.checked_sub(1) {
                Some(next) => depth = next,
                None => return false,
            },
            _ => (),
        }
    }

    depth == 0
}

/// Quote a single element so that splitting the resulting list gives back
/// the same string.  A leading `#` only needs quoting for the first element
/// of a list, otherwise the list could be read as a comment.
pub fn quote_element(element: &str, first: bool) -> Cow<'_, str> {
    if element.is_empty() {
        return Cow::Borrowed("{}");
    }

    let hash = first && element.starts_with('#');
    if !hash && !element.chars().any(|ch| is_list_space(ch) || is_special(ch)) {
        return Cow::Borrowed(element);
    }

    if can_brace(element) {
        return Cow::Owned(format!("{{{}}}", element));
    }

    let mut quoted = String::with_capacity(element.len() * 2);
    for (idx, ch) in element.chars().enumerate() {
        match ch {
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            '\u{b}' => quoted.push_str("\\v"),
            '\u{c}' => quoted.push_str("\\f"),
            '#' if idx == 0 && hash => quoted.push_str("\\#"),
            ch if ch == ' ' || is_special(ch) => {
                quoted.push('\\');
                quoted.push(ch);
            }
            ch => quoted.push(ch),
        }
    }

    Cow::Owned(quoted)
}

/// Quote each element and join them with single spaces
pub fn join_elements<I, S>(elements: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut result = String::new();

    for (idx, element) in elements.into_iter().enumerate() {
        if idx != 0 {
            result.push(' ');
        }
        result.push_str(&quote_element(element.as_ref(), idx == 0));
    }

    result
}
