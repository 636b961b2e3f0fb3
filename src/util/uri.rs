use std::borrow::Cow;

pub(crate) const SEPARATOR: char = '/';
const SEPARATOR_STR: &str = "/";
const CURRENT_DIR: &str = ".";
const PARENT_DIR: &str = "..";
const EMPTY: &str = "";

/// Returns the parent directory of a container-relative path.
pub(crate) fn parent(href: &str) -> &str {
    href.rfind(SEPARATOR)
        .map_or(EMPTY, |index| &href[..index])
}

/// Strips the query and fragment from a reference.
pub(crate) fn path(href: &str) -> &str {
    href.find(['#', '?']).map_or(href, |index| &href[..index])
}

/// Returns the fragment of a reference, without the `#`.
pub(crate) fn fragment(href: &str) -> Option<&str> {
    href.split_once('#').map(|(_, fragment)| fragment)
}

// This given href is assumed to be well-formed.
pub(crate) fn has_scheme(href: &str) -> bool {
    // The scheme must be ASCII
    let ascii = href.as_bytes();

    // Check if a colon exists
    let Some(colon_pos) = ascii.iter().position(|&c| c == b':') else {
        return false;
    };

    // The first byte must be an ASCII letter
    if ascii.is_empty() || !ascii[0].is_ascii_alphabetic() {
        return false;
    }

    ascii[1..colon_pos]
        .iter()
        // Return early if invalid characters are encountered
        .all(|c| c.is_ascii_alphanumeric() || matches!(*c, b'+' | b'.' | b'-'))
}

pub(crate) fn decode(encoded: &str) -> Cow<'_, str> {
    percent_encoding::percent_decode_str(encoded).decode_utf8_lossy()
}

/// Resolves `relative` against a parent directory, producing a
/// container-relative path without a leading slash.
///
/// References carrying a scheme are returned untouched; absolute references
/// are interpreted against the container root.
pub(crate) fn resolve(parent_dir: &str, relative: &str) -> String {
    let (main_href, ext) = relative
        .find(['?', '#'])
        .map_or((relative, EMPTY), |position| {
            (&relative[..position], &relative[position..])
        });

    if has_scheme(main_href) {
        return relative.to_owned();
    }
    if let Some(absolute) = main_href.strip_prefix(SEPARATOR) {
        // Absolute within the container; anchor at the container root.
        let mut resolved = normalize(absolute).into_owned();
        resolved.push_str(ext);
        return resolved;
    }

    let mut resolved = String::from(parent_dir);
    if !resolved.is_empty() {
        resolved.push(SEPARATOR);
    }
    resolved.push_str(main_href);

    let mut resolved = normalize(&resolved).into_owned();
    resolved.push_str(ext);
    resolved
}

pub(crate) fn normalize(original: &str) -> Cow<'_, str> {
    // Normalization is not required if the following are not found:
    // "."  => Current dir
    // ".." => Parent dir
    // ""   => Empty component (e.g., double slashes)
    if !original
        .split(SEPARATOR)
        .any(|c| matches!(c, EMPTY | CURRENT_DIR | PARENT_DIR))
    {
        return Cow::Borrowed(original);
    }

    let mut stack = Vec::new();

    for component in original.split(SEPARATOR) {
        match component {
            EMPTY | CURRENT_DIR => {}
            PARENT_DIR => {
                stack.pop();
            }
            _ => stack.push(component),
        }
    }

    Cow::Owned(stack.join(SEPARATOR_STR))
}
