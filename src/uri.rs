//! Decoding of resource URIs recorded in index files
//!
//! The history store identifies each tracked file by a URI such as
//! `file:///home/me/project/src/main.rs` or
//! `vscode-remote://ssh-remote%2Bbox/home/me/app.py`. Only the path part is
//! kept: the scheme and authority are dropped, the query and fragment are
//! cut off, and percent-escapes are decoded.

use percent_encoding::percent_decode_str;

/// Decode a resource URI into a plain filesystem path string
///
/// Strings without a scheme are treated as paths already and only
/// percent-decoded. Windows drive-letter paths (`/c:/Users/x`) lose the
/// leading slash.
///
/// # Examples
///
/// ```rust
/// use histline::uri::decode_resource;
///
/// assert_eq!(
///     decode_resource("file:///home/me/My%20Project/a.rs"),
///     "/home/me/My Project/a.rs"
/// );
/// ```
pub fn decode_resource(resource: &str) -> String {
    let path_part = match resource.find("://") {
        Some(idx) if is_scheme(&resource[..idx]) => {
            let after_authority = &resource[idx + 3..];
            match after_authority.find('/') {
                Some(slash) => &after_authority[slash..],
                None => "",
            }
        }
        _ => match resource.find(':') {
            // single letters are drive letters, not schemes
            Some(idx) if idx > 1 && is_scheme(&resource[..idx]) => &resource[idx + 1..],
            _ => resource,
        },
    };

    let path_part = path_part.split(['?', '#']).next().unwrap_or_default();
    let decoded = percent_decode_str(path_part).decode_utf8_lossy();
    to_native(strip_drive_slash(&decoded))
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

fn strip_drive_slash(path: &str) -> &str {
    let bytes = path.as_bytes();
    if bytes.len() >= 3 && bytes[0] == b'/' && bytes[1].is_ascii_alphabetic() && bytes[2] == b':' {
        &path[1..]
    } else {
        path
    }
}

#[cfg(windows)]
fn to_native(path: &str) -> String {
    path.replace('/', "\\")
}

#[cfg(not(windows))]
fn to_native(path: &str) -> String {
    path.to_string()
}
