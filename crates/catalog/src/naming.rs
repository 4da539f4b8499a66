//! Name derivation for entries in the virtual tree.
//!
//! Catalog values end up as directory and file names, so they need to be
//! safe path components and sort in a predictable order.

/// Series positions above this value encode a "special" (extras, side
/// stories, omnibus material) band rather than a regular position.
pub const SPECIAL_BAND: u64 = 10_000;

/// Characters that can't appear in a file name on at least one platform we
/// could be mounted on. `:` is handled separately (see [`escape_file_name`]).
const INVALID_CHARS: [char; 8] = ['<', '>', '"', '/', '\\', '|', '?', '*'];

/// Formats a series position for use in a virtual file name.
///
/// Regular positions are zero-padded to two digits. Positions in the special
/// band are prefixed with `SP` and numbered from the start of the band.
///
/// ```
/// use libris_catalog::naming::format_series_index;
/// assert_eq!(format_series_index(3.0), "03");
/// assert_eq!(format_series_index(12.0), "12");
/// assert_eq!(format_series_index(10_003.0), "SP03");
/// ```
pub fn format_series_index(index: f64) -> String {
    // Fractional positions (1.5 for a novella between books) are truncated.
    // `as` saturates, so negative and NaN values end up as 0.
    let index = index.trunc() as u64;
    if index > SPECIAL_BAND {
        format!("SP{:02}", index % SPECIAL_BAND)
    } else {
        format!("{index:02}")
    }
}

/// Escapes a catalog string so it can be used as a single path component.
///
/// `:` becomes ` -` (so "Title: Subtitle" reads naturally as "Title -
/// Subtitle"), and every other character that is invalid in file names,
/// including control characters, becomes `_`.
///
/// ```
/// use libris_catalog::naming::escape_file_name;
/// assert_eq!(escape_file_name("Foo: Bar"), "Foo - Bar");
/// assert_eq!(escape_file_name("Why?"), "Why_");
/// ```
pub fn escape_file_name(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            ':' => escaped.push_str(" -"),
            c if INVALID_CHARS.contains(&c) || c.is_control() => escaped.push('_'),
            c => escaped.push(c),
        }
    }
    escaped
}
