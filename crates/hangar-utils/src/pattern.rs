/// Escape character used by [`to_like_pattern`].
pub const LIKE_ESCAPE: char = '\\';

/// Returns true if the search criterion contains a `*` wildcard.
pub fn contains_wildcard(value: &str) -> bool {
    value.contains('*')
}

/// Converts a `*` wildcard criterion into a SQL `LIKE` pattern.
///
/// Literal `\`, `%` and `_` are escaped with [`LIKE_ESCAPE`] so only `*` acts as a wildcard.
/// The pattern must be used together with `ESCAPE '\'`.
///
/// # Examples
///
/// ```
/// use hangar_utils::pattern::to_like_pattern;
///
/// assert_eq!(to_like_pattern("lib*"), "lib%");
/// assert_eq!(to_like_pattern("my_lib*"), "my\\_lib%");
/// ```
pub fn to_like_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 4);
    for c in value.chars() {
        match c {
            '*' => pattern.push('%'),
            '\\' | '%' | '_' => {
                pattern.push(LIKE_ESCAPE);
                pattern.push(c);
            }
            _ => pattern.push(c),
        }
    }
    pattern
}
