//! Lenient name matching

/// Compare two names ignoring case and whitespace.
///
/// `"Dark Blue"`, `"darkblue"` and `" DARK  BLUE "` all match.
#[must_use]
pub fn soft_eq(a: &str, b: &str) -> bool {
    fn normalized(s: &str) -> impl Iterator<Item = char> + '_ {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
    }

    normalized(a).eq(normalized(b))
}
