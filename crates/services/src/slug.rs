//! Slug helpers shared by record creation and resolution.

use uuid::Uuid;

/// Separator between words in a slug. Resolution also splits on it to find
/// trailing legacy identifiers (`cool-game-42` → `42`).
pub const SLUG_SEPARATOR: char = '-';

/// Lowercases, keeps ASCII alphanumerics and collapses everything else into
/// single separators.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;

    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push(SLUG_SEPARATOR);
            }
            pending_separator = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// `base` plus a short random suffix, used for the single retry after a
/// unique-slug collision.
pub fn with_random_suffix(base: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{base}{SLUG_SEPARATOR}{}", &suffix[..6])
}

/// The token after the last separator, if the input has one.
pub fn trailing_token(input: &str) -> Option<&str> {
    input
        .rsplit_once(SLUG_SEPARATOR)
        .map(|(_, token)| token)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("  Hollow Knight: Silksong!! "), "hollow-knight-silksong");
        assert_eq!(slugify("Café -- Racer 2"), "caf-racer-2");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn suffix_keeps_base() {
        let slug = with_random_suffix("my-game");
        assert!(slug.starts_with("my-game-"));
        assert_eq!(slug.len(), "my-game-".len() + 6);
    }

    #[test]
    fn trailing_token_needs_a_separator() {
        assert_eq!(trailing_token("cool-game-42"), Some("42"));
        assert_eq!(trailing_token("42"), None);
        assert_eq!(trailing_token("dangling-"), None);
    }
}
