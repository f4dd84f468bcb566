//! URL slug generation, matching the rules used across the admin surface:
//! lowercase, ASCII letters/digits only, runs of whitespace and hyphens
//! collapsed to a single hyphen.

/// Normalize arbitrary text into a URL slug.
pub fn generate_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for ch in text.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else if ch.is_whitespace() || ch == '-' {
            pending_hyphen = true;
        }
        // Everything else is stripped.
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::generate_slug;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(generate_slug("Breaking News Today"), "breaking-news-today");
    }

    #[test]
    fn strips_punctuation() {
        assert_eq!(generate_slug("Hello, World! (2024)"), "hello-world-2024");
    }

    #[test]
    fn collapses_separator_runs() {
        assert_eq!(generate_slug("  a  --  b  "), "a-b");
    }

    #[test]
    fn drops_non_ascii() {
        assert_eq!(generate_slug("café news"), "caf-news");
    }

    #[test]
    fn empty_input_gives_empty_slug() {
        assert_eq!(generate_slug("!!!"), "");
    }
}
