//! Slug generation for heading anchors.
//!
//! Generates GitHub-style slugs from heading text. Unlike a plain ASCII
//! slugger, letters and digits from any script are kept, so non-Latin
//! headings still get a readable id.

use std::collections::HashSet;

/// Fallback for headings whose text has no usable characters.
const EMPTY_SLUG: &str = "heading";

/// Generate a GitHub-style slug from text.
///
/// Lowercases alphanumerics, turns whitespace, `-` and `_` into hyphens,
/// drops everything else, and removes consecutive/leading/trailing hyphens.
///
/// # Examples
///
/// ```
/// use folio::transform::slugify;
///
/// assert_eq!(slugify("Chapter One"), "chapter-one");
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify("설치 방법"), "설치-방법");
/// ```
pub fn slugify(text: &str) -> String {
    text.chars()
        .flat_map(|c| {
            let mapped: Vec<char> = if c.is_alphanumeric() {
                c.to_lowercase().collect()
            } else if c.is_whitespace() || c == '-' || c == '_' {
                vec!['-']
            } else {
                Vec::new()
            };
            mapped
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Hands out slugs that are unique within one document.
///
/// Repeats get a numeric suffix: `setup`, `setup-1`, `setup-2`. A suffixed
/// candidate that is already taken (say, by a heading literally titled
/// "Setup 1") is skipped.
#[derive(Debug, Default)]
pub struct Slugger {
    taken: HashSet<String>,
}

impl Slugger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slugify `text` and reserve a unique id for it.
    pub fn slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        if base.is_empty() {
            return self.unique(EMPTY_SLUG);
        }
        self.unique(&base)
    }

    /// Reserve `base` as is, or the first free `base-n` when it is taken.
    pub fn unique(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_string()) {
            return base.to_string();
        }

        let mut n = 1usize;
        loop {
            let candidate = format!("{base}-{n}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Reserve an id chosen elsewhere (an author-supplied `id`).
    ///
    /// Returns `false` if it was already taken.
    pub fn reserve(&mut self, id: &str) -> bool {
        self.taken.insert(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_simple() {
        assert_eq!(slugify("Hello World"), "hello-world");
    }

    #[test]
    fn test_slugify_with_punctuation() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
    }

    #[test]
    fn test_slugify_multiple_spaces() {
        assert_eq!(slugify("Hello   World"), "hello-world");
    }

    #[test]
    fn test_slugify_leading_trailing_spaces() {
        assert_eq!(slugify("  Hello World  "), "hello-world");
    }

    #[test]
    fn test_slugify_underscores() {
        assert_eq!(slugify("hello_world"), "hello-world");
    }

    #[test]
    fn test_slugify_unicode() {
        assert_eq!(slugify("설치 방법"), "설치-방법");
        assert_eq!(slugify("Über Straße"), "über-straße");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("   "), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slugger_disambiguates() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.slug("Setup"), "setup");
        assert_eq!(slugger.slug("Setup"), "setup-1");
        assert_eq!(slugger.slug("setup"), "setup-2");
    }

    #[test]
    fn test_slugger_skips_taken_suffix() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.slug("Setup 1"), "setup-1");
        assert_eq!(slugger.slug("Setup"), "setup");
        assert_eq!(slugger.slug("Setup"), "setup-2");
    }

    #[test]
    fn test_slugger_empty_text_fallback() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.slug("!!!"), "heading");
        assert_eq!(slugger.slug(""), "heading-1");
    }

    #[test]
    fn test_slugger_unique_keeps_base_verbatim() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.unique("My_Id"), "My_Id");
        assert_eq!(slugger.unique("My_Id"), "My_Id-1");
        assert_eq!(slugger.slug("My Id"), "my-id");
    }

    #[test]
    fn test_slugger_reserve() {
        let mut slugger = Slugger::new();
        assert!(slugger.reserve("intro"));
        assert!(!slugger.reserve("intro"));
        assert_eq!(slugger.slug("Intro"), "intro-1");
    }
}
