use crate::config::TitleConfig;
use std::collections::HashSet;

/// Punctuation allowed in a cleaned title besides letters, digits and spaces
const ALLOWED_PUNCTUATION: &str = ".,:;!?'\"()-+&";

/// Whether `c` belongs to the character class of a cleaned title
pub fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_whitespace() || ALLOWED_PUNCTUATION.contains(c)
}

/// Cleans raw forum titles down to their primary English segment
///
/// # Algorithm
///
/// 1. Split the title on `/` and trim each segment
/// 2. Keep segments made only of allowed characters
/// 3. Drop short generic tags (at most `short_tag_max_len` characters and
///    listed in `known_tags`)
/// 4. Return the longest remaining segment, first one on ties
/// 5. Otherwise use the first run of allowed characters in the raw title
/// 6. Otherwise return the raw title unchanged
///
/// # Example
///
/// ```
/// use forum_harvester::title::TitleNormalizer;
///
/// let normalizer = TitleNormalizer::default();
/// assert_eq!(normalizer.clean("Foo Bar / 日本語 / Baz"), "Foo Bar");
/// ```
#[derive(Debug, Clone)]
pub struct TitleNormalizer {
    short_tag_max_len: usize,
    known_tags: HashSet<String>,
}

impl Default for TitleNormalizer {
    fn default() -> Self {
        Self::new(&TitleConfig::default())
    }
}

impl TitleNormalizer {
    pub fn new(config: &TitleConfig) -> Self {
        Self {
            short_tag_max_len: config.short_tag_max_len,
            known_tags: config.known_tags.iter().cloned().collect(),
        }
    }

    /// Returns the cleaned title
    pub fn clean(&self, raw: &str) -> String {
        let segments: Vec<&str> = raw.split('/').map(str::trim).collect();
        tracing::debug!("Title segments: raw='{}', segments={:?}", raw, segments);

        let candidates = segments
            .into_iter()
            .filter(|segment| !segment.is_empty() && segment.chars().all(is_allowed_char))
            .filter(|segment| !self.is_generic_tag(segment));

        // Ties keep the earlier segment
        let longest = candidates.fold(None, |best: Option<&str>, segment| match best {
            Some(current) if char_len(current) >= char_len(segment) => Some(current),
            _ => Some(segment),
        });

        if let Some(cleaned) = longest {
            tracing::debug!("Cleaned title: raw='{}', cleaned='{}'", raw, cleaned);
            return cleaned.to_string();
        }

        if let Some(fallback) = self.first_allowed_run(raw) {
            tracing::debug!("Fallback title: raw='{}', cleaned='{}'", raw, fallback);
            return fallback.to_string();
        }

        tracing::warn!("Title has no usable English part, keeping it as is: {}", raw);
        raw.to_string()
    }

    /// Whether a segment is a short quality/format tag rather than a title
    fn is_generic_tag(&self, segment: &str) -> bool {
        char_len(segment) <= self.short_tag_max_len && self.known_tags.contains(segment)
    }

    /// First maximal run of allowed characters that still has content once trimmed
    fn first_allowed_run<'a>(&self, raw: &'a str) -> Option<&'a str> {
        raw.split(|c: char| !is_allowed_char(c))
            .map(str::trim)
            .find(|run| !run.is_empty())
            .filter(|run| !self.is_generic_tag(run))
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
