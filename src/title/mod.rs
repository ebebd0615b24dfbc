//! Title cleaning for mixed-script forum titles
//!
//! Forum titles usually carry several translations separated by `/`, e.g.
//! `Русское название / English Title / 1080p`. The normalizer keeps the
//! primary Latin-script segment.

mod normalize;

pub use normalize::{is_allowed_char, TitleNormalizer};
