//! Options for the tweet normalization pipeline.
//!
//! [`FormatOptions`] toggles the optional stages of [`format_text`](crate::format_text).
//! URL stripping, long-number removal and repeated-character collapsing
//! always run; everything else is opt-in.
//!
//! # Examples
//!
//! ```rust
//! use canonical::FormatOptions;
//!
//! // Profile used before lexical embeddings.
//! let lexical = FormatOptions::lexical(false);
//! assert!(lexical.lower && lexical.unidecode && lexical.remove_mentions);
//!
//! // Contextual encoders keep the raw surface form but split hashtags.
//! let contextual = FormatOptions::raw(true);
//! assert!(!contextual.lower);
//! assert!(contextual.hashtag_split);
//! ```

use serde::{Deserialize, Serialize};

/// Switches for the optional normalization stages.
///
/// The struct is `Copy` so embedding profiles can hand it out by value.
/// `Default` disables every optional stage.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FormatOptions {
    /// Drop `@user` mentions (an `@` followed by non-whitespace).
    pub remove_mentions: bool,

    /// Transliterate non-ASCII characters to their closest ASCII spelling.
    ///
    /// ```text
    /// "Élysée" → "Elysee"
    /// ```
    pub unidecode: bool,

    /// Lowercase the final string.
    pub lower: bool,

    /// Replace `#CamelCase` hashtags with their space-separated words.
    ///
    /// ```text
    /// "#FollowFriday" → "Follow Friday"
    /// ```
    pub hashtag_split: bool,
}

impl FormatOptions {
    /// Every optional stage enabled except hashtag splitting, which is taken
    /// from the caller.
    pub const fn lexical(hashtag_split: bool) -> Self {
        Self {
            remove_mentions: true,
            unidecode: true,
            lower: true,
            hashtag_split,
        }
    }

    /// No optional stage enabled except hashtag splitting.
    pub const fn raw(hashtag_split: bool) -> Self {
        Self {
            remove_mentions: false,
            unidecode: false,
            lower: false,
            hashtag_split,
        }
    }
}
