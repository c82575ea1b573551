//! Tweet text normalization.
//!
//! Tweets are cleaned before they reach the lexical and word-vector
//! embeddings. Contextual encoders get a lighter version of the same pipeline.
//!
//! ## What we do
//!
//! - Strip URLs and (optionally) `@mentions`
//! - Optional ASCII transliteration (`é` → `e`)
//! - Drop numbers longer than four characters
//! - Optional hashtag splitting (`#FollowFriday` → `Follow Friday`)
//! - Collapse character runs longer than three (`loooool` → `loool`)
//! - Optional lowercasing
//!
//! ## Pure function guarantee
//!
//! No I/O, no clock, no locale. Same text and options give the same output.
//!
//! ## Not idempotent
//!
//! Hashtag splitting removes the `#` marker, so a second pass never splits
//! again. Without hashtag splitting a lowercased output is a fixed point for
//! plain text.

mod config;
mod hashtag;
mod pipeline;
mod repeat;

pub use crate::config::FormatOptions;
pub use crate::hashtag::camel_case_split;
pub use crate::pipeline::format_text;
pub use crate::repeat::remove_repeated_characters;

#[cfg(test)]
mod tests {
    use super::*;

    fn all_flags() -> FormatOptions {
        FormatOptions {
            remove_mentions: true,
            unidecode: true,
            lower: true,
            hashtag_split: true,
        }
    }

    #[test]
    fn full_pipeline_reference_tweet() {
        let out = format_text(
            "check http://x.co out @bob #FollowFriday 12345",
            &all_flags(),
        );
        assert_eq!(out, "check  out  follow friday");
    }

    #[test]
    fn lowercase_pipeline_is_idempotent_on_plain_text() {
        let opts = FormatOptions::lexical(false);
        let inputs = [
            "Breaking NEWS from Paris",
            "Soooooo happy today!!!!!",
            "L'incendie de Notre-Dame à 19h",
            "2 trains, 12345 passengers",
            "   spaced    out   ",
        ];
        for input in inputs {
            let once = format_text(input, &opts);
            let twice = format_text(&once, &opts);
            assert_eq!(once, twice, "not a fixed point for {input:?}");
        }
    }

    #[test]
    fn hashtag_split_output_is_a_fixed_point() {
        let opts = FormatOptions::lexical(true);
        let once = format_text("#JeSuisCharlie", &opts);
        assert_eq!(once, "je suis charlie");
        assert_eq!(format_text(&once, &opts), once);
        // The raw form still carries the marker, the processed one does not.
        assert_ne!(format_text("#JeSuisCharlie", &FormatOptions::lexical(false)), once);
    }

    #[test]
    fn repeats_collapse_after_hashtag_split() {
        let out = format_text("#GoooooalFrance", &FormatOptions::raw(true));
        assert_eq!(out, "Goooal France");
    }

    #[test]
    fn deterministic() {
        let text = "RT @afp: #Incendie à #NotreDame https://t.co/xyz 2019";
        assert_eq!(
            format_text(text, &all_flags()),
            format_text(text, &all_flags())
        );
    }
}
