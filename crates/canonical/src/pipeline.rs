use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_categories::UnicodeCategories;

use crate::config::FormatOptions;
use crate::hashtag::camel_case_split;
use crate::repeat::remove_repeated_characters;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"http\S+").expect("static url pattern"));
static MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@\S+").expect("static mention pattern"));

/// Numbers with this many characters or more are dropped.
const MAX_KEPT_NUMBER_LEN: usize = 4;

/// Main entry point. Normalizes one tweet according to `opts`.
///
/// Stages, in order: URL removal, mention removal, ASCII transliteration,
/// token filtering (long numbers dropped, hashtags optionally split),
/// repeated-character collapsing, lowercasing.
///
/// Tokens are separated by spaces and apostrophes and re-joined with single
/// spaces, so apostrophes become spaces and removed URLs or mentions leave
/// their surrounding separators behind.
pub fn format_text(text: &str, opts: &FormatOptions) -> String {
    let mut text = URL_RE.replace_all(text, "").into_owned();
    if opts.remove_mentions {
        text = MENTION_RE.replace_all(&text, "").into_owned();
    }
    if opts.unidecode {
        text = deunicode::deunicode_with_tofu(&text, "");
    }

    let words: Vec<Cow<'_, str>> = text
        .split(|c: char| c == ' ' || c == '\'')
        .filter_map(|word| format_word(word, opts))
        .collect();

    let collapsed = remove_repeated_characters(&words.join(" "));
    if opts.lower {
        collapsed.to_lowercase()
    } else {
        collapsed
    }
}

/// Returns `None` when the token must be dropped.
fn format_word<'a>(word: &'a str, opts: &FormatOptions) -> Option<Cow<'a, str>> {
    if is_long_number(word) {
        return None;
    }
    match word.strip_prefix('#') {
        Some(tag) if opts.hashtag_split => Some(Cow::Owned(camel_case_split(tag))),
        _ => Some(Cow::Borrowed(word)),
    }
}

/// Only decimal digits (`Nd`) count; fractions and numerals like `½` or `Ⅻ` do not.
fn is_long_number(word: &str) -> bool {
    word.chars().count() > MAX_KEPT_NUMBER_LEN
        && word.chars().all(UnicodeCategories::is_number_decimal_digit)
}
