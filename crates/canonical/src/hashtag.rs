/// Splits a camel-cased word into space-separated parts.
///
/// A new word starts on a lowercase→uppercase transition (`followFriday`) and
/// before the last capital of an acronym that is followed by a lowercase
/// letter (`HTMLParser` → `HTML Parser`). Only ASCII letters count as cased.
///
/// Words never span a line feed. Only the last line (ignoring one trailing
/// line feed) keeps its final word; on earlier lines the text after the last
/// boundary is dropped, so `"Paris\nNews"` becomes `"News"`.
pub fn camel_case_split(expr: &str) -> String {
    let lines: Vec<&str> = expr.split('\n').collect();
    let last = if expr.ends_with('\n') {
        lines.len().saturating_sub(2)
    } else {
        lines.len() - 1
    };

    let mut words: Vec<&str> = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        let mut parts = split_line(line);
        if idx < last {
            parts.pop();
        }
        words.extend(parts);
    }
    words.join(" ")
}

fn split_line(line: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let mut parts = Vec::new();
    let mut start = 0;
    for i in 1..chars.len() {
        let next = chars.get(i + 1).map(|&(_, c)| c);
        if is_boundary(chars[i - 1].1, chars[i].1, next) {
            parts.push(&line[start..chars[i].0]);
            start = chars[i].0;
        }
    }
    if start < line.len() {
        parts.push(&line[start..]);
    }
    parts
}

fn is_boundary(prev: char, cur: char, next: Option<char>) -> bool {
    let lower_to_upper = prev.is_ascii_lowercase() && cur.is_ascii_uppercase();
    let acronym_end = prev.is_ascii_uppercase()
        && cur.is_ascii_uppercase()
        && next.is_some_and(|n| n.is_ascii_lowercase());
    lower_to_upper || acronym_end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_camel_case() {
        assert_eq!(camel_case_split("FollowFriday"), "Follow Friday");
        assert_eq!(camel_case_split("iPhone"), "i Phone");
    }

    #[test]
    fn splits_acronym_prefix() {
        assert_eq!(camel_case_split("HTMLParser"), "HTML Parser");
        assert_eq!(camel_case_split("JO2024Paris"), "JO2024Paris");
    }

    #[test]
    fn keeps_uniform_words() {
        assert_eq!(camel_case_split("paris"), "paris");
        assert_eq!(camel_case_split("NASA"), "NASA");
    }

    #[test]
    fn empty_word() {
        assert_eq!(camel_case_split(""), "");
    }

    #[test]
    fn line_feeds_drop_unterminated_words() {
        assert_eq!(camel_case_split("Paris\nNews"), "News");
        assert_eq!(camel_case_split("ParisNews\nToday"), "Paris Today");
        assert_eq!(camel_case_split("ParisNews\n"), "Paris News");
        assert_eq!(camel_case_split("\n"), "");
    }

    #[test]
    fn non_ascii_letters_are_not_cased() {
        assert_eq!(camel_case_split("ÉtéÀParis"), "ÉtéÀParis");
    }
}
