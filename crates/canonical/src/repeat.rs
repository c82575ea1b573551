/// Limits runs of the same character to three occurrences.
///
/// `"loooool"` becomes `"loool"`. Every character class is affected,
/// punctuation and emoji included. Line feeds are dropped from the output and
/// break the current run, so `"aa\naa"` becomes `"aaaa"`.
pub fn remove_repeated_characters(expr: &str) -> String {
    let mut out = String::with_capacity(expr.len());
    let mut previous: Option<char> = None;
    let mut run = 0usize;

    for ch in expr.chars() {
        if ch == '\n' {
            previous = None;
            run = 0;
            continue;
        }
        if previous == Some(ch) {
            run += 1;
        } else {
            previous = Some(ch);
            run = 1;
        }
        if run <= 3 {
            out.push(ch);
        }
    }

    out
}
