/// Cell values read as "no value", matching the default NA markers of common
/// dataframe readers. Comparison is exact: `" NA"` is a value.
const NA_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Returns `true` when `value` is empty or one of the NA markers.
pub fn is_missing(value: &str) -> bool {
    NA_MARKERS.contains(&value)
}

/// `Some(value)` unless the cell is missing.
pub(crate) fn present(value: &str) -> Option<String> {
    (!is_missing(value)).then(|| value.to_string())
}
