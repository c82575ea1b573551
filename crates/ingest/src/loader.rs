use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;

use csv::StringRecord;
use tracing::{debug, info};

use crate::config::{AnnotationMode, LoadOptions};
use crate::date::derive_date;
use crate::error::IngestError;
use crate::missing::present;
use crate::types::{Dataset, Field, TweetRecord};

const ID: &str = "id";
const CREATED_AT: &str = "created_at";
const TEXT: &str = "text";
/// Tweet text concatenated with the quoted or replied-to tweet.
pub const EXTENDED_TEXT: &str = "text+quote+reply";

/// Loads a tab-separated tweet file.
///
/// Rows are filtered by annotation mode and image presence, the extended text
/// column is swapped in when requested, every kept row gets its derived date,
/// duplicate ids are dropped (first occurrence wins) and rows are sorted by
/// id.
pub fn load_dataset(path: &Path, opts: &LoadOptions) -> Result<Dataset, IngestError> {
    let start = Instant::now();
    let file = File::open(path).map_err(|e| IngestError::io(path, e))?;
    let dataset = read_dataset(file, opts)?;
    info!(
        path = %path.display(),
        annotation = %opts.annotation,
        rows = dataset.len(),
        elapsed_micros = start.elapsed().as_micros(),
        "dataset_loaded"
    );
    Ok(dataset)
}

/// Same as [`load_dataset`] over any reader.
pub fn read_dataset<R: Read>(reader: R, opts: &LoadOptions) -> Result<Dataset, IngestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_reader(reader);
    let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let layout = Layout::from_header(&columns, opts)?;

    let mut records = Vec::new();
    let mut rows_read = 0usize;
    for row in rdr.records() {
        let row = row?;
        rows_read += 1;
        let record = layout.record(&row);
        if layout.keep(&record) {
            records.push(record);
        }
    }
    let rows_filtered = records.len();

    for record in records.iter_mut() {
        record.date = derive_date(&record.created_at).ok_or_else(|| IngestError::Timestamp {
            id: record.id.clone(),
            value: record.created_at.clone(),
        })?;
    }

    let mut seen = HashSet::with_capacity(records.len());
    records.retain(|r| seen.insert(r.id.clone()));
    records.sort_by(|a, b| a.id.cmp(&b.id));

    debug!(
        rows_read,
        rows_filtered,
        duplicates = rows_filtered - records.len(),
        "dataset_rows"
    );
    Ok(Dataset::new(columns, records))
}

/// Column positions resolved once from the header.
struct Layout {
    id: usize,
    created_at: usize,
    text: Option<usize>,
    label: Option<usize>,
    event: Option<usize>,
    image: Option<usize>,
    extended: Option<usize>,
    required: Vec<Field>,
    extra: Vec<(usize, String)>,
}

impl Layout {
    fn from_header(columns: &[String], opts: &LoadOptions) -> Result<Self, IngestError> {
        let find = |name: &str| columns.iter().position(|c| c == name);

        let id = find(ID).ok_or_else(|| IngestError::missing_column(ID))?;
        let created_at = find(CREATED_AT).ok_or_else(|| IngestError::missing_column(CREATED_AT))?;
        let label = find(Field::Label.column());
        let event = find(Field::Event.column());
        let image = find(Field::Image.column());
        let extended = if opts.extended_text { find(EXTENDED_TEXT) } else { None };

        // Annotation filters only apply to files that carry annotations.
        let mut required = Vec::new();
        if label.is_some() {
            match opts.annotation {
                AnnotationMode::Annotated => required.push(Field::Label),
                AnnotationMode::Examined => {
                    if event.is_none() {
                        return Err(IngestError::missing_column(Field::Event.column()));
                    }
                    required.push(Field::Event);
                }
            }
        }
        if opts.require_image {
            if image.is_none() {
                return Err(IngestError::missing_column(Field::Image.column()));
            }
            required.push(Field::Image);
        }

        let text = find(TEXT);
        let known = [Some(id), Some(created_at), text, label, event, image, extended];
        let extra = columns
            .iter()
            .enumerate()
            .filter(|(idx, _)| !known.contains(&Some(*idx)))
            .map(|(idx, name)| (idx, name.clone()))
            .collect();

        Ok(Self {
            id,
            created_at,
            text,
            label,
            event,
            image,
            extended,
            required,
            extra,
        })
    }

    fn record(&self, row: &StringRecord) -> TweetRecord {
        let cell = |idx: usize| row.get(idx).unwrap_or("");
        let optional = |idx: Option<usize>| idx.and_then(|i| present(cell(i)));

        let original_text = optional(self.text);
        let (text, text_not_formated) = match self.extended {
            Some(idx) => (present(cell(idx)).unwrap_or_default(), original_text),
            None => (original_text.unwrap_or_default(), None),
        };

        TweetRecord {
            id: cell(self.id).to_string(),
            created_at: cell(self.created_at).to_string(),
            text,
            text_not_formated,
            label: optional(self.label),
            event: optional(self.event),
            image: optional(self.image),
            date: String::new(),
            extra: self
                .extra
                .iter()
                .map(|(idx, name)| (name.clone(), cell(*idx).to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn keep(&self, record: &TweetRecord) -> bool {
        self.required.iter().all(|field| record.has(*field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: &str = "Tue Jul 17 10:12:33 +0000 2018";

    fn tsv(header: &str, rows: &[&str]) -> String {
        let mut out = String::from(header);
        out.push('\n');
        for row in rows {
            out.push_str(row);
            out.push('\n');
        }
        out
    }

    fn load(content: &str, opts: LoadOptions) -> Result<Dataset, IngestError> {
        read_dataset(content.as_bytes(), &opts)
    }

    fn ids(ds: &Dataset) -> Vec<&str> {
        ds.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn dedups_first_occurrence_and_sorts_by_id() {
        let content = tsv(
            "id\tcreated_at\ttext",
            &[
                &format!("30\t{TS}\tthird"),
                &format!("100\t{TS}\tfirst copy"),
                &format!("20\t{TS}\tsecond"),
                &format!("100\t{TS}\tsecond copy"),
            ],
        );
        let ds = load(&content, LoadOptions::default()).unwrap();
        // Byte-wise string order: "100" < "20" < "30".
        assert_eq!(ids(&ds), vec!["100", "20", "30"]);
        assert_eq!(ds.records()[0].text, "first copy");
        assert!(ds.iter().all(|r| r.date == "20180717"));
    }

    #[test]
    fn ids_keep_leading_zeros() {
        let content = tsv("id\tcreated_at\ttext", &[&format!("007\t{TS}\tx")]);
        let ds = load(&content, LoadOptions::default()).unwrap();
        assert_eq!(ids(&ds), vec!["007"]);
    }

    #[test]
    fn annotated_keeps_labelled_rows() {
        let content = tsv(
            "id\tcreated_at\ttext\tlabel\tevent",
            &[
                &format!("1\t{TS}\ta\t12\t12"),
                &format!("2\t{TS}\tb\t\t12"),
                &format!("3\t{TS}\tc\tNaN\t"),
            ],
        );
        let ds = load(&content, LoadOptions::default()).unwrap();
        assert_eq!(ids(&ds), vec!["1"]);

        let examined = LoadOptions {
            annotation: AnnotationMode::Examined,
            ..Default::default()
        };
        let ds = load(&content, examined).unwrap();
        assert_eq!(ids(&ds), vec!["1", "2"]);
    }

    #[test]
    fn unannotated_file_is_not_filtered() {
        let content = tsv("id\tcreated_at\ttext", &[&format!("1\t{TS}\ta")]);
        let examined = LoadOptions {
            annotation: AnnotationMode::Examined,
            ..Default::default()
        };
        assert_eq!(load(&content, examined).unwrap().len(), 1);
    }

    #[test]
    fn examined_without_event_column_is_schema_error() {
        let content = tsv("id\tcreated_at\ttext\tlabel", &[&format!("1\t{TS}\ta\t3")]);
        let examined = LoadOptions {
            annotation: AnnotationMode::Examined,
            ..Default::default()
        };
        assert_eq!(
            load(&content, examined),
            Err(IngestError::Schema("missing required column `event`".into()))
        );
    }

    #[test]
    fn image_filter() {
        let content = tsv(
            "id\tcreated_at\ttext\timage",
            &[&format!("1\t{TS}\ta\t1.jpg"), &format!("2\t{TS}\tb\t")],
        );
        let opts = LoadOptions {
            require_image: true,
            ..Default::default()
        };
        assert_eq!(ids(&load(&content, opts).unwrap()), vec!["1"]);

        let no_image_column = tsv("id\tcreated_at\ttext", &[&format!("1\t{TS}\ta")]);
        assert!(matches!(
            load(&no_image_column, opts),
            Err(IngestError::Schema(_))
        ));
    }

    #[test]
    fn extended_text_swaps_columns() {
        let content = tsv(
            "id\tcreated_at\ttext\ttext+quote+reply\tlang",
            &[&format!("1\t{TS}\tshort\tshort + quoted\tfr")],
        );
        let plain = load(&content, LoadOptions::default()).unwrap();
        assert_eq!(plain.records()[0].text, "short");
        assert_eq!(plain.records()[0].text_not_formated, None);
        assert_eq!(
            plain.records()[0].extra.get(EXTENDED_TEXT).map(String::as_str),
            Some("short + quoted")
        );

        let opts = LoadOptions {
            extended_text: true,
            ..Default::default()
        };
        let extended = load(&content, opts).unwrap();
        let row = &extended.records()[0];
        assert_eq!(row.text, "short + quoted");
        assert_eq!(row.text_not_formated.as_deref(), Some("short"));
        assert!(!row.extra.contains_key(EXTENDED_TEXT));
        assert_eq!(row.extra.get("lang").map(String::as_str), Some("fr"));
    }

    #[test]
    fn quoted_fields_may_contain_tabs() {
        let content = tsv(
            "\"id\"\t\"created_at\"\t\"text\"",
            &[&format!("\"1\"\t\"{TS}\"\t\"a\tb\"")],
        );
        let ds = load(&content, LoadOptions::default()).unwrap();
        assert_eq!(ds.records()[0].text, "a\tb");
    }

    #[test]
    fn missing_required_columns() {
        let content = tsv("id\ttext", &["1\ta"]);
        assert_eq!(
            load(&content, LoadOptions::default()),
            Err(IngestError::Schema("missing required column `created_at`".into()))
        );
        let content = tsv("created_at\ttext", &[&format!("{TS}\ta")]);
        assert!(matches!(
            load(&content, LoadOptions::default()),
            Err(IngestError::Schema(_))
        ));
    }

    #[test]
    fn bad_timestamp_names_row() {
        let content = tsv("id\tcreated_at\ttext", &["9\t2018-07-17\ta"]);
        assert_eq!(
            load(&content, LoadOptions::default()),
            Err(IngestError::Timestamp {
                id: "9".into(),
                value: "2018-07-17".into()
            })
        );
    }

    #[test]
    fn filtered_rows_are_not_date_checked() {
        let content = tsv(
            "id\tcreated_at\ttext\tlabel",
            &[&format!("1\t{TS}\ta\t5"), "2\tgarbage\tb\t"],
        );
        assert_eq!(load(&content, LoadOptions::default()).unwrap().len(), 1);
    }

    #[test]
    fn ragged_row_is_csv_error() {
        let content = tsv("id\tcreated_at\ttext", &[&format!("1\t{TS}")]);
        assert!(matches!(
            load(&content, LoadOptions::default()),
            Err(IngestError::Csv(_))
        ));
    }
}
