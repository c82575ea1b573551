//! Tweet dataset loading.
//!
//! This is where tweets enter the pipeline. We read a tab-separated export,
//! keep the rows matching the requested annotation subset, and hand back a
//! deterministic [`Dataset`] the embedding stages can rely on.
//!
//! ## What we do here
//!
//! - **Parse TSV** - quoted fields, `id` always kept as a string
//! - **Filter** - annotated rows (`label`), examined rows (`event`), image rows (`image`)
//! - **Swap in extended text** - `text+quote+reply` when requested
//! - **Derive dates** - `YYYYMMDD` from `created_at`, shifted back five hours
//! - **Deduplicate and sort** - first occurrence of each id, sorted by id
//!
//! ## Example
//!
//! ```
//! use ingest::{read_dataset, LoadOptions};
//!
//! let tsv = "id\tcreated_at\ttext\n2\tTue Jul 17 10:12:33 +0000 2018\tb\n1\tTue Jul 17 02:00:00 +0000 2018\ta\n";
//! let dataset = read_dataset(tsv.as_bytes(), &LoadOptions::default()).unwrap();
//!
//! assert_eq!(dataset.len(), 2);
//! assert_eq!(dataset.records()[0].id, "1");
//! assert_eq!(dataset.records()[0].date, "20180716");
//! ```

mod config;
mod date;
mod error;
mod loader;
mod missing;
mod types;

pub use crate::config::{
    AnnotationMode, DatasetSource, LoadOptions, UnknownAnnotationMode, EVENT2018, EVENT2018_IMAGE,
};
pub use crate::date::{derive_date, TIMESTAMP_FORMAT};
pub use crate::error::IngestError;
pub use crate::loader::{load_dataset, read_dataset, EXTENDED_TEXT};
pub use crate::missing::is_missing;
pub use crate::types::{Dataset, Field, TweetRecord};
