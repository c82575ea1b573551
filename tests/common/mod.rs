#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use twembed::{
    BackendProvider, BackendRequest, BuildConfig, DatasetSource, EmbedError, EmbedInput, Embedder,
    Matrix, ModelKind,
};

pub const HEADER: &str = "id\tcreated_at\ttext\tlabel\tevent\timage";

/// Rows of the base corpus: ids 1, 4, 5 are annotated, 1, 2, 4, 5 examined,
/// 1, 3, 4 carry an image.
pub const EVENT2018_ROWS: &[&str] = &[
    "4\tMon Jul 16 20:00:00 +0000 2018\tGoooooal 123456 #AllezLesBleus\t2\t2\t4.jpg",
    "1\tMon Jul 16 12:00:00 +0000 2018\tIncendie à Notre-Dame http://t.co/x @pompiers #ParisBrule\t1\t1\t1.jpg",
    "2\tMon Jul 16 13:00:00 +0000 2018\tMatch ce soir #FranceBelgique\t\t2\t",
    "3\tMon Jul 16 14:00:00 +0000 2018\tRien à voir @ami\t\t\t3.jpg",
    "5\tTue Jul 17 03:00:00 +0000 2018\tIncendie toujours en cours\t1\t1\t",
    "1\tMon Jul 16 12:00:00 +0000 2018\tduplicate of the first tweet\t1\t1\t1.jpg",
];

pub fn write_tsv(path: &Path, rows: &[&str]) {
    let mut content = String::from(HEADER);
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    content.push('\n');
    fs::write(path, content).unwrap();
}

/// Writes `event2018.tsv` and its image subset `event2018_image.tsv` under `root`.
pub fn write_corpus(root: &Path) {
    write_tsv(&root.join("event2018.tsv"), EVENT2018_ROWS);
    let with_image: Vec<&str> = EVENT2018_ROWS
        .iter()
        .copied()
        .filter(|row| !row.ends_with('\t'))
        .collect();
    write_tsv(&root.join("event2018_image.tsv"), &with_image);
}

pub fn config(root: &Path, model: ModelKind) -> BuildConfig {
    let mut cfg = BuildConfig::new(model);
    cfg.data_root = root.to_path_buf();
    cfg.dataset = DatasetSource::Event2018;
    cfg
}

/// What a [`RecordingProvider`] saw.
#[derive(Debug, Default)]
pub struct Calls {
    pub requests: Vec<BackendRequest>,
    pub texts: Vec<Vec<String>>,
    pub image_dirs: Vec<PathBuf>,
}

/// Provider whose embedders record their inputs and return one
/// `[row index, text length]` row per text (one row per image file).
#[derive(Clone, Default)]
pub struct RecordingProvider {
    pub calls: Rc<RefCell<Calls>>,
}

impl RecordingProvider {
    pub fn backend_calls(&self) -> usize {
        self.calls.borrow().requests.len()
    }
}

struct RecordingEmbedder {
    name: String,
    calls: Rc<RefCell<Calls>>,
}

impl Embedder for RecordingEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute_vectors(&mut self, input: EmbedInput<'_>) -> Result<Matrix, EmbedError> {
        let rows: Vec<f32> = match input {
            EmbedInput::Texts(texts) => {
                self.calls.borrow_mut().texts.push(texts.to_vec());
                texts
                    .iter()
                    .enumerate()
                    .flat_map(|(i, t)| [i as f32, t.chars().count() as f32])
                    .collect()
            }
            EmbedInput::Images(dir) => {
                self.calls.borrow_mut().image_dirs.push(dir.to_path_buf());
                let files = count_files(dir)?;
                (0..files).flat_map(|i| [i as f32, 0.0]).collect()
            }
        };
        let n = rows.len() / 2;
        let dense = ndarray::Array2::from_shape_vec((n, 2), rows)
            .map_err(|e| EmbedError::Shape(e.to_string()))?;
        Ok(Matrix::Dense(dense))
    }
}

fn count_files(dir: &Path) -> Result<usize, EmbedError> {
    Ok(fs::read_dir(dir)?.count())
}

impl BackendProvider for RecordingProvider {
    fn backend(&self, request: &BackendRequest) -> Result<Box<dyn Embedder>, EmbedError> {
        self.calls.borrow_mut().requests.push(*request);
        Ok(Box::new(RecordingEmbedder {
            name: request.model.name().to_string(),
            calls: Rc::clone(&self.calls),
        }))
    }
}
