//! Transformer and CNN encoders served through ONNX Runtime.
//!
//! Each model lives in `<model_root>/<model name>/` as `model.onnx`, plus a
//! `tokenizer.json` for text encoders.
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use ndarray::Array2;
use once_cell::sync::OnceCell;
use onnxruntime::environment::Environment;
use onnxruntime::ndarray::{Array, Array4};
use onnxruntime::session::Session;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::backend::{EmbedInput, Embedder};
use crate::images::image_files;
use crate::matrix::Matrix;
use crate::pool::{pool_image_output, pool_token_outputs};
use crate::registry::ModelKind;
use crate::EmbedError;

/// Texts per session run.
pub const BATCH_SIZE: usize = 32;
/// Longer token sequences are truncated.
pub const MAX_SEQUENCE_LENGTH: usize = 256;
/// Side of the square image input.
pub const IMAGE_SIZE: u32 = 224;

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

static ORT_ENV: OnceCell<Environment> = OnceCell::new();

fn ort_environment() -> Result<&'static Environment, EmbedError> {
    ORT_ENV.get_or_try_init(|| {
        Environment::builder()
            .with_name("twembed")
            .build()
            .map_err(inference)
    })
}

fn inference<E: ToString>(e: E) -> EmbedError {
    EmbedError::Inference(e.to_string())
}

fn asset(dir: &Path, file: &str) -> Result<PathBuf, EmbedError> {
    let path = dir.join(file);
    if path.is_file() {
        Ok(path)
    } else {
        Err(EmbedError::ModelNotFound(path.display().to_string()))
    }
}

fn load_session(path: &Path) -> Result<Session<'static>, EmbedError> {
    ort_environment()?
        .new_session_builder()
        .map_err(inference)?
        .with_model_from_file(path)
        .map_err(inference)
}

fn rows_to_matrix(rows: Vec<Vec<f32>>, model: ModelKind) -> Result<Matrix, EmbedError> {
    let nrows = rows.len();
    let ncols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|row| row.len() != ncols) {
        return Err(EmbedError::Shape(format!("{model} produced rows of differing width")));
    }
    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((nrows, ncols), flat)
        .map(Matrix::Dense)
        .map_err(|e| EmbedError::Shape(e.to_string()))
}

/// Tokenizer plus ONNX session for the elmo, bert, sbert and use models.
pub struct OnnxTextEncoder {
    model: ModelKind,
    tokenizer: Tokenizer,
    session: Session<'static>,
}

impl OnnxTextEncoder {
    pub fn load(model_root: &Path, model: ModelKind) -> Result<Self, EmbedError> {
        let dir = model_root.join(model.name());
        let model_path = asset(&dir, "model.onnx")?;
        let tokenizer_path = asset(&dir, "tokenizer.json")?;
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(inference)?;
        let session = load_session(&model_path)?;
        info!(model = %model, path = %model_path.display(), "onnx_text_encoder_loaded");
        Ok(Self {
            model,
            tokenizer,
            session,
        })
    }

    fn encode_batch(&self, texts: &[String]) -> Result<(Vec<Vec<i64>>, Vec<Vec<i64>>), EmbedError> {
        let mut ids = Vec::with_capacity(texts.len());
        let mut masks = Vec::with_capacity(texts.len());
        for text in texts {
            let encoding = self.tokenizer.encode(text.as_str(), true).map_err(inference)?;
            let mut doc_ids: Vec<i64> = encoding.get_ids().iter().map(|&x| x as i64).collect();
            let mut doc_mask: Vec<i64> = encoding
                .get_attention_mask()
                .iter()
                .map(|&x| x as i64)
                .collect();
            if doc_ids.len() != doc_mask.len() {
                return Err(EmbedError::Inference(
                    "tokenizer produced mismatched id/mask lengths".into(),
                ));
            }
            doc_ids.truncate(MAX_SEQUENCE_LENGTH);
            doc_mask.truncate(MAX_SEQUENCE_LENGTH);
            ids.push(doc_ids);
            masks.push(doc_mask);
        }
        Ok((ids, masks))
    }

    fn run_batch(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let (ids, mut masks) = self.encode_batch(texts)?;
        let batch = ids.len();
        let seq_len = ids.iter().map(Vec::len).max().unwrap_or(0).max(1);

        let mut id_storage = Vec::with_capacity(batch * seq_len);
        let mut mask_storage = Vec::with_capacity(batch * seq_len);
        for (doc_ids, doc_mask) in ids.into_iter().zip(masks.iter_mut()) {
            doc_mask.resize(seq_len, 0);
            id_storage.extend(doc_ids.iter().copied());
            id_storage.extend(std::iter::repeat(0).take(seq_len - doc_ids.len()));
            mask_storage.extend(doc_mask.iter().copied());
        }
        let input_ids = Array::from_shape_vec((batch, seq_len), id_storage).map_err(inference)?;
        let attn_mask = Array::from_shape_vec((batch, seq_len), mask_storage).map_err(inference)?;

        let mut runtime_inputs = Vec::with_capacity(self.session.inputs.len());
        let mut input_ids = Some(input_ids);
        let mut attn_mask = Some(attn_mask);
        for input in &self.session.inputs {
            let tensor = match input.name.as_str() {
                "input_ids" => input_ids.take(),
                "attention_mask" => attn_mask.take(),
                "token_type_ids" => Some(Array::from_elem((batch, seq_len), 0_i64)),
                other => {
                    return Err(EmbedError::Inference(format!(
                        "unsupported model input '{other}'"
                    )))
                }
            };
            let tensor = tensor.ok_or_else(|| {
                EmbedError::Inference(format!("model requested `{}` twice", input.name))
            })?;
            runtime_inputs.push(tensor.into_dyn());
        }
        if runtime_inputs.is_empty() {
            return Err(EmbedError::Inference("model did not declare any inputs".into()));
        }

        let outputs = self
            .session
            .run::<i64, f32, _>(runtime_inputs)
            .map_err(inference)?;
        let output = outputs
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::Inference("model returned no outputs".into()))?;
        let shape = output.shape().to_vec();
        let flat: Vec<f32> = output.iter().copied().collect();
        pool_token_outputs(&shape, &flat, &masks)
    }
}

impl Embedder for OnnxTextEncoder {
    fn name(&self) -> &str {
        self.model.name()
    }

    fn compute_vectors(&mut self, input: EmbedInput<'_>) -> Result<Matrix, EmbedError> {
        let texts = input.texts(self.model.name())?;
        let mut rows = Vec::with_capacity(texts.len());
        for (i, chunk) in texts.chunks(BATCH_SIZE).enumerate() {
            debug!(model = %self.model, batch = i, size = chunk.len(), "onnx_text_batch");
            rows.extend(self.run_batch(chunk)?);
        }
        rows_to_matrix(rows, self.model)
    }
}

/// CNN feature extractor for the resnet and densenet models.
pub struct OnnxImageEncoder {
    model: ModelKind,
    session: Session<'static>,
}

impl OnnxImageEncoder {
    pub fn load(model_root: &Path, model: ModelKind) -> Result<Self, EmbedError> {
        let model_path = asset(&model_root.join(model.name()), "model.onnx")?;
        let session = load_session(&model_path)?;
        info!(model = %model, path = %model_path.display(), "onnx_image_encoder_loaded");
        Ok(Self { model, session })
    }

    fn embed_image(&mut self, path: &Path) -> Result<Vec<f32>, EmbedError> {
        let tensor = preprocess(path)?;
        let outputs = self
            .session
            .run::<f32, f32, _>(vec![tensor.into_dyn()])
            .map_err(inference)?;
        let output = outputs
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::Inference("model returned no outputs".into()))?;
        let shape = output.shape().to_vec();
        let flat: Vec<f32> = output.iter().copied().collect();
        pool_image_output(&shape, &flat)
    }
}

/// RGB, resized to [`IMAGE_SIZE`], ImageNet-normalized, NCHW.
fn preprocess(path: &Path) -> Result<Array4<f32>, EmbedError> {
    let rgb = image::open(path)
        .map_err(|e| EmbedError::InvalidInput(format!("{}: {e}", path.display())))?
        .resize_exact(IMAGE_SIZE, IMAGE_SIZE, FilterType::Triangle)
        .to_rgb8();
    let side = IMAGE_SIZE as usize;
    Ok(Array::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
        let value = rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0;
        (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c]
    }))
}

impl Embedder for OnnxImageEncoder {
    fn name(&self) -> &str {
        self.model.name()
    }

    fn compute_vectors(&mut self, input: EmbedInput<'_>) -> Result<Matrix, EmbedError> {
        let dir = input.images(self.model.name())?;
        let files = image_files(dir)?;
        info!(model = %self.model, dir = %dir.display(), images = files.len(), "onnx_image_scan");
        let mut rows = Vec::with_capacity(files.len());
        for path in &files {
            rows.push(self.embed_image(path)?);
        }
        rows_to_matrix(rows, self.model)
    }
}
