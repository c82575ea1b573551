//! Reductions from raw encoder outputs to one vector per input.
use ndarray::{ArrayView2, ArrayView3, Axis};

use crate::EmbedError;

fn shape_err(e: ndarray::ShapeError) -> EmbedError {
    EmbedError::Shape(e.to_string())
}

/// One vector per batch item from a text encoder output.
///
/// `[batch, hidden]` outputs are already pooled and pass through.
/// `[batch, tokens, hidden]` outputs are averaged over the tokens whose
/// attention mask is non-zero; an item with no such token maps to zeros.
pub fn pool_token_outputs(
    shape: &[usize],
    flat: &[f32],
    mask: &[Vec<i64>],
) -> Result<Vec<Vec<f32>>, EmbedError> {
    if shape.first() != Some(&mask.len()) {
        return Err(EmbedError::Shape(format!(
            "output shape {shape:?} does not match batch of {}",
            mask.len()
        )));
    }
    match *shape {
        [batch, hidden] => {
            let view = ArrayView2::from_shape((batch, hidden), flat).map_err(shape_err)?;
            Ok(view.outer_iter().map(|row| row.to_vec()).collect())
        }
        [batch, tokens, hidden] => {
            let view = ArrayView3::from_shape((batch, tokens, hidden), flat).map_err(shape_err)?;
            let pooled = view
                .outer_iter()
                .zip(mask)
                .map(|(doc, doc_mask)| {
                    let mut acc = vec![0f32; hidden];
                    let mut kept = 0usize;
                    for (token, &m) in doc.outer_iter().zip(doc_mask) {
                        if m == 0 {
                            continue;
                        }
                        for (a, &v) in acc.iter_mut().zip(token.iter()) {
                            *a += v;
                        }
                        kept += 1;
                    }
                    if kept > 0 {
                        acc.iter_mut().for_each(|a| *a /= kept as f32);
                    }
                    acc
                })
                .collect();
            Ok(pooled)
        }
        _ => Err(EmbedError::Shape(format!(
            "unsupported text encoder output shape {shape:?}"
        ))),
    }
}

/// Feature vector of a single image from a CNN output.
///
/// `[1, channels]` passes through, `[1, channels, h, w]` is averaged over
/// the spatial positions.
pub fn pool_image_output(shape: &[usize], flat: &[f32]) -> Result<Vec<f32>, EmbedError> {
    match *shape {
        [1, channels] => {
            let view = ArrayView2::from_shape((1, channels), flat).map_err(shape_err)?;
            Ok(view.row(0).to_vec())
        }
        [1, channels, h, w] => {
            let view = ArrayView2::from_shape((channels, h * w), flat).map_err(shape_err)?;
            view.mean_axis(Axis(1))
                .map(|mean| mean.to_vec())
                .ok_or_else(|| EmbedError::Shape(format!("empty spatial output {shape:?}")))
        }
        _ => Err(EmbedError::Shape(format!(
            "unsupported image encoder output shape {shape:?}"
        ))),
    }
}
