//! Surrogate classifier backbone standing in for a pretrained network.
//!
//! The backbone average-pools the input to a small feature map and applies a
//! deterministic linear layer with softmax. It exists to exercise the
//! inference path; the detector does not derive medical meaning from the
//! prediction vector.

use std::path::Path;

use ndarray::{Array1, Array2, Array4};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{StageError, StageResult};

pub const CLASS_COUNT: usize = 1000;
const POOL_GRID: usize = 7;
const WEIGHT_SEED: u64 = 0x00B0_DE5A;

/// Serialized weight bundle for a custom classifier.
#[derive(Debug, Serialize, Deserialize)]
pub struct WeightBundle {
    pub pool_grid: usize,
    pub classes: usize,
    pub weights: Vec<f32>,
    pub bias: Vec<f32>,
}

pub struct Classifier {
    pool_grid: usize,
    weights: Array2<f32>,
    bias: Array1<f32>,
}

impl Classifier {
    /// Builds the bundled backbone with deterministic seeded weights.
    pub fn pretrained() -> Self {
        let features = POOL_GRID * POOL_GRID * 3;
        let mut rng = StdRng::seed_from_u64(WEIGHT_SEED);
        let weights =
            Array2::from_shape_fn((features, CLASS_COUNT), |_| rng.gen_range(-0.05..0.05));
        let bias = Array1::from_shape_fn(CLASS_COUNT, |_| rng.gen_range(-0.01..0.01));
        Self {
            pool_grid: POOL_GRID,
            weights,
            bias,
        }
    }

    /// Loads a custom weight bundle from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> StageResult<Self> {
        let path_ref = path.as_ref();
        let contents = std::fs::read_to_string(path_ref).map_err(|err| {
            StageError::Internal(format!("reading model {}: {}", path_ref.display(), err))
        })?;
        let bundle: WeightBundle = serde_json::from_str(&contents).map_err(|err| {
            StageError::Internal(format!("parsing model {}: {}", path_ref.display(), err))
        })?;

        let features = bundle.pool_grid * bundle.pool_grid * 3;
        if bundle.weights.len() != features * bundle.classes || bundle.bias.len() != bundle.classes
        {
            return Err(StageError::Internal(format!(
                "model {} has inconsistent shapes",
                path_ref.display()
            )));
        }
        let weights = Array2::from_shape_vec((features, bundle.classes), bundle.weights)
            .map_err(|err| StageError::Internal(format!("model weights: {}", err)))?;
        Ok(Self {
            pool_grid: bundle.pool_grid,
            weights,
            bias: Array1::from_vec(bundle.bias),
        })
    }

    pub fn class_count(&self) -> usize {
        self.bias.len()
    }

    /// Runs the forward pass over a batched `(1, edge, edge, 3)` tensor and
    /// returns the softmax prediction vector.
    pub fn predict(&self, input: &Array4<f32>) -> StageResult<Array1<f32>> {
        let shape = input.shape();
        if shape[0] != 1 || shape[3] != 3 {
            return Err(StageError::InvalidInput(format!(
                "expected batched (1, h, w, 3) input, got {:?}",
                shape
            )));
        }
        let (height, width) = (shape[1], shape[2]);
        if height < self.pool_grid || width < self.pool_grid {
            return Err(StageError::InvalidInput(format!(
                "input {}x{} smaller than pooling grid {}",
                width, height, self.pool_grid
            )));
        }

        // Global average pooling onto a pool_grid x pool_grid x 3 map.
        let grid = self.pool_grid;
        let mut features = Array1::zeros(grid * grid * 3);
        for gy in 0..grid {
            let y0 = gy * height / grid;
            let y1 = ((gy + 1) * height / grid).max(y0 + 1);
            for gx in 0..grid {
                let x0 = gx * width / grid;
                let x1 = ((gx + 1) * width / grid).max(x0 + 1);
                let cell_area = ((y1 - y0) * (x1 - x0)) as f32;
                for channel in 0..3 {
                    let mut acc = 0.0f32;
                    for y in y0..y1 {
                        for x in x0..x1 {
                            acc += input[[0, y, x, channel]];
                        }
                    }
                    features[(gy * grid + gx) * 3 + channel] = acc / cell_area;
                }
            }
        }

        let logits = features.dot(&self.weights) + &self.bias;
        Ok(softmax(logits))
    }
}

fn softmax(logits: Array1<f32>) -> Array1<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps = logits.mapv(|v| (v - max).exp());
    let total: f32 = exps.sum();
    exps / total
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn prediction_vector_is_a_distribution() {
        let classifier = Classifier::pretrained();
        let input = Array4::from_elem((1, 224, 224, 3), 0.5f32);
        let prediction = classifier.predict(&input).unwrap();
        assert_eq!(prediction.len(), CLASS_COUNT);
        let total: f32 = prediction.sum();
        assert!((total - 1.0).abs() < 1e-3);
        assert!(prediction.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn rejects_unbatched_input() {
        let classifier = Classifier::pretrained();
        let input = Array4::from_elem((2, 224, 224, 3), 0.5f32);
        assert!(classifier.predict(&input).is_err());
    }

    #[test]
    fn custom_bundle_loads_from_json() {
        let bundle = WeightBundle {
            pool_grid: 2,
            classes: 4,
            weights: vec![0.01; 2 * 2 * 3 * 4],
            bias: vec![0.0; 4],
        };
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&bundle).unwrap().as_bytes())
            .unwrap();
        let classifier = Classifier::from_file(file.path()).unwrap();
        assert_eq!(classifier.class_count(), 4);

        let input = Array4::from_elem((1, 8, 8, 3), 1.0f32);
        let prediction = classifier.predict(&input).unwrap();
        assert_eq!(prediction.len(), 4);
    }
}
