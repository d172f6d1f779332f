use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::features::FeatureRow;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model artifact not found at {path}: {source}")]
    ArtifactMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model artifact is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("model bundle declares no features or no disease classes")]
    EmptySchema,
}

/// Inference boundary consumed by the forecaster.
///
/// Implementations must be pure over the feature row; the forecaster relies on
/// that for its determinism guarantee.
pub trait SurgePredictor {
    fn predict_load(&self, row: &FeatureRow) -> Result<f64, ModelError>;
    fn predict_disease(&self, row: &FeatureRow) -> Result<String, ModelError>;
}

/// Per-class linear scorer for the disease classifier
#[derive(Debug, Deserialize)]
pub struct ClassScorer {
    pub intercept: f64,
    pub weights: HashMap<String, f64>,
}

/// Trained model bundle exported as a JSON artifact.
///
/// Holds the trained feature list (order authoritative for alignment), a
/// linear patient-load regressor, and one linear scorer per disease class
/// resolved by argmax. Loaded once at startup; immutable afterwards.
#[derive(Debug, Deserialize)]
pub struct ModelBundle {
    pub features: Vec<String>,
    pub load_intercept: f64,
    pub load_weights: HashMap<String, f64>,
    pub disease_classes: Vec<String>,
    pub disease_scorers: HashMap<String, ClassScorer>,
}

impl ModelBundle {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = fs::read_to_string(path).map_err(|source| ModelError::ArtifactMissing {
            path: path.to_path_buf(),
            source,
        })?;
        let bundle: Self = serde_json::from_str(&raw)?;
        bundle.validate()?;
        Ok(bundle)
    }

    pub fn from_json(raw: &str) -> Result<Self, ModelError> {
        let bundle: Self = serde_json::from_str(raw)?;
        bundle.validate()?;
        Ok(bundle)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.features.is_empty() || self.disease_classes.is_empty() {
            return Err(ModelError::EmptySchema);
        }
        Ok(())
    }

    fn score(&self, row: &FeatureRow, intercept: f64, weights: &HashMap<String, f64>) -> f64 {
        let aligned = row.aligned(&self.features);
        self.features
            .iter()
            .zip(&aligned)
            .fold(intercept, |acc, (feature, value)| {
                acc + weights.get(feature).copied().unwrap_or(0.0) * value
            })
    }
}

impl SurgePredictor for ModelBundle {
    fn predict_load(&self, row: &FeatureRow) -> Result<f64, ModelError> {
        Ok(self.score(row, self.load_intercept, &self.load_weights))
    }

    fn predict_disease(&self, row: &FeatureRow) -> Result<String, ModelError> {
        // Argmax over class scores; declaration order breaks exact ties.
        let mut best: Option<(&str, f64)> = None;
        for class in &self.disease_classes {
            let scorer = match self.disease_scorers.get(class) {
                Some(s) => s,
                None => continue,
            };
            let score = self.score(row, scorer.intercept, &scorer.weights);
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((class, score)),
            }
        }
        best.map(|(class, _)| class.to_string())
            .ok_or(ModelError::EmptySchema)
    }
}
