//! Pre-trained classifier backends and the per-task ensembles built from them.

pub mod ensemble;
pub mod labels;
pub mod linear;
pub mod trees;

use std::{fmt, path::Path};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::{PipelineError, PipelineResult},
    nlp::FeatureVector,
};

pub use ensemble::{Manifest, Member, ModelEnsemble};
pub use labels::{Emotion, RiskLabel};

/// The two scoring tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    Risk,
    Emotion,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Risk => f.write_str("risk"),
            Self::Emotion => f.write_str("emotion"),
        }
    }
}

/// What one ensemble member reports for one input.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    /// Probability per class, in class order.
    Distribution(Vec<f64>),
    /// Discrete class label.
    Label(usize),
}

/// Capability shared by every model backend.
pub trait Classifier: Send + Sync {
    /// Width of the feature vectors the model was fitted on.
    fn n_features(&self) -> usize;

    /// Class labels in column order of [`Classifier::predict_proba`].
    fn classes(&self) -> &[usize];

    /// Calibrated probability distribution over [`Classifier::classes`].
    fn predict_proba(&self, x: &FeatureVector) -> Vec<f64>;

    /// Most probable class label, or `None` when the distribution and
    /// [`Classifier::classes`] differ in length.
    fn predict_label(&self, x: &FeatureVector) -> Option<usize> {
        let proba = self.predict_proba(x);
        if proba.len() != self.classes().len() {
            return None;
        }
        Some(self.classes()[argmax(&proba)])
    }
}

/// Serialized model export, tagged by backend kind.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ModelArtifact {
    LogisticRegression(linear::LogisticRegressionArtifact),
    MultinomialNb(linear::MultinomialNbArtifact),
    RandomForest(trees::RandomForest),
    GradientBoosting(trees::GradientBoosting),
}

impl ModelArtifact {
    fn into_classifier(self) -> Result<Box<dyn Classifier>, String> {
        Ok(match self {
            Self::LogisticRegression(artifact) => Box::new(artifact.build()?),
            Self::MultinomialNb(artifact) => Box::new(artifact.build()?),
            Self::RandomForest(forest) => Box::new(forest.validated()?),
            Self::GradientBoosting(booster) => Box::new(booster.validated()?),
        })
    }
}

/// Load one model artifact from disk and validate its structure.
pub fn load_model(path: &Path) -> PipelineResult<Box<dyn Classifier>> {
    let raw = std::fs::read_to_string(path).map_err(|e| PipelineError::init(path, e))?;
    let artifact: ModelArtifact =
        serde_json::from_str(&raw).map_err(|e| PipelineError::init(path, e))?;
    let model = artifact
        .into_classifier()
        .map_err(|e| PipelineError::init(path, e))?;
    info!(
        path = %path.display(),
        n_features = model.n_features(),
        classes = model.classes().len(),
        "loaded model"
    );
    Ok(model)
}

pub(crate) fn check_classes(classes: &[usize]) -> Result<(), String> {
    if classes.len() < 2 {
        return Err(format!("need at least two classes, got {}", classes.len()));
    }
    let mut seen = classes.to_vec();
    seen.sort_unstable();
    seen.dedup();
    if seen.len() != classes.len() {
        return Err("class labels must be unique".into());
    }
    Ok(())
}

pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (idx, value) in values.iter().enumerate() {
        if *value > values[best] {
            best = idx;
        }
    }
    best
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Numerically stable softmax.
pub(crate) fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_sums_to_one_for_large_logits() {
        let probs = softmax(&[1000.0, 1001.0, 999.0]);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(argmax(&probs), 1);
    }

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.5, 0.5]), 0);
    }

    #[test]
    fn unknown_kind_is_an_initialisation_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("svm.json");
        std::fs::write(&path, r#"{"kind": "svm", "classes": [0, 1]}"#).expect("write");
        let err = load_model(&path).err().expect("load fails");
        assert!(matches!(err, PipelineError::Initialization { .. }));
    }
}
