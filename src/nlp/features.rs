//! TF-IDF feature encoding against pre-fitted vocabularies.

use std::{collections::HashMap, path::Path};

use ndarray::Array1;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{PipelineError, PipelineResult};

/// Dense per-task feature vector.
pub type FeatureVector = Array1<f64>;

const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

static DEFAULT_TOKENIZER: Lazy<Regex> =
    Lazy::new(|| Regex::new(DEFAULT_TOKEN_PATTERN).expect("valid regex"));

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

/// On-disk export of a fitted TF-IDF vectorizer.
#[derive(Debug, Deserialize)]
struct VectorizerArtifact {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    #[serde(default = "default_norm")]
    norm: Option<Norm>,
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default = "default_token_pattern")]
    token_pattern: String,
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

fn default_token_pattern() -> String {
    DEFAULT_TOKEN_PATTERN.to_string()
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

/// Read-only TF-IDF vocabulary; one instance per task.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    norm: Option<Norm>,
    sublinear_tf: bool,
    token_pattern: Regex,
    ngram_range: (usize, usize),
}

impl TfidfVectorizer {
    /// Load and validate a vectorizer artifact.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| PipelineError::init(path, e))?;
        let artifact: VectorizerArtifact =
            serde_json::from_str(&raw).map_err(|e| PipelineError::init(path, e))?;
        let vectorizer = Self::from_artifact(artifact).map_err(|e| PipelineError::init(path, e))?;
        info!(
            path = %path.display(),
            dimension = vectorizer.dimension(),
            "loaded tf-idf vocabulary"
        );
        Ok(vectorizer)
    }

    /// Build from in-memory parts with the default analyzer settings.
    pub fn from_parts(vocabulary: HashMap<String, usize>, idf: Vec<f64>) -> Result<Self, String> {
        Self::from_artifact(VectorizerArtifact {
            vocabulary,
            idf,
            norm: default_norm(),
            sublinear_tf: false,
            token_pattern: default_token_pattern(),
            ngram_range: default_ngram_range(),
        })
    }

    fn from_artifact(artifact: VectorizerArtifact) -> Result<Self, String> {
        let dimension = artifact.idf.len();
        if artifact.vocabulary.len() != dimension {
            return Err(format!(
                "vocabulary has {} terms but idf has {} weights",
                artifact.vocabulary.len(),
                dimension
            ));
        }
        if let Some((term, idx)) = artifact
            .vocabulary
            .iter()
            .find(|(_, &idx)| idx >= dimension)
        {
            return Err(format!("term `{term}` maps to column {idx} outside {dimension}"));
        }
        if artifact.idf.iter().any(|w| !w.is_finite()) {
            return Err("idf weights must be finite".into());
        }
        let (min_n, max_n) = artifact.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(format!("invalid ngram range ({min_n}, {max_n})"));
        }
        let token_pattern = if artifact.token_pattern == DEFAULT_TOKEN_PATTERN {
            DEFAULT_TOKENIZER.clone()
        } else {
            Regex::new(&artifact.token_pattern)
                .map_err(|e| format!("invalid token pattern: {e}"))?
        };
        Ok(Self {
            vocabulary: artifact.vocabulary,
            idf: artifact.idf,
            norm: artifact.norm,
            sublinear_tf: artifact.sublinear_tf,
            token_pattern,
            ngram_range: artifact.ngram_range,
        })
    }

    pub fn dimension(&self) -> usize {
        self.idf.len()
    }

    /// Encode normalized text; empty input gives the zero vector.
    pub fn encode(&self, normalized: &str) -> PipelineResult<FeatureVector> {
        let mut vector = Array1::<f64>::zeros(self.dimension());
        for term in self.analyze(normalized) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                vector[idx] += 1.0;
            }
        }
        if self.sublinear_tf {
            vector.mapv_inplace(|tf| if tf > 0.0 { 1.0 + tf.ln() } else { 0.0 });
        }
        for (value, weight) in vector.iter_mut().zip(&self.idf) {
            *value *= weight;
        }
        let magnitude = match self.norm {
            Some(Norm::L2) => vector.dot(&vector).sqrt(),
            Some(Norm::L1) => vector.iter().map(|v| v.abs()).sum(),
            None => 0.0,
        };
        if magnitude > 0.0 {
            vector /= magnitude;
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::Encoding(
                "tf-idf weighting produced a non-finite value".into(),
            ));
        }
        debug!(
            nnz = vector.iter().filter(|v| **v != 0.0).count(),
            "encoded text"
        );
        Ok(vector)
    }

    fn analyze(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = self
            .token_pattern
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .collect();
        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n.min(tokens.len()) {
            terms.extend(tokens.windows(n).map(|window| window.join(" ")));
        }
        terms
    }
}
