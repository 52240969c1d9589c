//! Runtime configuration utilities for risk-triage.

use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use serde::Deserialize;

use crate::inference::DEFAULT_RISK_THRESHOLD;

/// Application configuration resolved from `.env` and defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Folder holding `manifest.json` plus vectorizer and model artifacts.
    pub models_dir: PathBuf,
    /// Root folder for persisted predictions.
    pub data_dir: PathBuf,
    /// At-risk decision threshold on the averaged probability.
    pub risk_threshold: f64,
    /// Optional stop-word list overriding the bundled English one.
    pub stopwords_path: Option<PathBuf>,
    /// Optional lemma resource overriding the bundled English one.
    pub lemmas_path: Option<PathBuf>,
}

impl Settings {
    /// Load configuration from environment with reasonable defaults.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let models_dir = env::var("MODELS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./models"));
        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));
        let risk_threshold = match env::var("RISK_THRESHOLD") {
            Ok(raw) => parse_threshold(&raw)?,
            Err(_) => DEFAULT_RISK_THRESHOLD,
        };
        let stopwords_path = env::var("STOPWORDS_PATH").ok().map(PathBuf::from);
        let lemmas_path = env::var("LEMMAS_PATH").ok().map(PathBuf::from);

        std::fs::create_dir_all(&data_dir).context("creating data dir")?;

        Ok(Self {
            models_dir,
            data_dir,
            risk_threshold,
            stopwords_path,
            lemmas_path,
        })
    }

    /// Settings rooted at explicit directories, everything else defaulted.
    pub fn with_dirs(models_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
            data_dir: data_dir.into(),
            risk_threshold: DEFAULT_RISK_THRESHOLD,
            stopwords_path: None,
            lemmas_path: None,
        }
    }

    /// Convenience helper for derived path segments.
    pub fn join_data<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.data_dir.join(path)
    }
}

fn parse_threshold(raw: &str) -> anyhow::Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .with_context(|| format!("RISK_THRESHOLD `{raw}` is not a number"))?;
    if !(0.0..=1.0).contains(&value) {
        bail!("RISK_THRESHOLD must lie in [0, 1], got {value}");
    }
    Ok(value)
}
