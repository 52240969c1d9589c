//! Deterministic text cleaning applied before vectorization.

use tracing::info;

use crate::{
    config::Settings,
    error::PipelineResult,
    nlp::lexicon::{Lemmatizer, StopWords},
};

/// Lowercase, strip punctuation, drop stop words, lemmatize.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    stop_words: StopWords,
    lemmatizer: Lemmatizer,
}

impl TextNormalizer {
    pub fn new(stop_words: StopWords, lemmatizer: Lemmatizer) -> Self {
        let lemmatizer = lemmatizer.exclude(&stop_words);
        Self {
            stop_words,
            lemmatizer,
        }
    }

    /// Normalizer backed by the bundled English resources.
    pub fn english() -> Self {
        Self::new(StopWords::english(), Lemmatizer::english())
    }

    /// Build from configured resource paths, falling back to bundled ones.
    pub fn from_settings(settings: &Settings) -> PipelineResult<Self> {
        let stop_words = match &settings.stopwords_path {
            Some(path) => StopWords::from_path(path)?,
            None => StopWords::english(),
        };
        let lemmatizer = match &settings.lemmas_path {
            Some(path) => Lemmatizer::from_path(path)?,
            None => Lemmatizer::english(),
        };
        info!(stop_words = stop_words.len(), "text normalizer ready");
        Ok(Self::new(stop_words, lemmatizer))
    }

    pub fn normalize(&self, text: &str) -> String {
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_ascii_punctuation())
            .collect();
        cleaned
            .split_whitespace()
            .filter(|token| !self.stop_words.contains(token))
            .map(|token| self.lemmatizer.lemmatize(token))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
