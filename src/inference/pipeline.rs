//! End-to-end scoring: normalize, encode, score, aggregate.

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::{
    config::Settings,
    error::{PipelineError, PipelineResult},
    inference::aggregate::{AggregationPolicy, Verdict},
    models::{Emotion, Manifest, ModelEnsemble, RiskLabel, Task},
    nlp::{TextNormalizer, TfidfVectorizer},
};

/// Final decision for one input text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregatedResult {
    #[serde(rename = "prediction")]
    pub risk_label: RiskLabel,
    #[serde(rename = "probability")]
    pub risk_probability: f64,
    #[serde(rename = "emotion")]
    pub emotion_label: Emotion,
}

/// Everything loaded at startup. Never mutated after construction.
#[derive(Debug)]
pub struct InferenceContext {
    normalizer: TextNormalizer,
    risk_vectorizer: TfidfVectorizer,
    emotion_vectorizer: TfidfVectorizer,
    ensemble: ModelEnsemble,
    risk_policy: AggregationPolicy,
    emotion_policy: AggregationPolicy,
}

impl InferenceContext {
    /// Wire loaded resources together, checking vocabulary widths against models.
    pub fn new(
        normalizer: TextNormalizer,
        risk_vectorizer: TfidfVectorizer,
        emotion_vectorizer: TfidfVectorizer,
        ensemble: ModelEnsemble,
        risk_threshold: f64,
    ) -> PipelineResult<Self> {
        ensemble.check_dimension(Task::Risk, risk_vectorizer.dimension())?;
        ensemble.check_dimension(Task::Emotion, emotion_vectorizer.dimension())?;
        Ok(Self {
            normalizer,
            risk_vectorizer,
            emotion_vectorizer,
            ensemble,
            risk_policy: AggregationPolicy::mean_threshold(risk_threshold),
            emotion_policy: AggregationPolicy::plurality(),
        })
    }

    /// Load every artifact named by the manifest in `settings.models_dir`.
    pub fn load(settings: &Settings) -> PipelineResult<Self> {
        let manifest = Manifest::load(&settings.models_dir)?;
        let normalizer = TextNormalizer::from_settings(settings)?;
        let risk_vectorizer =
            TfidfVectorizer::load(&settings.models_dir.join(&manifest.risk.vectorizer))?;
        let emotion_vectorizer =
            TfidfVectorizer::load(&settings.models_dir.join(&manifest.emotion.vectorizer))?;
        let ensemble = ModelEnsemble::load(&settings.models_dir, &manifest)?;
        let context = Self::new(
            normalizer,
            risk_vectorizer,
            emotion_vectorizer,
            ensemble,
            settings.risk_threshold,
        )?;
        info!(
            models_dir = %settings.models_dir.display(),
            risk_threshold = settings.risk_threshold,
            "inference context loaded"
        );
        Ok(context)
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    pub fn ensemble(&self) -> &ModelEnsemble {
        &self.ensemble
    }

    pub fn vectorizer(&self, task: Task) -> &TfidfVectorizer {
        match task {
            Task::Risk => &self.risk_vectorizer,
            Task::Emotion => &self.emotion_vectorizer,
        }
    }

    pub fn risk_policy(&self) -> AggregationPolicy {
        self.risk_policy
    }
}

/// Stateless runner over an owned [`InferenceContext`]; share it behind an `Arc`.
#[derive(Debug)]
pub struct InferencePipeline {
    context: InferenceContext,
}

impl InferencePipeline {
    pub fn new(context: InferenceContext) -> Self {
        Self { context }
    }

    pub fn load(settings: &Settings) -> PipelineResult<Self> {
        InferenceContext::load(settings).map(Self::new)
    }

    pub fn context(&self) -> &InferenceContext {
        &self.context
    }

    /// Score `raw_text`. Either every stage succeeds or a single error is returned.
    #[instrument(skip_all, fields(chars = raw_text.len()))]
    pub fn run(&self, raw_text: &str) -> PipelineResult<AggregatedResult> {
        let ctx = &self.context;
        let normalized = ctx.normalizer.normalize(raw_text);
        debug!(tokens = normalized.split_whitespace().count(), "normalized input");

        let risk_features = ctx.risk_vectorizer.encode(&normalized)?;
        let emotion_features = ctx.emotion_vectorizer.encode(&normalized)?;

        let risk_outputs = ctx.ensemble.score_risk(&risk_features)?;
        let emotion_outputs = ctx.ensemble.score_emotion(&emotion_features)?;

        let (risk_label, risk_probability) =
            match ctx.risk_policy.aggregate(Task::Risk, &risk_outputs)? {
                Verdict::Threshold {
                    positive, accepted, ..
                } => {
                    let label = if accepted {
                        RiskLabel::AtRisk
                    } else {
                        RiskLabel::NotAtRisk
                    };
                    (label, positive)
                }
                other => return Err(unexpected(Task::Risk, other)),
            };

        let emotion_label = match ctx.emotion_policy.aggregate(Task::Emotion, &emotion_outputs)? {
            Verdict::Vote { label, .. } => Emotion::from_index(label).ok_or_else(|| {
                PipelineError::shape(
                    Task::Emotion,
                    "<ensemble>",
                    format!("winning label {label} is outside the taxonomy"),
                )
            })?,
            other => return Err(unexpected(Task::Emotion, other)),
        };

        let result = AggregatedResult {
            risk_label,
            risk_probability,
            emotion_label,
        };
        debug!(?result, "aggregated");
        Ok(result)
    }
}

fn unexpected(task: Task, verdict: Verdict) -> PipelineError {
    PipelineError::shape(
        task,
        "<ensemble>",
        format!("aggregation produced {verdict:?}"),
    )
}
