#![allow(dead_code)]

use std::{fs, path::Path};

use risk_triage::{
    config::Settings,
    inference::{InferenceContext, InferencePipeline},
    models::{Classifier, Emotion, Member, ModelEnsemble},
    nlp::{FeatureVector, TextNormalizer, TfidfVectorizer},
};
use serde_json::{json, Value};
use tempfile::TempDir;

pub const SAD_TEXT: &str = "I feel very sad and hopeless.";

/// Models directory populated with a small but complete artifact set.
pub struct Fixture {
    pub dir: TempDir,
    pub settings: Settings,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let models = dir.path().join("models");
        fs::create_dir_all(&models).expect("create models dir");
        write_artifacts(&models);
        let settings = Settings::with_dirs(&models, dir.path().join("data"));
        Self { dir, settings }
    }

    pub fn models_dir(&self) -> &Path {
        &self.settings.models_dir
    }

    pub fn pipeline(&self) -> InferencePipeline {
        InferencePipeline::load(&self.settings).expect("fixture artifacts load")
    }
}

fn write(dir: &Path, name: &str, value: Value) {
    let body = serde_json::to_string_pretty(&value).expect("serialise fixture");
    fs::write(dir.join(name), body).expect("write fixture");
}

fn ln(p: f64) -> f64 {
    p.ln()
}

fn write_artifacts(dir: &Path) {
    write(
        dir,
        "manifest.json",
        json!({
            "risk": {
                "vectorizer": "tfidf_risk.json",
                "models": [
                    {"name": "logistic_regression", "path": "risk_logreg.json"},
                    {"name": "naive_bayes", "path": "risk_nb.json"},
                    {"name": "random_forest", "path": "risk_rf.json"},
                    {"name": "xgboost", "path": "risk_xgb.json"}
                ]
            },
            "emotion": {
                "vectorizer": "tfidf_emotion.json",
                "models": [
                    {"name": "logistic_regression", "path": "emotion_logreg.json"},
                    {"name": "naive_bayes", "path": "emotion_nb.json"},
                    {"name": "random_forest", "path": "emotion_rf.json"},
                    {"name": "xgboost", "path": "emotion_xgb.json"}
                ]
            }
        }),
    );

    write(
        dir,
        "tfidf_risk.json",
        json!({
            "vocabulary": {"feel": 0, "sad": 1, "hopeless": 2, "happy": 3},
            "idf": [1.0, 1.0, 1.0, 1.0]
        }),
    );
    write(
        dir,
        "tfidf_emotion.json",
        json!({
            "vocabulary": {"sad": 0, "hopeless": 1, "happy": 2, "angry": 3},
            "idf": [1.0, 1.0, 1.0, 1.0],
            "norm": "l2"
        }),
    );

    write(
        dir,
        "risk_logreg.json",
        json!({
            "kind": "logistic_regression",
            "classes": [0, 1],
            "coef": [[0.0, 3.0, 3.0, -3.0]],
            "intercept": [-1.0]
        }),
    );
    write(
        dir,
        "risk_nb.json",
        json!({
            "kind": "multinomial_nb",
            "classes": [0, 1],
            "class_log_prior": [ln(0.5), ln(0.5)],
            "feature_log_prob": [
                [ln(0.4), ln(0.1), ln(0.1), ln(0.4)],
                [ln(0.2), ln(0.4), ln(0.3), ln(0.1)]
            ]
        }),
    );
    write(
        dir,
        "risk_rf.json",
        json!({
            "kind": "random_forest",
            "classes": [0, 1],
            "n_features": 4,
            "trees": [{"nodes": [
                {"type": "split", "feature": 2, "threshold": 0.0, "left": 1, "right": 2},
                {"type": "leaf", "value": [0.9, 0.1]},
                {"type": "leaf", "value": [0.2, 0.8]}
            ]}]
        }),
    );
    write(
        dir,
        "risk_xgb.json",
        json!({
            "kind": "gradient_boosting",
            "classes": [0, 1],
            "n_features": 4,
            "base_margin": 0.0,
            "trees": [{"nodes": [
                {"type": "split", "feature": 1, "threshold": 0.1, "left": 1, "right": 2, "default_left": true},
                {"type": "leaf", "value": -2.0},
                {"type": "leaf", "value": 1.5}
            ]}]
        }),
    );

    let mut coef = vec![vec![0.0; 4]; 6];
    coef[0] = vec![2.0, 2.0, 0.0, 0.0];
    coef[1] = vec![0.0, 0.0, 2.0, 0.0];
    coef[3] = vec![0.0, 0.0, 0.0, 2.0];
    write(
        dir,
        "emotion_logreg.json",
        json!({
            "kind": "logistic_regression",
            "classes": [0, 1, 2, 3, 4, 5],
            "coef": coef,
            "intercept": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        }),
    );
    write(
        dir,
        "emotion_nb.json",
        json!({
            "kind": "multinomial_nb",
            "classes": [0, 1, 3],
            "class_log_prior": [ln(1.0 / 3.0), ln(1.0 / 3.0), ln(1.0 / 3.0)],
            "feature_log_prob": [
                [ln(0.4), ln(0.4), ln(0.1), ln(0.1)],
                [ln(0.1), ln(0.1), ln(0.4), ln(0.4)],
                [ln(0.1), ln(0.1), ln(0.1), ln(0.7)]
            ]
        }),
    );
    write(
        dir,
        "emotion_rf.json",
        json!({
            "kind": "random_forest",
            "classes": [0, 1, 3, 4],
            "n_features": 4,
            "trees": [{"nodes": [
                {"type": "split", "feature": 2, "threshold": 0.0, "left": 1, "right": 2},
                {"type": "leaf", "value": [0.0, 0.0, 5.0, 1.0]},
                {"type": "leaf", "value": [0.0, 6.0, 0.0, 0.0]}
            ]}]
        }),
    );
    let stumps: Vec<Value> = (0..6)
        .map(|class| {
            let leaf = if class == 4 { 1.0 } else { 0.0 };
            json!({"nodes": [{"type": "leaf", "value": leaf}]})
        })
        .collect();
    write(
        dir,
        "emotion_xgb.json",
        json!({
            "kind": "gradient_boosting",
            "classes": [0, 1, 2, 3, 4, 5],
            "n_features": 4,
            "base_margin": 0.5,
            "trees": stumps
        }),
    );
}

/// At-risk probability the fixture ensemble assigns to [`SAD_TEXT`].
pub fn expected_sad_probability() -> f64 {
    let s = 1.0 / 3f64.sqrt();
    let sigmoid = |z: f64| 1.0 / (1.0 + (-z).exp());
    let logreg = sigmoid(6.0 * s - 1.0);
    let nb = sigmoid((ln(0.2 / 0.4) + ln(0.4 / 0.1) + ln(0.3 / 0.1)) * s);
    let forest = 0.8;
    let booster = sigmoid(1.5);
    (logreg + nb + forest + booster) / 4.0
}

/// Classifier that ignores its input and reports a fixed distribution.
pub struct Fixed {
    classes: Vec<usize>,
    proba: Vec<f64>,
}

impl Classifier for Fixed {
    fn n_features(&self) -> usize {
        1
    }

    fn classes(&self) -> &[usize] {
        &self.classes
    }

    fn predict_proba(&self, _x: &FeatureVector) -> Vec<f64> {
        self.proba.clone()
    }
}

pub fn risk_stub(at_risk: f64) -> Member {
    Member::new(
        format!("fixed-{at_risk}"),
        Box::new(Fixed {
            classes: vec![0, 1],
            proba: vec![1.0 - at_risk, at_risk],
        }),
    )
}

pub fn emotion_stub(emotion: Emotion) -> Member {
    let mut proba = vec![0.0; 6];
    proba[emotion.index()] = 1.0;
    Member::new(
        emotion.as_str(),
        Box::new(Fixed {
            classes: (0..6).collect(),
            proba,
        }),
    )
}

/// Emotion member whose distribution is one entry longer than its classes.
pub fn ragged_emotion_stub() -> Member {
    Member::new(
        "ragged",
        Box::new(Fixed {
            classes: (0..6).collect(),
            proba: vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
        }),
    )
}

/// Pipeline over constant-output members and one-term vocabularies.
pub fn stub_pipeline(risk: &[f64], emotions: &[Emotion], threshold: f64) -> InferencePipeline {
    pipeline_with(
        risk.iter().copied().map(risk_stub).collect(),
        emotions.iter().copied().map(emotion_stub).collect(),
        threshold,
    )
}

pub fn pipeline_with(risk: Vec<Member>, emotion: Vec<Member>, threshold: f64) -> InferencePipeline {
    let vocab = |term: &str| {
        TfidfVectorizer::from_parts([(term.to_string(), 0)].into_iter().collect(), vec![1.0])
            .expect("valid vectorizer")
    };
    let ensemble = ModelEnsemble::new(risk, emotion).expect("valid ensemble");
    let context = InferenceContext::new(
        TextNormalizer::english(),
        vocab("sad"),
        vocab("sad"),
        ensemble,
        threshold,
    )
    .expect("valid context");
    InferencePipeline::new(context)
}
