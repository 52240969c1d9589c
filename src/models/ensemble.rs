//! Per-task ensembles and the manifest that configures their membership.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    error::{PipelineError, PipelineResult},
    models::{load_model, Classifier, Emotion, ModelOutput, Task},
    nlp::FeatureVector,
};

pub const MANIFEST_FILE: &str = "manifest.json";

/// Class order required of risk models: not at risk, then at risk.
pub const RISK_CLASSES: [usize; 2] = [0, 1];

/// Artifact listing found at the root of the models directory.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub risk: TaskManifest,
    pub emotion: TaskManifest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskManifest {
    /// Vectorizer artifact, relative to the models directory.
    pub vectorizer: PathBuf,
    pub models: Vec<MemberManifest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberManifest {
    pub name: String,
    pub path: PathBuf,
}

impl Manifest {
    pub fn load(models_dir: &Path) -> PipelineResult<Self> {
        let path = models_dir.join(MANIFEST_FILE);
        let raw = std::fs::read_to_string(&path).map_err(|e| PipelineError::init(&path, e))?;
        let manifest: Manifest =
            serde_json::from_str(&raw).map_err(|e| PipelineError::init(&path, e))?;
        for (task, section) in [(Task::Risk, &manifest.risk), (Task::Emotion, &manifest.emotion)] {
            if section.models.is_empty() {
                return Err(PipelineError::init(
                    &path,
                    format!("{task} ensemble lists no models"),
                ));
            }
        }
        Ok(manifest)
    }
}

/// A named ensemble member.
pub struct Member {
    pub name: String,
    pub model: Box<dyn Classifier>,
}

impl Member {
    pub fn new(name: impl Into<String>, model: Box<dyn Classifier>) -> Self {
        Self {
            name: name.into(),
            model,
        }
    }
}

impl std::fmt::Debug for Member {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("n_features", &self.model.n_features())
            .field("classes", &self.model.classes())
            .finish()
    }
}

/// Ordered members for both tasks; read-only once built.
#[derive(Debug)]
pub struct ModelEnsemble {
    risk: Vec<Member>,
    emotion: Vec<Member>,
}

impl ModelEnsemble {
    /// Assemble an ensemble, checking that every member fits its task.
    pub fn new(risk: Vec<Member>, emotion: Vec<Member>) -> PipelineResult<Self> {
        for (task, members) in [(Task::Risk, &risk), (Task::Emotion, &emotion)] {
            if members.is_empty() {
                return Err(PipelineError::init(
                    format!("{task} ensemble"),
                    "at least one model is required",
                ));
            }
        }
        // Column 1 of every risk distribution is read as the at-risk probability.
        for member in &risk {
            if member.model.classes() != RISK_CLASSES {
                return Err(PipelineError::init(
                    &member.name,
                    format!(
                        "risk models must use classes {RISK_CLASSES:?}, found {:?}",
                        member.model.classes()
                    ),
                ));
            }
        }
        for member in &emotion {
            if let Some(label) = member
                .model
                .classes()
                .iter()
                .find(|label| Emotion::from_index(**label).is_none())
            {
                return Err(PipelineError::init(
                    &member.name,
                    format!("class {label} is outside the emotion taxonomy"),
                ));
            }
        }
        Ok(Self { risk, emotion })
    }

    /// Load every member listed in the manifest.
    pub fn load(models_dir: &Path, manifest: &Manifest) -> PipelineResult<Self> {
        let load_task = |section: &TaskManifest| -> PipelineResult<Vec<Member>> {
            section
                .models
                .iter()
                .map(|entry| {
                    let model = load_model(&models_dir.join(&entry.path))?;
                    Ok(Member::new(entry.name.clone(), model))
                })
                .collect()
        };
        let ensemble = Self::new(load_task(&manifest.risk)?, load_task(&manifest.emotion)?)?;
        info!(
            risk = ensemble.len(Task::Risk),
            emotion = ensemble.len(Task::Emotion),
            "model ensemble ready"
        );
        Ok(ensemble)
    }

    pub fn members(&self, task: Task) -> &[Member] {
        match task {
            Task::Risk => &self.risk,
            Task::Emotion => &self.emotion,
        }
    }

    pub fn len(&self, task: Task) -> usize {
        self.members(task).len()
    }

    /// Fail unless every member of `task` expects `dimension` features.
    pub fn check_dimension(&self, task: Task, dimension: usize) -> PipelineResult<()> {
        match self
            .members(task)
            .iter()
            .find(|m| m.model.n_features() != dimension)
        {
            Some(member) => Err(PipelineError::init(
                &member.name,
                format!(
                    "expects {} features but the {task} vocabulary has {dimension}",
                    member.model.n_features()
                ),
            )),
            None => Ok(()),
        }
    }

    /// One two-way probability distribution per risk member.
    pub fn score_risk(&self, x: &FeatureVector) -> PipelineResult<Vec<ModelOutput>> {
        self.risk
            .iter()
            .map(|member| {
                check_width(Task::Risk, member, x)?;
                let proba = member.model.predict_proba(x);
                if proba.len() != 2 {
                    return Err(PipelineError::shape(
                        Task::Risk,
                        &member.name,
                        format!("expected 2 probabilities, got {}", proba.len()),
                    ));
                }
                debug!(model = %member.name, ?proba, "risk score");
                Ok(ModelOutput::Distribution(proba))
            })
            .collect()
    }

    /// One emotion label per emotion member.
    pub fn score_emotion(&self, x: &FeatureVector) -> PipelineResult<Vec<ModelOutput>> {
        self.emotion
            .iter()
            .map(|member| {
                check_width(Task::Emotion, member, x)?;
                let label = member.model.predict_label(x).ok_or_else(|| {
                    PipelineError::shape(
                        Task::Emotion,
                        &member.name,
                        format!(
                            "probabilities do not line up with its {} classes",
                            member.model.classes().len()
                        ),
                    )
                })?;
                if Emotion::from_index(label).is_none() {
                    return Err(PipelineError::shape(
                        Task::Emotion,
                        &member.name,
                        format!("label {label} is outside the emotion taxonomy"),
                    ));
                }
                debug!(model = %member.name, label, "emotion vote");
                Ok(ModelOutput::Label(label))
            })
            .collect()
    }
}

fn check_width(task: Task, member: &Member, x: &FeatureVector) -> PipelineResult<()> {
    if x.len() == member.model.n_features() {
        Ok(())
    } else {
        Err(PipelineError::shape(
            task,
            &member.name,
            format!(
                "received {} features, expects {}",
                x.len(),
                member.model.n_features()
            ),
        ))
    }
}
