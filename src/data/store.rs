//! Append-only CSV persistence for scored submissions and dashboard rollups.

use std::{
    collections::BTreeMap,
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    config::Settings,
    inference::AggregatedResult,
    models::{Emotion, RiskLabel},
};

pub const PREDICTIONS_FILE: &str = "predictions.csv";

/// Caller-supplied submission; metadata is stored but never interpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub sector: String,
    pub text: String,
}

/// One persisted row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub sector: String,
    pub text: String,
    pub result: RiskLabel,
    pub emotion: Emotion,
    pub suicide_probability: f64,
}

/// CSV-backed store; appends are serialized through `last_id`.
#[derive(Debug)]
pub struct PredictionStore {
    path: PathBuf,
    last_id: Mutex<u64>,
}

impl PredictionStore {
    /// Open (or create) the store, resuming ids after the highest on disk.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let existing = read_records(&path)?;
        let last_id = existing.iter().map(|r| r.id).max().unwrap_or(0);
        info!(path = %path.display(), rows = existing.len(), "opened prediction store");
        Ok(Self {
            path,
            last_id: Mutex::new(last_id),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::open(settings.join_data(PREDICTIONS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist one scored submission and return the stored row.
    pub fn insert(
        &self,
        submission: &Submission,
        result: &AggregatedResult,
    ) -> Result<PredictionRecord> {
        let mut last_id = self.lock()?;
        let record = PredictionRecord {
            id: *last_id + 1,
            created_at: Utc::now(),
            name: submission.name.clone(),
            age: submission.age,
            gender: submission.gender.clone(),
            sector: submission.sector.clone(),
            text: submission.text.clone(),
            result: result.risk_label,
            emotion: result.emotion_label,
            suicide_probability: result.risk_probability,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;
        let len = file.metadata()?.len();

        // Each row goes out in a single write.
        let mut writer = WriterBuilder::new()
            .has_headers(len == 0)
            .from_writer(Vec::new());
        writer.serialize(&record)?;
        let mut row = writer
            .into_inner()
            .map_err(|e| anyhow!("buffering prediction row: {e}"))?;
        if len > 0 && !ends_with_newline(&mut file)? {
            row.insert(0, b'\n');
        }
        file.write_all(&row)
            .with_context(|| format!("appending to {}", self.path.display()))?;
        file.flush()?;

        *last_id = record.id;
        Ok(record)
    }

    /// Every stored row in insertion order.
    pub fn all(&self) -> Result<Vec<PredictionRecord>> {
        let _guard = self.lock()?;
        read_records(&self.path)
    }

    fn lock(&self) -> Result<MutexGuard<'_, u64>> {
        self.last_id
            .lock()
            .map_err(|_| anyhow!("prediction store lock poisoned"))
    }
}

fn ends_with_newline(file: &mut File) -> Result<bool> {
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Read every well-formed row; torn or corrupt rows are logged and skipped.
fn read_records(path: &Path) -> Result<Vec<PredictionRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let mut records = Vec::new();
    for (idx, row) in reader.deserialize::<PredictionRecord>().enumerate() {
        match row {
            Ok(record) => records.push(record),
            Err(err) if err.is_io_error() => {
                return Err(err).with_context(|| format!("reading {}", path.display()));
            }
            Err(err) => {
                warn!(path = %path.display(), row = idx + 1, %err, "skipping malformed prediction row");
            }
        }
    }
    Ok(records)
}

/// Number of submissions per emotion inside a time window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionCount {
    pub emotion: Emotion,
    pub count: usize,
    /// Latest submission carrying this emotion.
    pub time: DateTime<Utc>,
}

/// Mean risk probability per sector inside a time window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorRisk {
    pub sector: String,
    pub average_suicide_probability: f64,
    pub time: DateTime<Utc>,
}

/// Count records created at or after `since`, in taxonomy order.
pub fn emotion_counts(records: &[PredictionRecord], since: DateTime<Utc>) -> Vec<EmotionCount> {
    let mut groups: BTreeMap<Emotion, (usize, DateTime<Utc>)> = BTreeMap::new();
    for record in records.iter().filter(|r| r.created_at >= since) {
        let entry = groups
            .entry(record.emotion)
            .or_insert((0, record.created_at));
        entry.0 += 1;
        entry.1 = entry.1.max(record.created_at);
    }
    groups
        .into_iter()
        .map(|(emotion, (count, time))| EmotionCount {
            emotion,
            count,
            time,
        })
        .collect()
}

/// Average `suicide_probability` per sector for records at or after `since`.
pub fn sector_risk(records: &[PredictionRecord], since: DateTime<Utc>) -> Vec<SectorRisk> {
    let mut groups: BTreeMap<&str, (f64, usize, DateTime<Utc>)> = BTreeMap::new();
    for record in records.iter().filter(|r| r.created_at >= since) {
        let entry = groups
            .entry(record.sector.as_str())
            .or_insert((0.0, 0, record.created_at));
        entry.0 += record.suicide_probability;
        entry.1 += 1;
        entry.2 = entry.2.max(record.created_at);
    }
    groups
        .into_iter()
        .map(|(sector, (sum, n, time))| SectorRisk {
            sector: sector.to_string(),
            average_suicide_probability: sum / n as f64,
            time,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn submission(sector: &str, text: &str) -> Submission {
        Submission {
            name: "Ana".into(),
            age: 31,
            gender: "F".into(),
            sector: sector.into(),
            text: text.into(),
        }
    }

    fn result(probability: f64, emotion: Emotion) -> AggregatedResult {
        AggregatedResult {
            risk_label: if probability >= 0.5 {
                RiskLabel::AtRisk
            } else {
                RiskLabel::NotAtRisk
            },
            risk_probability: probability,
            emotion_label: emotion,
        }
    }

    #[test]
    fn ids_resume_after_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join(PREDICTIONS_FILE);
        let store = PredictionStore::open(&path).expect("open");
        let first = store
            .insert(&submission("health", "line one, with comma\nline two"), &result(0.7, Emotion::Fear))
            .expect("insert");
        assert_eq!(first.id, 1);
        drop(store);

        let store = PredictionStore::open(&path).expect("reopen");
        let second = store
            .insert(&submission("retail", "ok"), &result(0.2, Emotion::Joy))
            .expect("insert");
        assert_eq!(second.id, 2);

        let rows = store.all().expect("read back");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text, "line one, with comma\nline two");
        assert_eq!(rows[0].result, RiskLabel::AtRisk);
        assert_eq!(rows[1].emotion, Emotion::Joy);
    }

    #[test]
    fn torn_row_is_skipped_and_ids_resume() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(PREDICTIONS_FILE);
        let store = PredictionStore::open(&path).expect("open");
        store
            .insert(&submission("health", "first"), &result(0.6, Emotion::Fear))
            .expect("insert");
        drop(store);

        let mut file = OpenOptions::new().append(true).open(&path).expect("append");
        file.write_all(b"2,2026-10-19T00:00:00Z,b,3").expect("write torn row");
        drop(file);

        let store = PredictionStore::open(&path).expect("reopen despite torn row");
        assert_eq!(store.all().expect("read").len(), 1);
        let next = store
            .insert(&submission("retail", "second"), &result(0.1, Emotion::Joy))
            .expect("insert after torn row");
        assert_eq!(next.id, 2);

        let rows = store.all().expect("read");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].text, "second");
        assert_eq!(rows[1].sector, "retail");
    }

    #[test]
    fn rollups_respect_the_window() {
        let now = Utc::now();
        let make = |id, minutes_ago: i64, sector: &str, p: f64, emotion| PredictionRecord {
            id,
            created_at: now - Duration::minutes(minutes_ago),
            name: "x".into(),
            age: 20,
            gender: "M".into(),
            sector: sector.into(),
            text: String::new(),
            result: RiskLabel::NotAtRisk,
            emotion,
            suicide_probability: p,
        };
        let records = vec![
            make(1, 5, "health", 0.2, Emotion::Anger),
            make(2, 10, "health", 0.6, Emotion::Sadness),
            make(3, 1, "retail", 0.9, Emotion::Anger),
            make(4, 120, "retail", 0.1, Emotion::Joy),
        ];
        let since = now - Duration::minutes(60);

        let emotions = emotion_counts(&records, since);
        assert_eq!(emotions.len(), 2);
        assert_eq!(emotions[0].emotion, Emotion::Sadness);
        assert_eq!(emotions[1].emotion, Emotion::Anger);
        assert_eq!(emotions[1].count, 2);
        assert_eq!(emotions[1].time, now - Duration::minutes(1));

        let sectors = sector_risk(&records, since);
        assert_eq!(sectors.len(), 2);
        assert_eq!(sectors[0].sector, "health");
        assert!((sectors[0].average_suicide_probability - 0.4).abs() < 1e-12);
        assert!((sectors[1].average_suicide_probability - 0.9).abs() < 1e-12);
    }
}
