//! Strategies that fold per-model outputs into one decision per task.

use indexmap::IndexMap;

use crate::{
    error::{PipelineError, PipelineResult},
    models::{ModelOutput, Task},
};

/// Risk decision threshold applied to the averaged at-risk probability.
pub const DEFAULT_RISK_THRESHOLD: f64 = 0.5;

/// How ties between equally voted labels are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// The tied label that appears earliest in ensemble order wins.
    #[default]
    FirstEncountered,
}

/// Aggregation strategy, chosen per task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggregationPolicy {
    /// Elementwise mean of distributions; positive iff mean[1] >= threshold.
    MeanThreshold { threshold: f64 },
    /// Most frequent label, ties resolved by `tie_break`.
    PluralityVote { tie_break: TieBreak },
}

/// Outcome of applying a policy.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Threshold {
        mean: Vec<f64>,
        positive: f64,
        accepted: bool,
    },
    Vote {
        label: usize,
        votes: usize,
    },
}

impl AggregationPolicy {
    pub fn mean_threshold(threshold: f64) -> Self {
        Self::MeanThreshold { threshold }
    }

    pub fn plurality() -> Self {
        Self::PluralityVote {
            tie_break: TieBreak::FirstEncountered,
        }
    }

    /// Fold `outputs` for `task`; fails on an empty or wrongly shaped list.
    pub fn aggregate(&self, task: Task, outputs: &[ModelOutput]) -> PipelineResult<Verdict> {
        if outputs.is_empty() {
            return Err(PipelineError::shape(task, "<ensemble>", "no model outputs"));
        }
        match *self {
            Self::MeanThreshold { threshold } => {
                let distributions = outputs
                    .iter()
                    .enumerate()
                    .map(|(idx, output)| match output {
                        ModelOutput::Distribution(p) if p.len() == 2 => Ok(p.as_slice()),
                        other => Err(PipelineError::shape(
                            task,
                            format!("member {idx}"),
                            format!("expected a two-way distribution, got {other:?}"),
                        )),
                    })
                    .collect::<PipelineResult<Vec<_>>>()?;
                let mean = mean_distribution(&distributions);
                let positive = mean[1];
                Ok(Verdict::Threshold {
                    accepted: positive >= threshold,
                    positive,
                    mean,
                })
            }
            Self::PluralityVote { tie_break } => {
                let labels = outputs
                    .iter()
                    .enumerate()
                    .map(|(idx, output)| match output {
                        ModelOutput::Label(label) => Ok(*label),
                        other => Err(PipelineError::shape(
                            task,
                            format!("member {idx}"),
                            format!("expected a discrete label, got {other:?}"),
                        )),
                    })
                    .collect::<PipelineResult<Vec<_>>>()?;
                let (label, votes) = plurality(&labels, tie_break)
                    .ok_or_else(|| PipelineError::shape(task, "<ensemble>", "no votes cast"))?;
                Ok(Verdict::Vote { label, votes })
            }
        }
    }
}

/// Elementwise arithmetic mean of equally sized distributions.
pub fn mean_distribution(distributions: &[&[f64]]) -> Vec<f64> {
    let width = distributions.first().map(|d| d.len()).unwrap_or(0);
    let mut sums = vec![0.0; width];
    for distribution in distributions {
        for (acc, p) in sums.iter_mut().zip(distribution.iter()) {
            *acc += p;
        }
    }
    let n = distributions.len() as f64;
    sums.into_iter().map(|s| s / n).collect()
}

/// Winning label and its vote count, or `None` when nobody voted.
pub fn plurality<T>(labels: &[T], tie_break: TieBreak) -> Option<(T, usize)>
where
    T: Copy + Eq + std::hash::Hash,
{
    // IndexMap keeps first-appearance order for the tie scan below.
    let mut counts: IndexMap<T, usize> = IndexMap::new();
    for label in labels {
        *counts.entry(*label).or_insert(0) += 1;
    }
    match tie_break {
        TieBreak::FirstEncountered => {
            let mut best: Option<(T, usize)> = None;
            for (label, count) in counts {
                if best.map_or(true, |(_, top)| count > top) {
                    best = Some((label, count));
                }
            }
            best
        }
    }
}
