//! Ensemble inference: aggregation strategies and the scoring pipeline.

pub mod aggregate;
pub mod pipeline;

pub use aggregate::{AggregationPolicy, TieBreak, Verdict, DEFAULT_RISK_THRESHOLD};
pub use pipeline::{AggregatedResult, InferenceContext, InferencePipeline};
