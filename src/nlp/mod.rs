//! Text preprocessing: normalization resources and feature encoding.

pub mod features;
pub mod lexicon;
pub mod normalize;

pub use features::{FeatureVector, TfidfVectorizer};
pub use lexicon::{Lemmatizer, StopWords};
pub use normalize::TextNormalizer;
