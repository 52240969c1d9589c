//! Output label taxonomies for the risk and emotion tasks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Binary risk decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLabel {
    #[serde(rename = "suicidio")]
    AtRisk,
    #[serde(rename = "no suicidio")]
    NotAtRisk,
}

impl RiskLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AtRisk => "suicidio",
            Self::NotAtRisk => "no suicidio",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed six-way emotion taxonomy; discriminants are the model class indices.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Emotion {
    Sadness = 0,
    Joy = 1,
    Love = 2,
    Anger = 3,
    Fear = 4,
    Surprise = 5,
}

impl Emotion {
    pub const ALL: [Emotion; 6] = [
        Self::Sadness,
        Self::Joy,
        Self::Love,
        Self::Anger,
        Self::Fear,
        Self::Surprise,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sadness => "Sadness",
            Self::Joy => "Joy",
            Self::Love => "Love",
            Self::Anger => "Anger",
            Self::Fear => "Fear",
            Self::Surprise => "Surprise",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_taxonomy_order() {
        for (idx, emotion) in Emotion::ALL.iter().enumerate() {
            assert_eq!(emotion.index(), idx);
            assert_eq!(Emotion::from_index(idx), Some(*emotion));
        }
        assert_eq!(Emotion::from_index(6), None);
    }

    #[test]
    fn risk_label_serialises_to_wire_strings() {
        let json = serde_json::to_string(&RiskLabel::NotAtRisk).expect("serialises");
        assert_eq!(json, "\"no suicidio\"");
    }
}
