//! Tree ensembles: random forests and gradient boosted trees.
//!
//! Trees are stored as flat node lists rooted at index 0. Every split points
//! to children with larger indices, so traversal always terminates.

use serde::Deserialize;

use crate::{
    models::{check_classes, sigmoid, softmax, Classifier},
    nlp::FeatureVector,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node<L> {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        #[serde(default)]
        default_left: bool,
    },
    Leaf {
        value: L,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tree<L> {
    nodes: Vec<Node<L>>,
}

impl<L> Tree<L> {
    fn validate(
        &self,
        n_features: usize,
        check_leaf: impl Fn(&L) -> Result<(), String>,
    ) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        let len = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= n_features {
                        return Err(format!("node {idx} splits on feature {feature} of {n_features}"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {idx} has a non-finite threshold"));
                    }
                    for child in [left, right] {
                        if *child <= idx || *child >= len {
                            return Err(format!("node {idx} points to invalid child {child}"));
                        }
                    }
                }
                Node::Leaf { value } => {
                    check_leaf(value).map_err(|e| format!("leaf {idx}: {e}"))?;
                }
            }
        }
        Ok(())
    }

    /// Walk from the root; `goes_left(value, threshold, default_left)` picks the branch.
    fn leaf(&self, x: &FeatureVector, goes_left: impl Fn(f64, f64, bool) -> bool) -> &L {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                } => {
                    idx = if goes_left(x[*feature], *threshold, *default_left) {
                        *left
                    } else {
                        *right
                    };
                }
                Node::Leaf { value } => return value,
            }
        }
    }
}

/// Bagged decision trees whose leaves hold per-class weights.
#[derive(Debug, Clone, Deserialize)]
pub struct RandomForest {
    classes: Vec<usize>,
    n_features: usize,
    trees: Vec<Tree<Vec<f64>>>,
}

impl RandomForest {
    pub fn validated(self) -> Result<Self, String> {
        check_classes(&self.classes)?;
        if self.trees.is_empty() {
            return Err("forest has no trees".into());
        }
        let n_classes = self.classes.len();
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, |value: &Vec<f64>| {
                if value.len() != n_classes {
                    return Err(format!("{} weights for {n_classes} classes", value.len()));
                }
                if value.iter().any(|w| !w.is_finite() || *w < 0.0) {
                    return Err("weights must be finite and non-negative".into());
                }
                if value.iter().sum::<f64>() <= 0.0 {
                    return Err("weights sum to zero".into());
                }
                Ok(())
            })
            .map_err(|e| format!("tree {idx}: {e}"))?;
        }
        Ok(self)
    }
}

impl Classifier for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn classes(&self) -> &[usize] {
        &self.classes
    }

    fn predict_proba(&self, x: &FeatureVector) -> Vec<f64> {
        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let weights = tree.leaf(x, |value, threshold, _| value <= threshold);
            let total: f64 = weights.iter().sum();
            for (acc, w) in proba.iter_mut().zip(weights) {
                *acc += w / total;
            }
        }
        let n_trees = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);
        proba
    }
}

fn default_zero_as_missing() -> bool {
    true
}

/// Additive regression trees over margins, one group of trees per class.
#[derive(Debug, Clone, Deserialize)]
pub struct GradientBoosting {
    classes: Vec<usize>,
    n_features: usize,
    #[serde(default)]
    base_margin: f64,
    trees: Vec<Tree<f64>>,
    /// Sparse inputs leave zero entries out, so they follow the default branch.
    #[serde(default = "default_zero_as_missing")]
    zero_as_missing: bool,
}

impl GradientBoosting {
    pub fn validated(self) -> Result<Self, String> {
        check_classes(&self.classes)?;
        if self.trees.is_empty() {
            return Err("booster has no trees".into());
        }
        let groups = self.groups();
        if self.trees.len() % groups != 0 {
            return Err(format!(
                "{} trees cannot be split evenly over {groups} class groups",
                self.trees.len()
            ));
        }
        if !self.base_margin.is_finite() {
            return Err("base_margin must be finite".into());
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, |value: &f64| {
                if value.is_finite() {
                    Ok(())
                } else {
                    Err("leaf value must be finite".into())
                }
            })
            .map_err(|e| format!("tree {idx}: {e}"))?;
        }
        Ok(self)
    }

    fn groups(&self) -> usize {
        if self.classes.len() == 2 {
            1
        } else {
            self.classes.len()
        }
    }
}

impl Classifier for GradientBoosting {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn classes(&self) -> &[usize] {
        &self.classes
    }

    fn predict_proba(&self, x: &FeatureVector) -> Vec<f64> {
        let groups = self.groups();
        let mut margins = vec![self.base_margin; groups];
        for (idx, tree) in self.trees.iter().enumerate() {
            let value = tree.leaf(x, |value, threshold, default_left| {
                if value.is_nan() || (self.zero_as_missing && value == 0.0) {
                    default_left
                } else {
                    value < threshold
                }
            });
            margins[idx % groups] += value;
        }
        if groups == 1 {
            let positive = sigmoid(margins[0]);
            vec![1.0 - positive, positive]
        } else {
            softmax(&margins)
        }
    }
}
