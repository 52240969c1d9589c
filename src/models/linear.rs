//! Linear backends: logistic regression and multinomial naive Bayes.

use ndarray::{Array1, Array2};
use serde::Deserialize;

use crate::{
    models::{check_classes, sigmoid, softmax, Classifier},
    nlp::FeatureVector,
};

fn matrix(rows: Vec<Vec<f64>>, what: &str) -> Result<Array2<f64>, String> {
    let height = rows.len();
    let width = rows.first().map(Vec::len).unwrap_or(0);
    if height == 0 || width == 0 {
        return Err(format!("{what} is empty"));
    }
    if rows.iter().any(|row| row.len() != width) {
        return Err(format!("{what} rows have differing lengths"));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    if flat.iter().any(|v| !v.is_finite()) {
        return Err(format!("{what} contains non-finite values"));
    }
    Array2::from_shape_vec((height, width), flat).map_err(|e| format!("{what}: {e}"))
}

#[derive(Debug, Deserialize)]
pub struct LogisticRegressionArtifact {
    classes: Vec<usize>,
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
}

impl LogisticRegressionArtifact {
    pub fn build(self) -> Result<LogisticRegression, String> {
        check_classes(&self.classes)?;
        let coef = matrix(self.coef, "coef")?;
        let rows = coef.nrows();
        let expected_rows = if self.classes.len() == 2 { 1 } else { self.classes.len() };
        if rows != expected_rows && rows != self.classes.len() {
            return Err(format!(
                "coef has {rows} rows for {} classes",
                self.classes.len()
            ));
        }
        if self.intercept.len() != rows {
            return Err(format!(
                "intercept has {} entries for {rows} coef rows",
                self.intercept.len()
            ));
        }
        Ok(LogisticRegression {
            classes: self.classes,
            coef,
            intercept: Array1::from(self.intercept),
        })
    }
}

/// Fitted logistic regression; a single coefficient row means the binary form.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    classes: Vec<usize>,
    coef: Array2<f64>,
    intercept: Array1<f64>,
}

impl Classifier for LogisticRegression {
    fn n_features(&self) -> usize {
        self.coef.ncols()
    }

    fn classes(&self) -> &[usize] {
        &self.classes
    }

    fn predict_proba(&self, x: &FeatureVector) -> Vec<f64> {
        let logits = self.coef.dot(x) + &self.intercept;
        if logits.len() == 1 {
            let positive = sigmoid(logits[0]);
            vec![1.0 - positive, positive]
        } else {
            softmax(&logits.to_vec())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MultinomialNbArtifact {
    classes: Vec<usize>,
    class_log_prior: Vec<f64>,
    feature_log_prob: Vec<Vec<f64>>,
}

impl MultinomialNbArtifact {
    pub fn build(self) -> Result<MultinomialNb, String> {
        check_classes(&self.classes)?;
        let feature_log_prob = matrix(self.feature_log_prob, "feature_log_prob")?;
        if feature_log_prob.nrows() != self.classes.len()
            || self.class_log_prior.len() != self.classes.len()
        {
            return Err(format!(
                "expected one prior and one feature row per class ({} classes)",
                self.classes.len()
            ));
        }
        if self.class_log_prior.iter().any(|v| !v.is_finite()) {
            return Err("class_log_prior contains non-finite values".into());
        }
        Ok(MultinomialNb {
            classes: self.classes,
            class_log_prior: Array1::from(self.class_log_prior),
            feature_log_prob,
        })
    }
}

/// Fitted multinomial naive Bayes over tf-idf weights.
#[derive(Debug, Clone)]
pub struct MultinomialNb {
    classes: Vec<usize>,
    class_log_prior: Array1<f64>,
    feature_log_prob: Array2<f64>,
}

impl Classifier for MultinomialNb {
    fn n_features(&self) -> usize {
        self.feature_log_prob.ncols()
    }

    fn classes(&self) -> &[usize] {
        &self.classes
    }

    fn predict_proba(&self, x: &FeatureVector) -> Vec<f64> {
        // softmax of the joint log likelihood is exp(jll - logsumexp(jll))
        let jll = self.feature_log_prob.dot(x) + &self.class_log_prior;
        softmax(&jll.to_vec())
    }
}
