//! A classifier with hand-set distributions for decoder tests.

use std::collections::HashMap;

use super::{
    data::Float,
    dict::TagVocabulary,
    feature::{FeatureVector, PREV_TAG_PREFIX, TOKEN_PREFIX},
    model::Classifier,
};
use crate::quark::StringTable;

/// Log-probability used for a zero probability.
pub(crate) const LOG_ZERO: Float = -1e10;

#[derive(Debug)]
pub(crate) struct FixedClassifier {
    labels: TagVocabulary,
    /// (token, previous tag) -> probabilities by tag id
    table: HashMap<(String, String), Vec<Float>>,
}

impl FixedClassifier {
    pub(crate) fn new(tags: &[&str]) -> Self {
        Self {
            labels: TagVocabulary::new(tags.iter().copied()),
            table: HashMap::new(),
        }
    }

    pub(crate) fn set(&mut self, token: &str, previous: &str, probs: &[Float]) {
        assert_eq!(probs.len(), self.labels.len());
        self.table.insert((token.to_string(), previous.to_string()), probs.to_vec());
    }

    fn lookup(&self, fv: &FeatureVector) -> Option<&Vec<Float>> {
        let mut token = None;
        let mut previous = None;
        for (name, _) in fv.iter() {
            if let Some(t) = name.strip_prefix(TOKEN_PREFIX) {
                token = Some(t);
            } else if let Some(p) = name.strip_prefix(PREV_TAG_PREFIX) {
                previous = Some(p);
            }
        }
        self.table.get(&(token?.to_string(), previous?.to_string()))
    }
}

impl Classifier for FixedClassifier {
    fn labels(&self) -> &TagVocabulary {
        &self.labels
    }

    fn feature_index(&self, _name: &str) -> Option<usize> {
        None
    }

    fn num_features(&self) -> usize {
        0
    }

    fn distribution(&self, fv: &FeatureVector) -> Vec<Float> {
        let L = self.labels.len();
        match self.lookup(fv) {
            Some(probs) => probs.iter().map(|p| p.ln().max(LOG_ZERO)).collect(),
            None => vec![-(L as Float).ln(); L],
        }
    }
}
