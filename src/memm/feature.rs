use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dataset::TaggedSentence;

/// Previous-tag value for the first token of a sentence.
pub const START_TAG: &str = "<s>";

pub const TOKEN_PREFIX: &str = "token=";
pub const PREV_TAG_PREFIX: &str = "pos-1=";

/// Named features of a single token with their counts.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(BTreeMap<String, f64>);

impl FeatureVector {
    pub fn add(&mut self, name: String, value: f64) {
        *self.0.entry(name).or_insert(0.0) += value;
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Features of `token` given the tag assigned to the token before it.
pub fn extract(token: &str, previous_tag: &str) -> FeatureVector {
    let mut fv = FeatureVector::default();
    fv.add(format!("{TOKEN_PREFIX}{token}"), 1.0);
    fv.add(format!("{PREV_TAG_PREFIX}{previous_tag}"), 1.0);
    fv
}

/// One feature vector per token, conditioned on the gold previous tag.
pub fn extract_gold(sentence: &TaggedSentence) -> Vec<FeatureVector> {
    let previous = std::iter::once(START_TAG).chain(sentence.tags.iter().map(String::as_str));
    sentence
        .tokens
        .iter()
        .zip(previous)
        .map(|(token, prev)| extract(token, prev))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_features() {
        let fv = extract("What", START_TAG);
        assert_eq!(fv.len(), 2);
        assert_eq!(fv.get("token=What"), Some(1.0));
        assert_eq!(fv.get("pos-1=<s>"), Some(1.0));
        assert_eq!(fv, extract("What", START_TAG));
    }

    #[test]
    fn gold_previous_tags() {
        let sentence = TaggedSentence::new(&["What", "'s", "next", "?"], &["WP", "VBZ", "JJ", "."]).unwrap();
        let rows = extract_gold(&sentence);
        assert_eq!(rows.len(), 4);
        assert!(rows[0].contains("token=What") && rows[0].contains("pos-1=<s>"));
        assert!(rows[1].contains("token='s") && rows[1].contains("pos-1=WP"));
        assert!(rows[3].contains("token=?") && rows[3].contains("pos-1=JJ"));
    }

    #[test]
    fn token_that_looks_like_a_feature() {
        let fv = extract("pos-1=NN", "NN");
        assert_eq!(fv.get("token=pos-1=NN"), Some(1.0));
        assert_eq!(fv.get("pos-1=NN"), Some(1.0));
    }
}
