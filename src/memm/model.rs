use super::{
    data::{Attr, Float, Item},
    dict::TagVocabulary,
    feature::FeatureVector,
};
use crate::errors::Result;

/// A trained multi-class probabilistic classifier over tags.
///
/// Implementations are read-only after training, so one model can be shared
/// by any number of decoders.
pub trait Classifier {
    /// Tags this model can emit.
    fn labels(&self) -> &TagVocabulary;

    /// Column of a feature name, `None` for names unseen in training.
    fn feature_index(&self, name: &str) -> Option<usize>;

    fn num_features(&self) -> usize;

    /// Log-probability of every tag, indexed by tag id.
    ///
    /// Every entry is finite. Unknown feature names contribute nothing.
    fn distribution(&self, fv: &FeatureVector) -> Vec<Float>;

    /// Id of the most probable tag, the lowest id on ties.
    fn argmax(&self, fv: &FeatureVector) -> usize {
        argmax(&self.distribution(fv))
    }

    /// Sparse row of the known features of `fv`.
    fn encode(&self, fv: &FeatureVector) -> Item {
        fv.iter()
            .filter_map(|(name, value)| self.feature_index(name).map(|aid| Attr::new(aid, value)))
            .collect()
    }
}

/// Fits a [`Classifier`] to labelled feature vectors.
pub trait ClassifierTrainer {
    type Model: Classifier;

    fn train(&self, rows: &[FeatureVector], labels: &[&str]) -> Result<Self::Model>;
}

/// Index of the first maximum; `0` for an empty slice.
pub fn argmax(scores: &[Float]) -> usize {
    let mut best = 0;
    let mut max_score = Float::NEG_INFINITY;
    for (i, &score) in scores.iter().enumerate() {
        if max_score < score {
            max_score = score;
            best = i;
        }
    }
    best
}
