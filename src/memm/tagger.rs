use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::{
    data::{FeatureMatrix, TrainingMatrix},
    feature::{extract_gold, FeatureVector},
    greedy::{GreedyDecoder, GreedyOutput},
    model::{Classifier, ClassifierTrainer},
    viterbi::{ViterbiDecoder, ViterbiOutput},
};
use crate::{
    dataset::TaggedSentence,
    errors::{Error, Result},
    quark::StringTable,
};

/// Maps a token sequence to one tag per token.
pub trait Decode {
    fn tag<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<String>>;
}

/// Fails unless a decoder produced exactly one tag per token.
pub(crate) fn ensure_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::LengthMismatch { expected, actual });
    }
    Ok(())
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum DecodeStrategy {
    /// left to right, one hard decision per token
    Greedy,
    /// best path over the full tag lattice
    #[default]
    Viterbi,
}

impl fmt::Display for DecodeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Greedy => write!(f, "greedy"),
            Self::Viterbi => write!(f, "viterbi"),
        }
    }
}

/// A part-of-speech tagger: a classifier trainer plus, once trained, the model.
#[derive(Debug)]
pub struct PosTagger<T: ClassifierTrainer> {
    trainer: T,
    model: Option<T::Model>,
    pub strategy: DecodeStrategy,
}

impl<T: ClassifierTrainer + Default> Default for PosTagger<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: ClassifierTrainer> PosTagger<T> {
    pub fn new(trainer: T) -> Self {
        Self {
            trainer,
            model: None,
            strategy: DecodeStrategy::default(),
        }
    }

    /// A tagger around an already trained model.
    pub fn with_model(trainer: T, model: T::Model) -> Self {
        Self {
            trainer,
            model: Some(model),
            strategy: DecodeStrategy::default(),
        }
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Result<&T::Model> {
        self.model.as_ref().ok_or(Error::Untrained)
    }

    pub fn into_model(self) -> Result<T::Model> {
        self.model.ok_or(Error::Untrained)
    }

    /// Trains on gold-tagged sentences and returns the encoded training data,
    /// one feature row and one label id per token.
    ///
    /// Every sentence is validated before training starts.
    pub fn train<'s, I>(&mut self, sentences: I) -> Result<TrainingMatrix>
    where
        I: IntoIterator<Item = &'s TaggedSentence>,
    {
        let mut rows: Vec<FeatureVector> = Vec::new();
        let mut labels: Vec<&str> = Vec::new();
        for (i, sentence) in sentences.into_iter().enumerate() {
            sentence.check(i)?;
            rows.extend(extract_gold(sentence));
            labels.extend(sentence.tags.iter().map(String::as_str));
        }
        if rows.is_empty() {
            return Err(Error::EmptyTrainingSet);
        }

        let model = self.trainer.train(&rows, &labels)?;
        let mut features = FeatureMatrix::new(model.num_features());
        for fv in &rows {
            features.push(model.encode(fv));
        }
        let labels = labels
            .iter()
            .map(|&tag| model.labels().to_id(tag).ok_or_else(|| Error::UnknownLabel(tag.to_string())))
            .collect::<Result<Vec<_>>>()?;
        self.model = Some(model);
        Ok(TrainingMatrix { features, labels })
    }

    /// Column of a named feature in the training matrix.
    pub fn feature_index(&self, feature: &str) -> Result<usize> {
        self.model()?
            .feature_index(feature)
            .ok_or_else(|| Error::UnknownFeature(feature.to_string()))
    }

    /// Label id of a tag in the training label vector.
    pub fn label_index(&self, label: &str) -> Result<usize> {
        self.model()?
            .labels()
            .to_id(label)
            .ok_or_else(|| Error::UnknownLabel(label.to_string()))
    }

    /// Tags with the configured [`DecodeStrategy`].
    pub fn predict<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<String>> {
        match self.strategy {
            DecodeStrategy::Greedy => Ok(self.predict_greedy(tokens)?.tags),
            DecodeStrategy::Viterbi => Ok(self.predict_viterbi(tokens)?.tags),
        }
    }

    pub fn predict_greedy<S: AsRef<str>>(&self, tokens: &[S]) -> Result<GreedyOutput> {
        GreedyDecoder::new(self.model()?).decode(tokens)
    }

    pub fn predict_viterbi<S: AsRef<str>>(&self, tokens: &[S]) -> Result<ViterbiOutput> {
        ViterbiDecoder::new(self.model()?).decode(tokens)
    }
}

impl<T: ClassifierTrainer> Decode for PosTagger<T> {
    fn tag<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<String>> {
        self.predict(tokens)
    }
}
