use super::{
    data::FeatureMatrix,
    feature::{extract, START_TAG},
    model::Classifier,
    tagger::{ensure_len, Decode},
};
use crate::{errors::Result, quark::StringTable};

/// Result of a greedy pass.
#[derive(Debug, Clone, PartialEq)]
pub struct GreedyOutput {
    /// The features used for each token, one row per token.
    pub features: FeatureMatrix,
    /// Tag ids, one per token.
    pub path: Vec<usize>,
    pub tags: Vec<String>,
}

/// Tags left to right, committing to the classifier's best tag at each token.
#[derive(Debug)]
pub struct GreedyDecoder<'a, C: ?Sized> {
    model: &'a C,
}

impl<'a, C: Classifier + ?Sized> GreedyDecoder<'a, C> {
    pub fn new(model: &'a C) -> Self {
        Self { model }
    }

    pub fn decode<S: AsRef<str>>(&self, tokens: &[S]) -> Result<GreedyOutput> {
        let labels = self.model.labels();
        let mut features = FeatureMatrix::new(self.model.num_features());
        let mut path = Vec::with_capacity(tokens.len());
        let mut tags = Vec::with_capacity(tokens.len());

        let mut previous = START_TAG;
        for token in tokens {
            let fv = extract(token.as_ref(), previous);
            let k = self.model.argmax(&fv);
            features.push(self.model.encode(&fv));
            previous = match labels.to_str(k) {
                Some(tag) => tag,
                None => break,
            };
            path.push(k);
            tags.push(previous.to_string());
        }
        ensure_len(tokens.len(), tags.len())?;
        Ok(GreedyOutput { features, path, tags })
    }
}

impl<'a, C: Classifier + ?Sized> Decode for GreedyDecoder<'a, C> {
    fn tag<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<String>> {
        Ok(self.decode(tokens)?.tags)
    }
}
