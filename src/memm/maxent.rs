use std::{
    fmt::Write as _,
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use serde::{Deserialize, Serialize};

use super::{
    data::{Attr, Float},
    dict::TagVocabulary,
    feature::FeatureVector,
    lbfgs::TrainOptions,
    model::Classifier,
};
use crate::{
    errors::{Error, Result},
    quark::{Quark, StringTable},
};

/// Multinomial logistic regression over sparse features.
///
/// `weights` is a `[A + 1][L]` matrix: row `a` holds the weights of attribute
/// `a` for every label, and the final row holds the per-label bias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ModelData")]
pub struct MaxEntModel {
    attrs: Quark,
    labels: TagVocabulary,
    weights: Vec<Float>,
    options: TrainOptions,
}

/// Stored form of a model before its shape is checked.
#[derive(Deserialize)]
struct ModelData {
    attrs: Quark,
    labels: TagVocabulary,
    weights: Vec<Float>,
    options: TrainOptions,
}

impl TryFrom<ModelData> for MaxEntModel {
    type Error = Error;

    fn try_from(data: ModelData) -> Result<Self> {
        Self::new(data.attrs, data.labels, data.weights, data.options)
    }
}

impl MaxEntModel {
    pub(crate) fn new(attrs: Quark, labels: TagVocabulary, weights: Vec<Float>, options: TrainOptions) -> Result<Self> {
        if labels.is_empty() {
            return Err(Error::InvalidModel("no labels".to_string()));
        }
        let expected = (attrs.len() + 1) * labels.len();
        if weights.len() != expected {
            return Err(Error::InvalidModel(format!(
                "{} weights for {} attributes and {} labels, expected {expected}",
                weights.len(),
                attrs.len(),
                labels.len()
            )));
        }
        if let Some(i) = weights.iter().position(|w| !w.is_finite()) {
            return Err(Error::InvalidModel(format!("weight #{i} is not finite")));
        }
        Ok(Self {
            attrs,
            labels,
            weights,
            options,
        })
    }

    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }

    pub fn options(&self) -> &TrainOptions {
        &self.options
    }

    /// Weight of attribute `aid` for label `lid`.
    pub fn weight(&self, aid: usize, lid: usize) -> Float {
        self.weights[self.num_labels() * aid + lid]
    }

    pub fn bias(&self, lid: usize) -> Float {
        self.weight(self.attrs.len(), lid)
    }

    /// Number of non-zero attribute weights, bias excluded.
    pub fn num_active_features(&self) -> usize {
        let end = self.attrs.len() * self.num_labels();
        self.weights[..end].iter().filter(|w| **w != 0.0).count()
    }

    /// Unnormalised label scores of a sparse row.
    pub fn state_score(&self, item: &[Attr]) -> Vec<Float> {
        state_score(&self.weights, self.attrs.len(), self.num_labels(), item)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data: ModelData = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        Self::try_from(data)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        serde_json::to_writer(BufWriter::new(File::create(path)?), self)?;
        Ok(())
    }

    /// Plain-text listing of labels, attributes and non-zero weights.
    pub fn dump(&self) -> String {
        let mut s = String::new();
        let _ = writeln!(s, "LABELS = {{");
        for (i, label) in self.labels.iter().enumerate() {
            let _ = writeln!(s, "    {i:5}: {label}");
        }
        let _ = writeln!(s, "}}\n");
        let _ = writeln!(s, "ATTRIBUTES = {{");
        for (i, attr) in self.attrs.iter().enumerate() {
            let _ = writeln!(s, "    {i:5}: {attr}");
        }
        let _ = writeln!(s, "}}\n");
        let _ = writeln!(s, "STATE_FEATURES = {{");
        for (aid, attr) in self.attrs.iter().enumerate() {
            for (lid, label) in self.labels.iter().enumerate() {
                let w = self.weight(aid, lid);
                if w != 0.0 {
                    let _ = writeln!(s, "    ({attr}) --> {label}: {w:.6}");
                }
            }
        }
        let _ = writeln!(s, "}}\n");
        let _ = writeln!(s, "BIAS = {{");
        for (lid, label) in self.labels.iter().enumerate() {
            let _ = writeln!(s, "    {label}: {:.6}", self.bias(lid));
        }
        let _ = writeln!(s, "}}");
        s
    }
}

impl Classifier for MaxEntModel {
    fn labels(&self) -> &TagVocabulary {
        &self.labels
    }

    fn feature_index(&self, name: &str) -> Option<usize> {
        self.attrs.to_id(name)
    }

    fn num_features(&self) -> usize {
        self.attrs.len()
    }

    fn distribution(&self, fv: &FeatureVector) -> Vec<Float> {
        let mut scores = self.state_score(&self.encode(fv));
        log_softmax(&mut scores);
        scores
    }
}

pub(crate) fn state_score(w: &[Float], num_attrs: usize, num_labels: usize, item: &[Attr]) -> Vec<Float> {
    let bias = num_labels * num_attrs;
    let mut scores = w[bias..bias + num_labels].to_vec();
    for attr in item {
        let row = &w[num_labels * attr.aid..num_labels * (attr.aid + 1)];
        for (s, wk) in scores.iter_mut().zip(row) {
            *s += wk * attr.value;
        }
    }
    scores
}

/// Normalises scores into log-probabilities in place.
pub(crate) fn log_softmax(scores: &mut [Float]) {
    let max = scores.iter().copied().fold(Float::NEG_INFINITY, Float::max);
    if !max.is_finite() {
        return;
    }
    let norm = max + scores.iter().map(|s| (s - max).exp()).sum::<Float>().ln();
    for s in scores.iter_mut() {
        *s -= norm;
    }
}
