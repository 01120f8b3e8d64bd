use std::{iter::zip, time::Instant};

use super::{
    data::{Attr, FeatureMatrix, Float, TrainingMatrix},
    dict::TagVocabulary,
    feature::FeatureVector,
    lbfgs::{self, TrainOptions},
    maxent::{log_softmax, state_score, MaxEntModel},
    model::ClassifierTrainer,
};
use crate::{
    errors::{Error, Result},
    quark::{Quark, StringTable},
};

/// Negative log-likelihood of a multinomial logistic regression with an
/// optional L2 term, over an encoded training set.
pub(crate) struct Objective<'a> {
    data: &'a TrainingMatrix,
    num_labels: usize,
    c2: Float,
}

impl<'a> Objective<'a> {
    pub(crate) fn new(data: &'a TrainingMatrix, num_labels: usize, c2: Float) -> Self {
        Self { data, num_labels, c2 }
    }

    fn num_attrs(&self) -> usize {
        self.data.features.num_columns()
    }

    /// Offset of the bias row in the weight vector.
    pub(crate) fn bias_offset(&self) -> usize {
        self.num_labels * self.num_attrs()
    }

    pub(crate) fn dimension(&self) -> usize {
        self.num_labels * (self.num_attrs() + 1)
    }

    /// Computes the objective value at `w` and writes its gradient into `g`.
    pub(crate) fn evaluate(&self, w: &[Float], g: &mut [Float]) -> Float {
        let L = self.num_labels;
        let A = self.num_attrs();
        let bias = self.bias_offset();
        g.fill(0.0);

        let mut loss = 0.0;
        for (item, &y) in zip(&self.data.features.rows, &self.data.labels) {
            let mut logp = state_score(w, A, L, item);
            log_softmax(&mut logp);
            loss -= logp[y];

            /* model expectation minus the observation */
            for (k, lp) in logp.iter().enumerate() {
                let d = lp.exp() - if k == y { 1.0 } else { 0.0 };
                for attr in item {
                    g[L * attr.aid + k] += d * attr.value;
                }
                g[bias + k] += d;
            }
        }

        if self.c2 > 0.0 {
            let c22 = self.c2 * 2.0;
            let mut norm = 0.0;
            for i in 0..bias {
                g[i] += c22 * w[i];
                norm += w[i] * w[i];
            }
            loss += self.c2 * norm;
        }
        loss
    }
}

/// Trains a [`MaxEntModel`] with L-BFGS.
#[derive(Debug, Default, Clone)]
pub struct MaxEntTrainer {
    pub options: TrainOptions,
}

impl MaxEntTrainer {
    pub fn new(options: TrainOptions) -> Self {
        Self { options }
    }
}

impl ClassifierTrainer for MaxEntTrainer {
    type Model = MaxEntModel;

    fn train(&self, rows: &[FeatureVector], labels: &[&str]) -> Result<MaxEntModel> {
        if rows.is_empty() {
            return Err(Error::EmptyTrainingSet);
        }
        if rows.len() != labels.len() {
            return Err(Error::MalformedExample {
                index: 0,
                tokens: rows.len(),
                tags: labels.len(),
            });
        }

        let attrs = Quark::sorted(rows.iter().flat_map(|fv| fv.iter().map(|(name, _)| name)));
        let vocab = TagVocabulary::new(labels.iter().copied());
        let mut data = TrainingMatrix {
            features: FeatureMatrix::new(attrs.len()),
            labels: Vec::with_capacity(labels.len()),
        };
        for (fv, &label) in zip(rows, labels) {
            let item = fv
                .iter()
                .filter_map(|(name, value)| attrs.to_id(name).map(|aid| Attr::new(aid, value)))
                .collect();
            data.features.push(item);
            data.labels.push(vocab.to_id(label).ok_or_else(|| Error::UnknownLabel(label.to_string()))?);
        }

        let L = vocab.len();
        let A = attrs.len();
        let N = data.len();
        log::info!("set data (L: {L}, A: {A}, N: {N})");
        log::info!(
            "lbfgs (c1: {}, c2: {}, max_iterations: {})",
            self.options.c1,
            self.options.c2,
            self.options.max_iterations
        );
        let begin = Instant::now();
        let objective = Objective::new(&data, L, self.options.c2);
        let weights = lbfgs::minimize(&objective, &self.options)?;
        let model = MaxEntModel::new(attrs, vocab, weights, self.options.clone())?;
        log::info!(
            "number of active features: {}, time cost: {:?}",
            model.num_active_features(),
            begin.elapsed()
        );
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memm::{feature::extract, model::Classifier};

    fn tiny() -> TrainingMatrix {
        let mut features = FeatureMatrix::new(3);
        features.push(vec![Attr::new(0, 1.0), Attr::new(2, 1.0)]);
        features.push(vec![Attr::new(1, 1.0), Attr::new(2, 1.0)]);
        features.push(vec![Attr::new(0, 1.0)]);
        TrainingMatrix {
            features,
            labels: vec![0, 1, 0],
        }
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let data = tiny();
        let objective = Objective::new(&data, 2, 0.3);
        let n = objective.dimension();
        assert_eq!(n, 8);
        let w: Vec<Float> = (0..n).map(|i| 0.1 * i as Float - 0.35).collect();
        let mut g = vec![0.0; n];
        objective.evaluate(&w, &mut g);

        let eps = 1e-6;
        let mut scratch = vec![0.0; n];
        for i in 0..n {
            let mut hi = w.clone();
            hi[i] += eps;
            let mut lo = w.clone();
            lo[i] -= eps;
            let numeric = (objective.evaluate(&hi, &mut scratch) - objective.evaluate(&lo, &mut scratch)) / (2.0 * eps);
            assert!((numeric - g[i]).abs() < 1e-5, "param {i}: {numeric} vs {}", g[i]);
        }
    }

    #[test]
    fn loss_at_origin_is_uniform() {
        let data = tiny();
        let objective = Objective::new(&data, 2, 0.0);
        let mut g = vec![0.0; objective.dimension()];
        let loss = objective.evaluate(&vec![0.0; objective.dimension()], &mut g);
        assert!((loss - 3.0 * (2.0 as Float).ln()).abs() < 1e-12);
    }

    #[test]
    fn empty_training_set() {
        let trainer = MaxEntTrainer::default();
        assert!(matches!(trainer.train(&[], &[]), Err(Error::EmptyTrainingSet)));
    }

    #[test]
    fn misaligned_labels() {
        let trainer = MaxEntTrainer::default();
        let rows = vec![extract("a", "<s>"), extract("b", "DT")];
        assert!(matches!(trainer.train(&rows, &["DT"]), Err(Error::MalformedExample { .. })));
    }

    #[test]
    fn rejected_optimizer_parameters_fail_training() {
        let mut options = TrainOptions::default();
        options.max_linesearch = 0;
        let trainer = MaxEntTrainer::new(options);
        let rows = vec![extract("the", "<s>"), extract("dog", "DT")];
        assert!(matches!(trainer.train(&rows, &["DT", "NN"]), Err(Error::Lbfgs(_))));
    }

    #[test]
    fn learns_token_identity() {
        let mut options = TrainOptions::default();
        options.c1 = 0.0;
        options.c2 = 0.01;
        let trainer = MaxEntTrainer::new(options);
        let rows = vec![extract("the", "<s>"), extract("dog", "DT"), extract("the", "<s>"), extract("cat", "DT")];
        let model = trainer.train(&rows, &["DT", "NN", "DT", "NN"]).unwrap();
        assert_eq!(model.num_features(), 5);
        assert_eq!(model.feature_index("pos-1=<s>"), Some(0));
        assert_eq!(model.feature_index("pos-1=DT"), Some(1));
        let dt = model.labels().to_id("DT").unwrap();
        let nn = model.labels().to_id("NN").unwrap();
        assert_eq!(model.argmax(&extract("the", "<s>")), dt);
        assert_eq!(model.argmax(&extract("dog", "DT")), nn);
        // unseen token, the previous tag alone decides
        assert_eq!(model.argmax(&extract("bird", "DT")), nn);
    }
}
