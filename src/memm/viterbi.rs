use super::{
    data::Float,
    feature::extract,
    model::Classifier,
    tagger::{ensure_len, Decode},
};
use crate::{errors::Result, quark::StringTable};

/// Log-probabilities of every (previous tag, current tag) pair at every token.
///
/// This is a `[T][L + 1][L]` array whose element `[t][j][k]` holds
/// `log p(tag_t = k | token_t, tag_{t-1} = j)`. The previous-tag id `L` is the
/// start sentinel and is defined only at `t = 0`; at `t = 0` it is the only
/// defined previous tag. Undefined cells hold negative infinity.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionTensor {
    num_items: usize,
    num_labels: usize,
    scores: Vec<Float>,
}

impl TransitionTensor {
    pub fn new(num_items: usize, num_labels: usize) -> Self {
        Self {
            num_items,
            num_labels,
            scores: vec![Float::NEG_INFINITY; num_items * (num_labels + 1) * num_labels],
        }
    }

    /// `(T, L + 1, L)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.num_items, self.num_labels + 1, self.num_labels)
    }

    /// Previous-tag id of the start sentinel.
    pub fn start(&self) -> usize {
        self.num_labels
    }

    fn offset(&self, t: usize, j: usize) -> usize {
        self.num_labels * ((self.num_labels + 1) * t + j)
    }

    pub fn get(&self, t: usize, j: usize, k: usize) -> Float {
        self.scores[self.offset(t, j) + k]
    }

    /// Distribution over current tags at `t` given previous tag `j`.
    pub fn row(&self, t: usize, j: usize) -> &[Float] {
        let o = self.offset(t, j);
        &self.scores[o..o + self.num_labels]
    }

    pub fn row_mut(&mut self, t: usize, j: usize) -> &mut [Float] {
        let o = self.offset(t, j);
        &mut self.scores[o..o + self.num_labels]
    }

    /// Total log-probability of a tag-id path, starting from the sentinel.
    pub fn path_score(&self, path: &[usize]) -> Float {
        let mut prev = self.start();
        let mut r = 0.0;
        for (t, &k) in path.iter().enumerate() {
            r += self.get(t, prev, k);
            prev = k;
        }
        r
    }
}

/// Best cumulative scores of the tag lattice, with backward links.
#[derive(Debug, Clone, PartialEq)]
pub struct ViterbiLattice {
    num_items: usize,
    num_labels: usize,
    /// `[T][L]`: best score of any path arriving at `(t, k)`.
    scores: Vec<Float>,
    /// `[T][L]`: the previous tag on that best path; row 0 is unused.
    backward_edge: Vec<usize>,
}

impl ViterbiLattice {
    /// Fills the lattice from a transition tensor.
    pub fn forward(tensor: &TransitionTensor) -> Self {
        let (T, _, L) = tensor.shape();
        let mut this = Self {
            num_items: T,
            num_labels: L,
            scores: vec![Float::NEG_INFINITY; T * L],
            backward_edge: vec![0; T * L],
        };
        if T == 0 {
            return this;
        }

        /* Compute the scores at (0, *). */
        this.scores[..L].copy_from_slice(tensor.row(0, tensor.start()));

        /* Compute the scores at (t, *). */
        for t in 1..T {
            for k in 0..L {
                let mut max_score = Float::NEG_INFINITY;
                let mut argmax_score = 0;
                for j in 0..L {
                    /* Transit from (t-1, j) to (t, k). */
                    let score = this.scores[L * (t - 1) + j] + tensor.get(t, j, k);
                    /* Strict comparison keeps the lowest j on ties. */
                    if max_score < score {
                        max_score = score;
                        argmax_score = j;
                    }
                }
                this.scores[L * t + k] = max_score;
                this.backward_edge[L * t + k] = argmax_score;
            }
        }
        this
    }

    /// `(T, L)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.num_items, self.num_labels)
    }

    pub fn get(&self, t: usize, k: usize) -> Float {
        self.scores[self.num_labels * t + k]
    }

    pub fn row(&self, t: usize) -> &[Float] {
        &self.scores[self.num_labels * t..self.num_labels * (t + 1)]
    }

    /// Previous tag on the best path into `(t, k)`; `None` at `t = 0`.
    pub fn backpointer(&self, t: usize, k: usize) -> Option<usize> {
        if t == 0 || t >= self.num_items || k >= self.num_labels {
            return None;
        }
        Some(self.backward_edge[self.num_labels * t + k])
    }

    /// Tag ids of the best path and its score.
    pub fn backtrack(&self) -> (Vec<usize>, Float) {
        let T = self.num_items;
        if T == 0 {
            return (Vec::new(), 0.0);
        }
        let mut labels = vec![0; T];

        /* Find the node (#T-1, #k) with the maximum score. */
        let mut max_score = Float::NEG_INFINITY;
        for (k, &score) in self.row(T - 1).iter().enumerate() {
            if max_score < score {
                max_score = score;
                labels[T - 1] = k;
            }
        }
        /* Tag labels by tracing the backward links. */
        for t in (0..T - 1).rev() {
            let k = labels[t + 1];
            labels[t] = self.backward_edge[self.num_labels * (t + 1) + k];
        }
        (labels, max_score)
    }
}

/// Result of a Viterbi pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ViterbiOutput {
    pub tensor: TransitionTensor,
    pub lattice: ViterbiLattice,
    /// Tag ids of the best path.
    pub path: Vec<usize>,
    /// Score of the best path.
    pub score: Float,
    pub tags: Vec<String>,
}

impl ViterbiOutput {
    /// Scores any tag-id path under this output's transition tensor.
    pub fn path_score(&self, path: &[usize]) -> Float {
        self.tensor.path_score(path)
    }
}

/// Finds the globally best tag sequence over the full tag lattice.
#[derive(Debug)]
pub struct ViterbiDecoder<'a, C: ?Sized> {
    model: &'a C,
}

impl<'a, C: Classifier + ?Sized> ViterbiDecoder<'a, C> {
    pub fn new(model: &'a C) -> Self {
        Self { model }
    }

    /// Queries the classifier once per (token, previous tag) pair.
    pub fn transitions<S: AsRef<str>>(&self, tokens: &[S]) -> TransitionTensor {
        let labels = self.model.labels();
        let L = labels.len();
        let mut tensor = TransitionTensor::new(tokens.len(), L);
        for (t, token) in tokens.iter().enumerate() {
            let token = token.as_ref();
            let previous = if t == 0 { labels.start()..labels.start() + 1 } else { 0..L };
            for j in previous {
                let Some(prev) = labels.previous_str(j) else {
                    continue;
                };
                let dist = self.model.distribution(&extract(token, prev));
                for (dst, src) in tensor.row_mut(t, j).iter_mut().zip(dist) {
                    *dst = src;
                }
            }
        }
        tensor
    }

    pub fn decode<S: AsRef<str>>(&self, tokens: &[S]) -> Result<ViterbiOutput> {
        let tensor = self.transitions(tokens);
        let lattice = ViterbiLattice::forward(&tensor);
        let (path, score) = lattice.backtrack();
        let tags = self.model.labels().decode(&path);
        ensure_len(tokens.len(), tags.len())?;
        Ok(ViterbiOutput {
            tensor,
            lattice,
            path,
            score,
            tags,
        })
    }
}

impl<'a, C: Classifier + ?Sized> Decode for ViterbiDecoder<'a, C> {
    fn tag<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<String>> {
        Ok(self.decode(tokens)?.tags)
    }
}
