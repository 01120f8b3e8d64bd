//! Part-of-speech tagging with a maximum-entropy Markov model.
//!
//! Each token is tagged by a multinomial logistic regression whose features
//! are the token itself and the tag of the previous token. Tag sequences are
//! decoded either greedily, one hard decision per token, or with the Viterbi
//! algorithm over the full tag lattice.
//!
//! ```no_run
//! use memm_tagger::{Dataset, MaxEntTrainer, PosTagger};
//!
//! let ds = Dataset::from_path("train.tagged")?;
//! let mut tagger = PosTagger::new(MaxEntTrainer::default());
//! tagger.train(&ds.seqs)?;
//! let tags = tagger.predict(&["Slides", "to", "illustrate", "Shostakovich", "quartets", "?"])?;
//! # Ok::<(), memm_tagger::Error>(())
//! ```

pub mod dataset;
pub mod errors;
pub mod evaluation;
pub mod memm;
pub mod quark;

pub use dataset::{Dataset, TaggedSentence};
pub use errors::{Error, Result};
pub use evaluation::Evaluation;
pub use memm::{
    data::{FeatureMatrix, TrainingMatrix},
    dict::TagVocabulary,
    feature::{FeatureVector, START_TAG},
    greedy::{GreedyDecoder, GreedyOutput},
    lbfgs::TrainOptions,
    maxent::MaxEntModel,
    model::{Classifier, ClassifierTrainer},
    tagger::{Decode, DecodeStrategy, PosTagger},
    trainer::MaxEntTrainer,
    viterbi::{TransitionTensor, ViterbiDecoder, ViterbiLattice, ViterbiOutput},
};
