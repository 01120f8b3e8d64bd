use memm_tagger::{
    Classifier, Dataset, Error, MaxEntModel, MaxEntTrainer, PosTagger, TaggedSentence, TrainOptions,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn what() -> Dataset {
    Dataset::from_path("tests/data/what.tagged").expect("failed to read file")
}

#[test]
fn training_matrix_rows() {
    init();
    let ds = what();
    assert_eq!(ds.len(), 2, "read count mismatch");
    let mut tagger = PosTagger::new(MaxEntTrainer::default());
    let matrix = tagger.train(&ds.seqs).expect("failed to train");
    assert_eq!(matrix.features.num_rows(), 10);
    assert_eq!(matrix.labels.len(), 10);

    let column = |name: &str| tagger.feature_index(name).expect("unknown feature");
    assert_eq!(matrix.features.get(0, column("token=What")), 1.0);
    assert_eq!(matrix.features.get(0, column("pos-1=<s>")), 1.0);
    assert_eq!(matrix.features.get(1, column("token='s")), 1.0);
    assert_eq!(matrix.features.get(1, column("pos-1=WP")), 1.0);
    assert_eq!(matrix.features.get(1, column("pos-1=<s>")), 0.0);
    for row in matrix.features.to_dense() {
        assert_eq!(row.iter().filter(|v| **v != 0.0).count(), 2);
        assert_eq!(row.iter().sum::<f64>(), 2.0);
    }

    assert_eq!(matrix.labels[0], tagger.label_index("WP").unwrap());
    assert_eq!(matrix.labels[1], tagger.label_index("VBZ").unwrap());
    assert_eq!(matrix.labels[3], matrix.labels[9]);
}

#[test]
fn lookups_follow_sorted_names() {
    init();
    let mut tagger = PosTagger::new(MaxEntTrainer::default());
    tagger.train(&what().seqs).unwrap();
    // ".", JJ, NNP, NNS, TO, VB, VBZ, WP
    assert_eq!(tagger.label_index(".").unwrap(), 0);
    assert_eq!(tagger.label_index("WP").unwrap(), 7);
    // "." never precedes another token, so the sentinel sorts first
    assert_eq!(tagger.feature_index("pos-1=<s>").unwrap(), 0);
    assert!(matches!(tagger.feature_index("pos-1=."), Err(Error::UnknownFeature(_))));
    assert!(matches!(tagger.label_index("<s>"), Err(Error::UnknownLabel(_))));
    assert!(matches!(tagger.feature_index("token=Moscow"), Err(Error::UnknownFeature(_))));
}

#[test]
fn untrained_model() {
    let tagger = PosTagger::new(MaxEntTrainer::default());
    assert!(!tagger.is_trained());
    assert!(matches!(tagger.feature_index("token=What"), Err(Error::Untrained)));
    assert!(matches!(tagger.label_index("WP"), Err(Error::Untrained)));
    assert!(matches!(tagger.predict(&["What"]), Err(Error::Untrained)));
    assert!(matches!(tagger.predict_greedy(&["What"]), Err(Error::Untrained)));
    assert!(matches!(tagger.predict_viterbi::<&str>(&[]), Err(Error::Untrained)));
    assert!(matches!(tagger.model(), Err(Error::Untrained)));
}

#[test]
fn malformed_example_stops_training() {
    init();
    let good = TaggedSentence::new(&["a", "dog"], &["DT", "NN"]).unwrap();
    let bad = TaggedSentence {
        tokens: vec!["the".into(), "cat".into()],
        tags: vec!["DT".into()],
    };
    let mut tagger = PosTagger::new(MaxEntTrainer::default());
    let err = tagger.train([&good, &bad]).unwrap_err();
    assert!(matches!(err, Error::MalformedExample { index: 1, tokens: 2, tags: 1 }), "{err}");
    assert!(!tagger.is_trained());
}

#[test]
fn empty_training_set() {
    let mut tagger = PosTagger::new(MaxEntTrainer::default());
    assert!(matches!(tagger.train(&Vec::<TaggedSentence>::new()), Err(Error::EmptyTrainingSet)));
    let empty = TaggedSentence::default();
    assert!(matches!(tagger.train([&empty]), Err(Error::EmptyTrainingSet)));
}

#[test]
fn single_tag_corpus() {
    init();
    let ds = Dataset::from("a\tX\nb\tX\n\nc\tX".lines());
    let mut tagger = PosTagger::new(MaxEntTrainer::default());
    tagger.train(&ds.seqs).unwrap();
    assert_eq!(tagger.predict(&["a", "z", "c"]).unwrap(), vec!["X", "X", "X"]);
}

#[test]
fn store_and_load_model() {
    init();
    let mut options = TrainOptions::default();
    options.set("c1", "0").unwrap();
    options.set("c2", "0.1").unwrap();
    let mut tagger = PosTagger::new(MaxEntTrainer::new(options.clone()));
    tagger.train(&what().seqs).unwrap();
    let model = tagger.into_model().unwrap();

    let path = std::env::temp_dir().join(format!("memm-tagger-{}.json", std::process::id()));
    model.save(&path).expect("failed to store the model");
    let restored = MaxEntModel::from_path(&path).expect("failed to load model");
    std::fs::remove_file(&path).ok();

    assert_eq!(restored.options().c2, 0.1);
    assert_eq!(restored.labels(), model.labels());
    assert_eq!(restored.num_features(), model.num_features());
    let tagger = PosTagger::with_model(MaxEntTrainer::new(options), restored);
    let tokens = ["What", "'s", "next", "?"];
    let expected = PosTagger::with_model(MaxEntTrainer::default(), model).predict(&tokens).unwrap();
    assert_eq!(tagger.predict(&tokens).unwrap(), expected);
}
