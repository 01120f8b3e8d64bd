use std::{
    io::{self, BufWriter, Write},
    path::PathBuf,
    time::Instant,
};

use clap::{Parser, Subcommand};
use memm_tagger::{
    Classifier, Dataset, DecodeStrategy, Evaluation, GreedyDecoder, MaxEntModel, MaxEntTrainer, PosTagger,
    TrainOptions, ViterbiDecoder,
};

#[derive(Debug, Parser)]
#[command(version, about)]
#[command(propagate_version = true)]
struct Argv {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Train a model from tagged data sets (token<TAB>tag, blank line between sentences)
    Train {
        /// store the model to a file (MODEL)
        #[arg(short, long, required = true, value_name = "MODEL")]
        model: PathBuf,
        /// set a training parameter in NAME=VALUE form
        #[arg(short = 'p', long = "set", value_name = "NAME=VALUE")]
        parameters: Vec<String>,
        #[command(flatten)]
        options: TrainOptions,
        #[arg(required = true, value_name = "FILE")]
        datasets: Vec<PathBuf>,
    },
    /// Assign tags to the sentences in the data sets; input tags are only used with -t and -r
    Tag {
        /// read a model from a file (MODEL)
        #[arg(short, long, required = true, value_name = "MODEL")]
        model: PathBuf,
        /// decoding algorithm
        #[arg(short, long, value_enum, default_value_t = DecodeStrategy::Viterbi)]
        decoder: DecodeStrategy,
        /// report the performance of the model on the data
        #[arg(short = 't', long = "test")]
        evaluate: bool,
        /// output the reference tags in the input data
        #[arg(short, long)]
        reference: bool,
        /// suppress tagging results (useful for test mode)
        #[arg(short, long)]
        quiet: bool,
        #[arg(required = true, value_name = "FILE")]
        datasets: Vec<PathBuf>,
    },
    /// Output the model stored in the file (MODEL) in a plain-text format
    Dump {
        #[arg(short, long, required = true, value_name = "MODEL")]
        model: PathBuf,
    },
}

fn read_datasets(paths: &[PathBuf]) -> Dataset {
    let mut ds = Dataset::default();
    for fpath in paths {
        let part = Dataset::from_path(fpath).unwrap_or_else(|e| panic!("failed to read {}: {e}", fpath.display()));
        log::info!("read {} sentences from {}", part.len(), fpath.display());
        ds.extend(part);
    }
    ds
}

fn train(model: PathBuf, parameters: Vec<String>, mut options: TrainOptions, datasets: Vec<PathBuf>) {
    for s in &parameters {
        match s.split_once('=') {
            Some((name, value)) => options.set(name, value).expect("failed to set parameter"),
            None => log::warn!("ignoring parameter without a value: {s}"),
        }
    }
    let ds = read_datasets(&datasets);
    log::info!("number of sentences: {}, number of tokens: {}, max length: {}", ds.len(), ds.num_tokens(), ds.max_length());
    let mut tagger = PosTagger::new(MaxEntTrainer::new(options));
    tagger.train(&ds.seqs).expect("failed to train");
    let m = tagger.into_model().expect("failed to train");
    m.save(&model).expect("failed to store the model");
    log::info!("write model to {}", model.display());
}

fn tag(model: PathBuf, decoder: DecodeStrategy, evaluate: bool, reference: bool, quiet: bool, datasets: Vec<PathBuf>) {
    let model = MaxEntModel::from_path(&model).expect("failed to load model");
    let greedy = GreedyDecoder::new(&model);
    let viterbi = ViterbiDecoder::new(&model);
    let mut evaluation = Evaluation::default();
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let begin = Instant::now();
    let ds = read_datasets(&datasets);
    for seq in ds.iter() {
        let prediction = match decoder {
            DecodeStrategy::Greedy => greedy.decode(&seq.tokens).map(|o| o.tags),
            DecodeStrategy::Viterbi => viterbi.decode(&seq.tokens).map(|o| o.tags),
        }
        .expect("failed to tag");
        if evaluate {
            evaluation.accumulate(&seq.tags, &prediction);
        }
        if !quiet {
            for ((token, gold), pred) in seq.tokens.iter().zip(&seq.tags).zip(&prediction) {
                if reference {
                    writeln!(out, "{token}\t{gold}\t{pred}").expect("failed to write");
                } else {
                    writeln!(out, "{token}\t{pred}").expect("failed to write");
                }
            }
            writeln!(out).expect("failed to write");
        }
    }
    if evaluate {
        evaluation.evaluate();
        writeln!(out, "{}", evaluation).expect("failed to write");
        let sec = begin.elapsed().as_secs_f64();
        writeln!(out, "Elapsed time: {:.6} [sec] ({:.1} [instance/sec])", sec, ds.len() as f64 / sec).expect("failed to write");
    }
    log::info!("tagged {} sentences with {} labels", ds.len(), model.labels().iter().count());
}

fn main() {
    env_logger::init();
    let argv = Argv::parse();
    log::info!("argv: {:?}", argv);
    match argv.command {
        Command::Train {
            model,
            parameters,
            options,
            datasets,
        } => train(model, parameters, options, datasets),
        Command::Tag {
            model,
            decoder,
            evaluate,
            reference,
            quiet,
            datasets,
        } => tag(model, decoder, evaluate, reference, quiet, datasets),
        Command::Dump { model } => {
            let model = MaxEntModel::from_path(&model).expect("failed to load model");
            print!("{}", model.dump());
        }
    }
}
