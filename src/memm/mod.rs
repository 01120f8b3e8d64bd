#![allow(non_snake_case)]

pub mod data;
pub mod dict;
pub mod feature;
pub mod greedy;
pub mod lbfgs;
pub mod maxent;
pub mod model;
pub mod tagger;
pub mod trainer;
pub mod viterbi;

#[cfg(test)]
mod testing;
