use std::{ffi::CStr, mem::MaybeUninit, str::FromStr};

use clap::Args;
use libc::{c_int, c_void};
use liblbfgs_sys::{lbfgs, lbfgs_free, lbfgs_malloc, lbfgs_parameter_init, lbfgs_parameter_t, lbfgs_strerror};
use serde::{Deserialize, Serialize};

use super::trainer::Objective;
use crate::errors::{Error, Result};

/// L1 coefficient equivalent to an inverse regularization cost of 1.5.
pub const DEFAULT_C1: f64 = 1.0 / 1.5;

/// Backtracking line search (regular Wolfe condition); the only one OWL-QN accepts.
const LINESEARCH_BACKTRACKING: c_int = 2;

/// Parameters of the L-BFGS / OWL-QN optimizer.
#[derive(Debug, Clone, PartialEq, Args, Serialize, Deserialize)]
pub struct TrainOptions {
    /// coefficient for L1 regularization (OWL-QN when positive)
    #[arg(long, default_value_t = DEFAULT_C1)]
    pub c1: f64,
    /// coefficient for L2 regularization
    #[arg(long, default_value_t = 0.0)]
    pub c2: f64,
    /// number of limited memories for approximating the inverse hessian
    #[arg(long, default_value_t = 6)]
    pub memory: i32,
    /// epsilon for testing the convergence of the objective
    #[arg(long, default_value_t = 1e-5)]
    pub epsilon: f64,
    /// duration of iterations to test the stopping criterion
    #[arg(long, default_value_t = 10)]
    pub past: i32,
    /// threshold for the stopping criterion
    #[arg(long, default_value_t = 1e-5)]
    pub delta: f64,
    /// maximum number of iterations
    #[arg(long, default_value_t = 100)]
    pub max_iterations: i32,
    /// maximum number of trials for the line search
    #[arg(long, default_value_t = 20)]
    pub max_linesearch: i32,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            c1: DEFAULT_C1,
            c2: 0.0,
            memory: 6,
            epsilon: 1e-5,
            past: 10,
            delta: 1e-5,
            max_iterations: 100,
            max_linesearch: 20,
        }
    }
}

fn parse<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::invalid_parameter(name, value))
}

fn non_negative(name: &str, value: &str) -> Result<f64> {
    let v: f64 = parse(name, value)?;
    if v < 0.0 || !v.is_finite() {
        return Err(Error::invalid_parameter(name, value));
    }
    Ok(v)
}

fn at_least(name: &str, value: &str, min: i32) -> Result<i32> {
    let v: i32 = parse(name, value)?;
    if v < min {
        return Err(Error::invalid_parameter(name, value));
    }
    Ok(v)
}

impl TrainOptions {
    /// Sets a parameter from its `name=value` string form.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "c1" => self.c1 = non_negative(name, value)?,
            "c2" => self.c2 = non_negative(name, value)?,
            "num_memories" | "memory" => self.memory = at_least(name, value, 1)?,
            "epsilon" => self.epsilon = non_negative(name, value)?,
            "period" | "past" => self.past = at_least(name, value, 0)?,
            "delta" => self.delta = non_negative(name, value)?,
            "max_iterations" => self.max_iterations = at_least(name, value, 0)?,
            "max_linesearch" => self.max_linesearch = at_least(name, value, 1)?,
            _ => return Err(Error::invalid_parameter(name, value)),
        }
        Ok(())
    }
}

/// First status of a run that made progress. Everything below it (unknown,
/// logic, out of memory, canceled and each `LBFGSERR_INVALID_*`) is raised
/// before or instead of optimizing.
const LBFGSERR_OUTOFINTERVAL: c_int = -1003;

fn is_fatal(r: c_int) -> bool {
    r < LBFGSERR_OUTOFINTERVAL
}

fn status_message(r: c_int) -> String {
    let s = unsafe { CStr::from_ptr(lbfgs_strerror(r)) };
    s.to_string_lossy().into_owned()
}

unsafe extern "C" fn proc_evaluate(
    instance: *mut c_void,
    x: *const f64,
    g: *mut f64,
    n: c_int,
    _step: f64,
) -> f64 {
    let objective = &*(instance as *const Objective);
    let n = n as usize;
    let w = std::slice::from_raw_parts(x, n);
    let g = std::slice::from_raw_parts_mut(g, n);
    objective.evaluate(w, g)
}

unsafe extern "C" fn proc_progress(
    _instance: *mut c_void,
    _x: *const f64,
    _g: *const f64,
    fx: f64,
    xnorm: f64,
    gnorm: f64,
    step: f64,
    _n: c_int,
    k: c_int,
    ls: c_int,
) -> c_int {
    log::debug!("***** Iteration #{k} *****");
    log::debug!("loss: {fx:.6}, feature norm: {xnorm:.6}, error norm: {gnorm:.6}");
    log::debug!("line search trials: {ls}, line search step: {step:.6}");
    0
}

/// Minimizes `objective` from the origin and returns the final weights.
///
/// Non-convergence is reported but not fatal: the optimizer leaves the best
/// point it reached in the weight buffer. Rejected parameters and allocation
/// failures are errors.
pub(crate) fn minimize(objective: &Objective, options: &TrainOptions) -> Result<Vec<f64>> {
    let n = objective.dimension();
    let num_params = c_int::try_from(n).map_err(|_| Error::Lbfgs(format!("too many parameters: {n}")))?;
    let l1_end = c_int::try_from(objective.bias_offset())
        .map_err(|_| Error::Lbfgs(format!("too many parameters: {n}")))?;

    let mut params = MaybeUninit::<lbfgs_parameter_t>::uninit();
    let mut params = unsafe {
        lbfgs_parameter_init(params.as_mut_ptr());
        params.assume_init()
    };
    params.m = options.memory;
    params.epsilon = options.epsilon;
    params.past = options.past;
    params.delta = options.delta;
    params.max_iterations = options.max_iterations;
    params.max_linesearch = options.max_linesearch;
    if options.c1 > 0.0 {
        // the bias row is left out of the L1 penalty
        params.orthantwise_c = options.c1;
        params.orthantwise_start = 0;
        params.orthantwise_end = l1_end;
        params.linesearch = LINESEARCH_BACKTRACKING;
    }
    log::debug!("lbfgs params: {:?}", options);

    let x = unsafe { lbfgs_malloc(num_params) };
    if x.is_null() {
        return Err(Error::Lbfgs("lbfgs_malloc failed".to_string()));
    }
    unsafe { std::slice::from_raw_parts_mut(x, n) }.fill(0.0);

    let mut fx = 0.0;
    let instance = objective as *const Objective as *mut c_void;
    let r = unsafe {
        lbfgs(
            num_params,
            x,
            &mut fx,
            Some(proc_evaluate),
            Some(proc_progress),
            instance,
            &mut params,
        )
    };
    let w = unsafe { std::slice::from_raw_parts(x, n) }.to_vec();
    unsafe { lbfgs_free(x) };
    if r >= 0 {
        log::info!("lbfgs terminated with status {r}, loss: {fx:.6}");
    } else if is_fatal(r) {
        return Err(Error::Lbfgs(format!("{} ({r})", status_message(r))));
    } else {
        log::warn!("lbfgs stopped early ({r}): {}", status_message(r));
    }
    Ok(w)
}
