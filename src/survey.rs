//! # Survey driver
//!
//! Dispatches one guarded pipeline run per parameter-table row across a
//! rayon worker pool and collects **per-run outcomes**.
//!
//! ## Result model
//!
//! Outcomes come back as a [`SurveyOutcome`]:
//!
//! ```text
//! RunIndex → Result<RunSummary, VisweepError>
//! ```
//!
//! * `Ok(RunSummary)` – the run completed (or the resume guard found it
//!   already done and skipped it),
//! * `Err(VisweepError)` – a failure **isolated** to that run; siblings are
//!   unaffected.
//!
//! ## Execution model
//!
//! Runs are embarrassingly parallel: no shared mutable state, no locking,
//! no inter-run messaging, no ordering guarantee. The output directory is
//! the only shared resource, and filename uniqueness (via the run index)
//! prevents collisions. Killing a worker mid-run leaves no completion
//! marker, so a re-invoked survey simply redoes that run.
//!
//! With the `progress` feature, a live progress bar tracks completed rows.

use std::collections::HashMap;

use ahash::RandomState;
use log::{info, warn};
use rayon::prelude::*;

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

use crate::constants::RunIndex;
use crate::imaging::ImagingBackend;
use crate::params::{FixedParams, ParamTable, ParameterSet, SweptRow};
use crate::pipeline::{self, RunSummary};
use crate::visweep_errors::VisweepError;

/// Full survey outcome: one entry per dispatched row.
pub type SurveyOutcome = HashMap<RunIndex, Result<RunSummary, VisweepError>, RandomState>;

/// Run the guarded pipeline for a single parameter-table row.
///
/// Ensures the output directory exists, resolves the row against the fixed
/// parameters, and runs the pipeline (subject to the resume guard).
pub fn run_pset<B: ImagingBackend>(
    backend: &B,
    row: &SweptRow,
    fixed: &FixedParams,
) -> Result<RunSummary, VisweepError> {
    std::fs::create_dir_all(&fixed.outpath)?;
    let pset = ParameterSet::new(row, fixed);
    pipeline::run(backend, &pset)
}

/// Run the whole survey over a worker pool of `fixed.nproc` threads.
///
/// Arguments
/// -----------------
/// * `backend`: The imaging-library collaborator, shared read-only by all
///   workers.
/// * `table`: The expanded parameter table.
/// * `fixed`: The survey-constant configuration.
///
/// Return
/// ----------
/// * `Ok(SurveyOutcome)` mapping each row index to its per-run result.
/// * `Err(VisweepError)` only if the worker pool itself cannot be built;
///   per-run failures never abort the survey.
pub fn run_survey<B: ImagingBackend>(
    backend: &B,
    table: &ParamTable,
    fixed: &FixedParams,
) -> Result<SurveyOutcome, VisweepError> {
    info!(
        "survey: {} runs over {} worker(s), output in {}",
        table.len(),
        fixed.nproc,
        fixed.outpath.display()
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(fixed.nproc)
        .build()?;

    #[cfg(feature = "progress")]
    let pb = {
        let pb = ProgressBar::new(table.len().max(1) as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{bar:40.cyan/blue} {pos}/{len} ({percent:>3}%) | {per_sec} | ETA {eta_precise}",
            )
            .expect("indicatif template"),
        );
        pb
    };

    let results: Vec<(RunIndex, Result<RunSummary, VisweepError>)> = pool.install(|| {
        table
            .rows()
            .par_iter()
            .map(|row| {
                let res = run_pset(backend, row, fixed);
                if let Err(err) = &res {
                    warn!("run {:07}: {err}", row.i);
                }
                #[cfg(feature = "progress")]
                pb.inc(1);
                (row.i, res)
            })
            .collect()
    });

    #[cfg(feature = "progress")]
    pb.finish_and_clear();

    let outcome: SurveyOutcome = results.into_iter().collect();
    let failed = outcome.values().filter(|r| r.is_err()).count();
    if failed > 0 {
        warn!("survey: {failed}/{} runs failed", outcome.len());
    }

    Ok(outcome)
}
