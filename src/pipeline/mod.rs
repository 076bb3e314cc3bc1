//! # Per-run reconstruction pipeline
//!
//! One survey row flows through a fixed, linear sequence of stages, each
//! consuming the previous stage's typed output:
//!
//! 1. resume guard – skip everything if the run's parameter record exists,
//! 2. [`prepare::load_data`] – load and coherently average the dataset,
//! 3. [`calibrate::calibrate`] – pre-imaging calibration and snapshots,
//! 4. [`prepare::build_prior`] – Gaussian prior/seed image,
//! 5. [`reconstruct::reconstruct`] – static imaging plus the iterative
//!    self-calibration rounds,
//! 6. [`output::write_outputs`] – flux restoration and artifact persistence,
//! 7. [`stats::compute`] – chi-squared / cross-correlation record,
//! 8. params record – written last; its presence is the completion marker.
//!
//! Stages run strictly sequentially within one run; there is no shared
//! mutable state between runs. A run either completes all stages and
//! persists its marker, or leaves no marker and is fully redone on the next
//! survey invocation — no retries, no partial salvage.

pub mod calibrate;
pub mod output;
pub mod prepare;
pub mod records;
pub mod reconstruct;
pub mod stats;

use log::{debug, info};

use crate::constants::RunIndex;
use crate::imaging::ImagingBackend;
use crate::params::ParameterSet;
use crate::visweep_errors::VisweepError;

pub use reconstruct::Reconstruction;
pub use stats::StatsRecord;

/// Outcome of one guarded pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub index: RunIndex,
    pub outfile: String,
    /// True when the resume guard found the completion marker and no stage
    /// executed.
    pub skipped: bool,
}

/// Run the full pipeline for one resolved parameter set.
///
/// The resume guard fires first: if `<outfile>_params.csv` already exists in
/// the output directory the run is treated as complete and **no** stage or
/// backend call executes. This is the sole crash-recovery mechanism — a
/// survey interrupted mid-way is simply re-invoked with identical parameters
/// and redoes only unfinished runs.
///
/// Arguments
/// -----------------
/// * `backend`: The imaging-library collaborator.
/// * `pset`: The resolved configuration for this run.
///
/// Return
/// ----------
/// * `Ok(RunSummary)` – the run completed (or was skipped as already done).
/// * `Err(VisweepError)` – a stage failed; no completion marker was written.
pub fn run<B: ImagingBackend>(
    backend: &B,
    pset: &ParameterSet,
) -> Result<RunSummary, VisweepError> {
    if pset.params_path().exists() {
        debug!("{}: parameter record present, skipping", pset.outfile);
        return Ok(RunSummary {
            index: pset.row.i,
            outfile: pset.outfile.clone(),
            skipped: true,
        });
    }

    info!("{}: starting reconstruction", pset.outfile);

    let obs = prepare::load_data(backend, pset)?;
    let cal = calibrate::calibrate(backend, pset, obs)?;
    debug!(
        "{}: measured compact flux {:.4} Jy (target {:.4})",
        pset.outfile, cal.zbl_tot, pset.row.zbl
    );

    let prior = prepare::build_prior(backend, pset, &cal.obs_sc)?;
    let rec = reconstruct::reconstruct(backend, pset, &cal, &prior)?;
    let out = output::write_outputs(backend, pset, &cal, &rec)?;

    if pset.fixed.save_stats {
        let record = stats::compute(backend, pset, &cal, &out)?;
        records::write_stats(&pset.stats_path(), &record)?;
    }

    records::write_params(&pset.params_path(), pset, cal.zbl_tot)?;
    info!("{}: done", pset.outfile);

    Ok(RunSummary {
        index: pset.row.i,
        outfile: pset.outfile.clone(),
        skipped: false,
    })
}
