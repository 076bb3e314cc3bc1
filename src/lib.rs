//! # visweep
//!
//! Parameter-survey orchestration for radio-interferometric image
//! reconstruction: given one measured visibility dataset, run many
//! reconstructions under different regularizer / data-weight /
//! self-calibration settings, recording outputs and goodness-of-fit
//! statistics per configuration.
//!
//! The imaging algorithm itself — the non-convex optimization over pixel
//! intensities, self-calibration mathematics, chi-squared evaluation, and
//! all file codecs — lives behind the [`imaging::ImagingBackend`] trait.
//! This crate configures, sequences, and parallelizes calls into it.
//!
//! ## Overview
//!
//! * [`params`] – fixed parameters, swept axes, the cartesian parameter
//!   table, and the per-run resolved [`params::ParameterSet`].
//! * [`imaging`] – the collaborator contract plus the pure term-selection
//!   functions in [`imaging::weights`].
//! * [`pipeline`] – the per-run staged pipeline with its resume guard.
//! * [`survey`] – parallel dispatch over a rayon worker pool.
//!
//! ## Example
//!
//! ```rust,no_run
//! use visweep::params::{FixedParams, SweepAxes};
//! use visweep::survey::run_survey;
//!
//! # fn demo<B: visweep::imaging::ImagingBackend>(backend: &B) -> Result<(), visweep::visweep_errors::VisweepError> {
//! let fixed = FixedParams::builder("obs.uvfits", "m87", "survey_out")
//!     .nproc(8)
//!     .build()?;
//! let table = SweepAxes {
//!     zbl: vec![0.5, 0.6],
//!     sys_noise: vec![0.0, 0.02],
//!     ..SweepAxes::default()
//! }
//! .build_table()?;
//!
//! let outcome = run_survey(backend, &table, &fixed)?;
//! for (i, res) in &outcome {
//!     match res {
//!         Ok(summary) if summary.skipped => eprintln!("{i}: already done"),
//!         Ok(summary) => eprintln!("{i}: wrote {}", summary.outfile),
//!         Err(err) => eprintln!("{i}: failed: {err}"),
//!     }
//! }
//! # Ok(()) }
//! ```

pub mod constants;
pub mod imaging;
pub mod params;
pub mod pipeline;
pub mod survey;
pub mod visweep_errors;

pub use constants::RADPERUAS;
pub use imaging::ImagingBackend;
pub use params::{AvgTime, FixedParams, ParamTable, ParameterSet, SweepAxes, SweptRow};
pub use pipeline::{RunSummary, StatsRecord};
pub use survey::{run_pset, run_survey, SurveyOutcome};
pub use visweep_errors::VisweepError;
