//! One fully-resolved configuration for a single reconstruction run.
//!
//! [`ParameterSet`] merges one [`SweptRow`] with the survey's
//! [`FixedParams`] and computes the derived fields exactly once: the
//! zero-padded per-run output basename and the radian conversions of the
//! three angular parameters (field of view, reverse taper, prior FWHM).
//! Construction is pure; building the same row twice yields identical
//! values. Instances live for the duration of one run and are discarded
//! once outputs are persisted.

use std::path::PathBuf;

use crate::constants::{Radian, RADPERUAS};
use crate::params::fixed::FixedParams;
use crate::params::sweep::SweptRow;

/// Resolved per-run configuration.
///
/// The swept and fixed layers stay accessible as `row` and `fixed`; the
/// angular fields below are the only unit-converted copies — downstream
/// code must never convert `fov_uas`/`reverse_taper_uas`/`prior_fwhm_uas`
/// again.
#[derive(Debug, Clone)]
pub struct ParameterSet {
    pub row: SweptRow,
    pub fixed: FixedParams,

    /// Per-run output basename: `"{outfile_base}_{i:07}"`. Unique within a
    /// survey because the row index is unique, so concurrent runs never
    /// collide on output paths.
    pub outfile: String,
    /// Image field of view (radians).
    pub fov: Radian,
    /// Reverse-taper FWHM (radians); `0` disables tapering.
    pub reverse_taper: Radian,
    /// Prior Gaussian FWHM (radians).
    pub prior_fwhm: Radian,
}

impl ParameterSet {
    /// Resolve one swept row against the survey's fixed parameters.
    pub fn new(row: &SweptRow, fixed: &FixedParams) -> Self {
        let outfile = format!("{}_{:07}", fixed.outfile_base, row.i);
        ParameterSet {
            row: row.clone(),
            fixed: fixed.clone(),
            outfile,
            fov: fixed.fov_uas * RADPERUAS,
            reverse_taper: fixed.reverse_taper_uas * RADPERUAS,
            prior_fwhm: row.prior_fwhm_uas * RADPERUAS,
        }
    }

    fn artifact(&self, suffix: &str) -> PathBuf {
        self.fixed.outpath.join(format!("{}{suffix}", self.outfile))
    }

    /// Reconstructed image (FITS), always written.
    pub fn fits_path(&self) -> PathBuf {
        self.artifact(".fits")
    }

    /// Self-calibrated visibility dataset (UVFITS), optional.
    pub fn uvfits_path(&self) -> PathBuf {
        self.artifact(".uvfits")
    }

    /// Rendered image document, optional.
    pub fn pdf_path(&self) -> PathBuf {
        self.artifact(".pdf")
    }

    /// Multi-panel diagnostic summary, optional.
    pub fn imgsum_path(&self) -> PathBuf {
        self.artifact("_imgsum.pdf")
    }

    /// Directory holding the calibration table, optional.
    pub fn caltab_dir(&self) -> PathBuf {
        self.fixed.outpath.join(&self.outfile)
    }

    /// Per-run statistics record.
    pub fn stats_path(&self) -> PathBuf {
        self.artifact("_stats.csv")
    }

    /// Per-run parameter record; its presence doubles as the
    /// resume-completion marker.
    pub fn params_path(&self) -> PathBuf {
        self.artifact("_params.csv")
    }
}
