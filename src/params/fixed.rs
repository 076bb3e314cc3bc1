//! Survey-constant configuration.
//!
//! [`FixedParams`] holds every value that does not vary across the runs of a
//! survey: file locations, artifact toggles, solver tolerances, the imaging
//! transform type, and the per-station SEFD error budget. Instances are
//! created once per survey invocation through [`FixedParamsBuilder`] and are
//! immutable thereafter.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::constants::{Lambda, MicroArcSec, SefdBudget};
use crate::visweep_errors::VisweepError;

/// Fourier-transform strategy used by the imaging backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformType {
    /// Gridded FFT approximation.
    Fast,
    /// Non-uniform FFT.
    #[default]
    Nfft,
    /// Direct transform, exact but slow.
    Direct,
}

impl TransformType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformType::Fast => "fast",
            TransformType::Nfft => "nfft",
            TransformType::Direct => "direct",
        }
    }
}

impl fmt::Display for TransformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformType {
    type Err = VisweepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fast" => Ok(TransformType::Fast),
            "nfft" => Ok(TransformType::Nfft),
            "direct" => Ok(TransformType::Direct),
            other => Err(VisweepError::InvalidTransformType(other.to_string())),
        }
    }
}

/// Non-varying survey parameters.
///
/// Fields
/// -----------------
/// **Files and artifacts**
/// * `infile` – path to the input visibility dataset (UVFITS).
/// * `outfile_base` – base name shared by every output artifact.
/// * `outpath` – output directory, created on first use.
/// * `ground_truth_img` – optional reference image for cross-correlation.
/// * `save_imgsums` / `save_uvfits` / `save_pdf` / `save_stats` /
///   `save_caltab` – per-artifact persistence toggles. An artifact whose
///   toggle is off is simply not written.
///
/// **Execution**
/// * `nproc` – worker count for the survey thread pool (`1` = sequential).
///
/// **Imaging**
/// * `ttype` – transform strategy forwarded to the backend.
/// * `selfcal` – enable the iterative self-calibration rounds.
/// * `gaintol` – (under, over) gain tolerance bounds for amplitude+phase
///   self-calibration.
/// * `niter_static` – optimizer restarts per imaging step.
/// * `blurfrac` – blur fraction applied between optimizer restarts.
/// * `maxit` – iteration cap per optimizer call.
/// * `stop` – optimizer convergence criterion.
/// * `fov_uas` – image field of view (µas).
/// * `npixels` – pixels per image side.
/// * `reverse_taper_uas` – FWHM of the resolution-limiting taper (µas);
///   `0` disables tapering.
/// * `uv_zblcut` – uv-distance below which flux counts as short-baseline
///   (wavelengths).
/// * `sefd_error_budget` – fractional SEFD error per station, the source of
///   the per-station systematic noise floor.
///
/// Defaults
/// -----------------
/// [`FixedParamsBuilder::new`] starts from the survey defaults: no ground
/// truth, UVFITS/stats/caltable saved, summaries and PDFs not saved, one
/// worker, `nfft` transform, self-calibration on, gain tolerance
/// `(0.02, 0.2)`, 3 restarts, blur fraction 1, 100 iterations, stop `1e-4`,
/// 128 µas field over 64 pixels, 5 µas reverse taper, `1e8` λ short-baseline
/// cut, and a 10% SEFD budget for the eight stations of the 2017 array
/// (AA, AX, GL, LM, MG, MM, PV, SW).
#[derive(Debug, Clone)]
pub struct FixedParams {
    pub infile: PathBuf,
    pub outfile_base: String,
    pub outpath: PathBuf,
    pub ground_truth_img: Option<PathBuf>,

    pub save_imgsums: bool,
    pub save_uvfits: bool,
    pub save_pdf: bool,
    pub save_stats: bool,
    pub save_caltab: bool,

    pub nproc: usize,

    pub ttype: TransformType,
    pub selfcal: bool,
    pub gaintol: (f64, f64),
    pub niter_static: usize,
    pub blurfrac: f64,
    pub maxit: usize,
    pub stop: f64,
    pub fov_uas: MicroArcSec,
    pub npixels: usize,
    pub reverse_taper_uas: MicroArcSec,
    pub uv_zblcut: Lambda,
    pub sefd_error_budget: SefdBudget,
}

impl FixedParams {
    /// Start a [`FixedParamsBuilder`] from the three required locations.
    ///
    /// # Example
    ///
    /// ```rust
    /// use visweep::params::FixedParams;
    ///
    /// let fixed = FixedParams::builder("obs.uvfits", "m87", "survey_out")
    ///     .selfcal(false)
    ///     .maxit(50)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(fixed.maxit, 50);
    /// ```
    pub fn builder(
        infile: impl Into<PathBuf>,
        outfile_base: impl Into<String>,
        outpath: impl Into<PathBuf>,
    ) -> FixedParamsBuilder {
        FixedParamsBuilder::new(infile, outfile_base, outpath)
    }
}

fn default_sefd_budget() -> SefdBudget {
    ["AA", "AX", "GL", "LM", "MG", "MM", "PV", "SW"]
        .iter()
        .map(|s| (s.to_string(), 0.1))
        .collect::<HashMap<_, _>>()
}

/// Builder for [`FixedParams`], with validation.
#[derive(Debug, Clone)]
pub struct FixedParamsBuilder {
    params: FixedParams,
}

impl FixedParamsBuilder {
    /// Create a builder initialized with the survey defaults.
    pub fn new(
        infile: impl Into<PathBuf>,
        outfile_base: impl Into<String>,
        outpath: impl Into<PathBuf>,
    ) -> Self {
        Self {
            params: FixedParams {
                infile: infile.into(),
                outfile_base: outfile_base.into(),
                outpath: outpath.into(),
                ground_truth_img: None,
                save_imgsums: false,
                save_uvfits: true,
                save_pdf: false,
                save_stats: true,
                save_caltab: true,
                nproc: 1,
                ttype: TransformType::Nfft,
                selfcal: true,
                gaintol: (0.02, 0.2),
                niter_static: 3,
                blurfrac: 1.0,
                maxit: 100,
                stop: 1.0e-4,
                fov_uas: 128.0,
                npixels: 64,
                reverse_taper_uas: 5.0,
                uv_zblcut: 0.1e9,
                sefd_error_budget: default_sefd_budget(),
            },
        }
    }

    pub fn ground_truth_img(mut self, path: impl Into<PathBuf>) -> Self {
        self.params.ground_truth_img = Some(path.into());
        self
    }
    pub fn save_imgsums(mut self, v: bool) -> Self {
        self.params.save_imgsums = v;
        self
    }
    pub fn save_uvfits(mut self, v: bool) -> Self {
        self.params.save_uvfits = v;
        self
    }
    pub fn save_pdf(mut self, v: bool) -> Self {
        self.params.save_pdf = v;
        self
    }
    pub fn save_stats(mut self, v: bool) -> Self {
        self.params.save_stats = v;
        self
    }
    pub fn save_caltab(mut self, v: bool) -> Self {
        self.params.save_caltab = v;
        self
    }
    pub fn nproc(mut self, v: usize) -> Self {
        self.params.nproc = v;
        self
    }
    pub fn ttype(mut self, v: TransformType) -> Self {
        self.params.ttype = v;
        self
    }
    pub fn selfcal(mut self, v: bool) -> Self {
        self.params.selfcal = v;
        self
    }
    pub fn gaintol(mut self, under: f64, over: f64) -> Self {
        self.params.gaintol = (under, over);
        self
    }
    pub fn niter_static(mut self, v: usize) -> Self {
        self.params.niter_static = v;
        self
    }
    pub fn blurfrac(mut self, v: f64) -> Self {
        self.params.blurfrac = v;
        self
    }
    pub fn maxit(mut self, v: usize) -> Self {
        self.params.maxit = v;
        self
    }
    pub fn stop(mut self, v: f64) -> Self {
        self.params.stop = v;
        self
    }
    pub fn fov_uas(mut self, v: MicroArcSec) -> Self {
        self.params.fov_uas = v;
        self
    }
    pub fn npixels(mut self, v: usize) -> Self {
        self.params.npixels = v;
        self
    }
    pub fn reverse_taper_uas(mut self, v: MicroArcSec) -> Self {
        self.params.reverse_taper_uas = v;
        self
    }
    pub fn uv_zblcut(mut self, v: Lambda) -> Self {
        self.params.uv_zblcut = v;
        self
    }
    pub fn sefd_error_budget(mut self, budget: SefdBudget) -> Self {
        self.params.sefd_error_budget = budget;
        self
    }

    /// Return true iff x > 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn gt0(x: f64) -> bool {
        x.partial_cmp(&0.0) == Some(std::cmp::Ordering::Greater)
    }

    /// Finalize the builder and produce a [`FixedParams`] instance.
    ///
    /// Validation rules
    /// -----------------
    /// * `fov_uas > 0`, `npixels >= 1` – the image grid must be non-degenerate.
    /// * `maxit >= 1`, `niter_static >= 1` – the optimizer must be allowed to run.
    /// * `stop > 0`, `blurfrac > 0` – convergence and blur controls must be positive.
    /// * `reverse_taper_uas >= 0` – zero disables the taper.
    /// * `uv_zblcut >= 0` – short-baseline cut cannot be negative.
    /// * `0 < gaintol.0` and `0 < gaintol.1` – gain bounds must be positive.
    /// * `nproc >= 1` – at least one worker.
    /// * every SEFD budget entry must be non-negative.
    ///
    /// Returns
    /// -----------------
    /// * `Ok(FixedParams)` if all values are valid.
    /// * `Err(VisweepError::InvalidSurveyParameter)` otherwise.
    pub fn build(self) -> Result<FixedParams, VisweepError> {
        let p = &self.params;

        if !Self::gt0(p.fov_uas) {
            return Err(VisweepError::InvalidSurveyParameter(
                "fov_uas must be > 0".into(),
            ));
        }
        if p.npixels == 0 {
            return Err(VisweepError::InvalidSurveyParameter(
                "npixels must be >= 1".into(),
            ));
        }
        if p.maxit == 0 {
            return Err(VisweepError::InvalidSurveyParameter(
                "maxit must be >= 1".into(),
            ));
        }
        if p.niter_static == 0 {
            return Err(VisweepError::InvalidSurveyParameter(
                "niter_static must be >= 1".into(),
            ));
        }
        if !Self::gt0(p.stop) {
            return Err(VisweepError::InvalidSurveyParameter(
                "stop must be > 0".into(),
            ));
        }
        if !Self::gt0(p.blurfrac) {
            return Err(VisweepError::InvalidSurveyParameter(
                "blurfrac must be > 0".into(),
            ));
        }
        if p.reverse_taper_uas < 0.0 || p.reverse_taper_uas.is_nan() {
            return Err(VisweepError::InvalidSurveyParameter(
                "reverse_taper_uas must be >= 0".into(),
            ));
        }
        if p.uv_zblcut < 0.0 || p.uv_zblcut.is_nan() {
            return Err(VisweepError::InvalidSurveyParameter(
                "uv_zblcut must be >= 0".into(),
            ));
        }
        if !Self::gt0(p.gaintol.0) || !Self::gt0(p.gaintol.1) {
            return Err(VisweepError::InvalidSurveyParameter(
                "gaintol bounds must be > 0".into(),
            ));
        }
        if p.nproc == 0 {
            return Err(VisweepError::InvalidSurveyParameter(
                "nproc must be >= 1".into(),
            ));
        }
        if p.sefd_error_budget.values().any(|e| *e < 0.0 || e.is_nan()) {
            return Err(VisweepError::InvalidSurveyParameter(
                "sefd_error_budget entries must be >= 0".into(),
            ));
        }

        Ok(self.params)
    }
}
