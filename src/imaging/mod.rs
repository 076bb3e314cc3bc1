//! # Imaging-library collaborator contract
//!
//! The numerical heart of a survey — visibility I/O, calibration operations,
//! the regularized optimizer, self-calibration, chi-squared evaluation, and
//! rendering — lives in an external imaging library. This module defines the
//! seam: the [`ImagingBackend`] trait with opaque `Obs`/`Image`/`CalTable`
//! associated types, plus the small value types the pipeline uses to talk to
//! it ([`ImagerSettings`], [`SelfcalOptions`], [`ChisqOptions`], term keys).
//!
//! The pipeline never inspects the associated types; it only sequences
//! backend calls and threads the opaque handles from stage to stage. Tests
//! drive the pipeline through a scripted backend implementing this trait.

pub mod weights;

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::constants::{Jy, Lambda, Radian, StationCode};
use crate::params::fixed::TransformType;
use crate::params::sweep::AvgTime;
use crate::visweep_errors::VisweepError;

/// Data-fidelity terms understood by the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DataTerm {
    /// Complex visibilities.
    Vis,
    /// Visibility amplitudes.
    Amp,
    /// Closure phases.
    CPhase,
    /// Log closure amplitudes.
    LogCAmp,
    /// Diagonalized closure phases.
    CPhaseDiag,
    /// Diagonalized log closure amplitudes.
    LogCAmpDiag,
}

/// Regularizer terms understood by the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RegTerm {
    /// Relative entropy against the prior image.
    Simple,
    /// Total variation.
    Tv,
    /// Total squared variation.
    Tv2,
    /// Sparsity (l1 norm).
    L1,
    /// Total flux density constraint.
    Flux,
    /// Compact Gaussian component.
    RGauss,
}

/// Weight mapping for either term family; absent keys are inactive.
pub type TermWeights<K> = BTreeMap<K, f64>;

/// One Gaussian component added to an image.
///
/// Angles and offsets are in radians; `fwhm_min == fwhm_maj` with zero
/// offsets describes the circular prior component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussComponent {
    pub fwhm_maj: Radian,
    pub fwhm_min: Radian,
    pub position_angle: Radian,
    pub x_offset: Radian,
    pub y_offset: Radian,
}

impl GaussComponent {
    /// A centered circular Gaussian of the given FWHM.
    pub fn circular(fwhm: Radian) -> Self {
        GaussComponent {
            fwhm_maj: fwhm,
            fwhm_min: fwhm,
            position_angle: 0.0,
            x_offset: 0.0,
            y_offset: 0.0,
        }
    }
}

/// Self-calibration mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfcalMethod {
    /// Phase-only station gains.
    Phase,
    /// Joint amplitude and phase gains.
    Both,
}

/// Tuning forwarded to self-calibration calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelfcalOptions {
    pub ttype: TransformType,
    /// Gain solution interval in seconds; `Some(0.0)` aligns phases across
    /// bands, `None` leaves the library default.
    pub solution_interval: Option<f64>,
    /// (under, over) unity gain tolerance for amplitude solutions.
    pub gain_tol: Option<(f64, f64)>,
}

impl SelfcalOptions {
    pub fn new(ttype: TransformType) -> Self {
        SelfcalOptions {
            ttype,
            solution_interval: None,
            gain_tol: None,
        }
    }
}

/// Full configuration of one optimizer invocation.
#[derive(Debug, Clone)]
pub struct ImagerSettings<'a> {
    pub data_term: &'a TermWeights<DataTerm>,
    pub reg_term: &'a TermWeights<RegTerm>,
    /// Total flux constraint (Jy).
    pub flux: Jy,
    pub maxit: usize,
    /// Convergence criterion.
    pub stop: f64,
    /// Per-station systematic noise floor (fractional).
    pub systematic_noise: &'a HashMap<StationCode, f64>,
    pub ttype: TransformType,
    /// Minimum uv-distance entering closure quantities.
    pub cp_uv_min: Lambda,
    /// Optimizer restarts within this invocation.
    pub niter: usize,
    /// Blur fraction applied between restarts.
    pub blur_frac: f64,
}

/// Chi-squared data kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChisqKind {
    Vis,
    CPhase,
    LogCAmp,
}

/// Tuning forwarded to chi-squared evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChisqOptions {
    pub ttype: TransformType,
    /// Points below this SNR are excluded (guards against blown-up terms).
    pub snr_cut: f64,
    /// Minimum uv-distance entering closure quantities.
    pub cp_uv_min: Lambda,
}

/// Contract with the external imaging library.
///
/// `Obs`, `Image` and `CalTable` are opaque handles; cloning one must be
/// cheap enough to snapshot intermediate calibration states (the library's
/// own copy-on-write or reference semantics are acceptable). All methods
/// report failures as [`VisweepError`], which abort only the run that
/// raised them.
pub trait ImagingBackend: Send + Sync {
    type Obs: Clone + Send + Sync;
    type Image: Clone + Send + Sync;
    type CalTable: Clone + Send + Sync;

    // --- Visibility data ---

    /// Load a visibility dataset from a standard interchange file.
    fn load_visibilities(&self, path: &Path) -> Result<Self::Obs, VisweepError>;

    /// Detect scan boundaries and coherently average, per scan or over a
    /// fixed window.
    fn average_coherent(&self, obs: &Self::Obs, avg: AvgTime) -> Result<Self::Obs, VisweepError>;

    /// Median measured amplitude on the named station pair.
    fn median_baseline_amplitude(
        &self,
        obs: &Self::Obs,
        station_a: &str,
        station_b: &str,
    ) -> Result<Jy, VisweepError>;

    /// Drop antenna-table entries for stations with no measurements.
    fn flag_unobserved_stations(&self, obs: &Self::Obs) -> Result<Self::Obs, VisweepError>;

    /// Scale visibility and noise fields by `factor` on every baseline
    /// shorter than `uv_max`; longer baselines are untouched.
    fn rescale_short_baselines(
        &self,
        obs: &Self::Obs,
        factor: f64,
        uv_max: Lambda,
    ) -> Result<Self::Obs, VisweepError>;

    /// Reorder station-pair bookkeeping for consistency with noise ordering.
    fn reorder_baselines_by_snr(&self, obs: &Self::Obs) -> Result<Self::Obs, VisweepError>;

    /// Apply a resolution-limiting taper of the given FWHM.
    fn reverse_taper(&self, obs: &Self::Obs, fwhm: Radian) -> Result<Self::Obs, VisweepError>;

    /// Add non-closing systematic noise as a fraction of amplitude.
    fn add_fractional_noise(&self, obs: &Self::Obs, frac: f64) -> Result<Self::Obs, VisweepError>;

    /// Nominal (diffraction-limited) resolution of the observation.
    fn nominal_resolution(&self, obs: &Self::Obs) -> Result<Radian, VisweepError>;

    // --- Images ---

    /// Empty square image over the observation's field of view.
    fn blank_image(
        &self,
        obs: &Self::Obs,
        npixels: usize,
        fov: Radian,
    ) -> Result<Self::Image, VisweepError>;

    /// Add a Gaussian component of total flux `flux`.
    fn add_gaussian(
        &self,
        image: &Self::Image,
        flux: Jy,
        component: &GaussComponent,
    ) -> Result<Self::Image, VisweepError>;

    /// Blur an image with a circular beam of the given FWHM.
    fn blur_image(&self, image: &Self::Image, fwhm: Radian) -> Result<Self::Image, VisweepError>;

    /// Add a large-scale Gaussian flux component recovering the flux that
    /// short-baseline rescaling removed, fitted against `obs`.
    fn restore_extended_flux(
        &self,
        image: &Self::Image,
        obs: &Self::Obs,
        uv_max: Lambda,
    ) -> Result<Self::Image, VisweepError>;

    // --- Reconstruction and self-calibration ---

    /// Run the regularized optimizer from `init` with `prior` as the
    /// regularization reference.
    fn reconstruct(
        &self,
        obs: &Self::Obs,
        init: &Self::Image,
        prior: &Self::Image,
        settings: &ImagerSettings<'_>,
    ) -> Result<Self::Image, VisweepError>;

    /// Self-calibrate `obs` against a trial image, returning the calibrated
    /// observation.
    fn self_calibrate(
        &self,
        obs: &Self::Obs,
        image: &Self::Image,
        method: SelfcalMethod,
        opts: &SelfcalOptions,
    ) -> Result<Self::Obs, VisweepError>;

    /// Joint amplitude+phase self-calibration producing a reusable
    /// calibration table instead of a calibrated observation.
    fn self_calibrate_table(
        &self,
        obs: &Self::Obs,
        image: &Self::Image,
        opts: &SelfcalOptions,
    ) -> Result<Self::CalTable, VisweepError>;

    /// Apply a calibration table (nearest-neighbour interpolation,
    /// extrapolation allowed).
    fn apply_caltable(
        &self,
        table: &Self::CalTable,
        obs: &Self::Obs,
    ) -> Result<Self::Obs, VisweepError>;

    // --- Goodness of fit ---

    /// Chi-squared of `image` against `obs` for one data kind, with zero
    /// systematic noise.
    fn chi_squared(
        &self,
        obs: &Self::Obs,
        image: &Self::Image,
        kind: ChisqKind,
        opts: &ChisqOptions,
    ) -> Result<f64, VisweepError>;

    /// Load a reference image for comparison metrics.
    fn load_image(&self, path: &Path) -> Result<Self::Image, VisweepError>;

    /// Normalized cross-correlation between two images, regridded to the
    /// given field of view and pixel size.
    fn cross_correlation(
        &self,
        truth: &Self::Image,
        image: &Self::Image,
        fov: Radian,
        psize: Radian,
    ) -> Result<f64, VisweepError>;

    // --- Persistence ---

    fn save_image(&self, image: &Self::Image, path: &Path) -> Result<(), VisweepError>;

    fn save_visibilities(&self, obs: &Self::Obs, path: &Path) -> Result<(), VisweepError>;

    /// Persist a calibration table into a directory, using `obs` for
    /// station metadata.
    fn save_caltable(
        &self,
        table: &Self::CalTable,
        obs: &Self::Obs,
        dir: &Path,
    ) -> Result<(), VisweepError>;

    /// Render the image to a document (e.g. PDF).
    fn render_image(&self, image: &Self::Image, path: &Path) -> Result<(), VisweepError>;

    /// Render the multi-panel diagnostic summary sheet.
    fn render_summary(
        &self,
        image: &Self::Image,
        obs_selfcal: &Self::Obs,
        obs_reference: &Self::Obs,
        path: &Path,
        cp_uv_min: Lambda,
    ) -> Result<(), VisweepError>;
}
