//! Goodness-of-fit statistics for one run.
//!
//! Chi-squared values are evaluated at two noise-accounting levels: against
//! the unmodified original observation (zero systematic noise) and against
//! the systematic-noise-adjusted baseline self-calibrated to the final
//! image. Each run writes its own record immediately, so a partially
//! finished survey can already be inspected.

use serde::Serialize;

use crate::constants::{RunIndex, NXCORR_FOV_UAS, NXCORR_NPIX, RADPERUAS};
use crate::imaging::{ChisqKind, ChisqOptions, ImagingBackend, SelfcalMethod, SelfcalOptions};
use crate::params::ParameterSet;
use crate::pipeline::calibrate::Calibrated;
use crate::pipeline::output::OutputProducts;
use crate::visweep_errors::VisweepError;

/// One per-run statistics record.
///
/// Suffixes: `_ref` – against the original calibrated observation with zero
/// systematic noise; `_sub` – against the original observation self-
/// calibrated to the restored image; `_sys` – against the noise-adjusted
/// self-cal baseline re-calibrated to the restored image. `nxcorr` is
/// absent when no ground-truth image was supplied.
#[derive(Debug, Clone, Serialize)]
pub struct StatsRecord {
    pub i: RunIndex,
    pub nxcorr: Option<f64>,
    pub chi2_cp_ref: f64,
    pub chi2_lc_ref: f64,
    pub chi2_vis_ref: f64,
    pub chi2_vis_sub: f64,
    pub chi2_cp_sys: f64,
    pub chi2_lc_sys: f64,
    pub chi2_vis_sys: f64,
}

/// Evaluate the goodness-of-fit record for one run.
///
/// Closure phases use no SNR cut; visibility and log-closure-amplitude
/// terms cut at SNR 1 to drop points that would blow up the statistic.
/// The optional normalized cross-correlation regrids both images onto the
/// fixed 200 µas / 256-pixel comparison grid.
pub fn compute<B: ImagingBackend>(
    backend: &B,
    pset: &ParameterSet,
    cal: &Calibrated<B>,
    out: &OutputProducts<B>,
) -> Result<StatsRecord, VisweepError> {
    let cp_opts = ChisqOptions {
        ttype: pset.fixed.ttype,
        snr_cut: 0.0,
        cp_uv_min: pset.fixed.uv_zblcut,
    };
    let amp_opts = ChisqOptions {
        snr_cut: 1.0,
        ..cp_opts
    };

    let nxcorr = match &pset.fixed.ground_truth_img {
        Some(path) => {
            let truth = backend.load_image(path)?;
            let fov = NXCORR_FOV_UAS * RADPERUAS;
            let psize = fov / NXCORR_NPIX as f64;
            Some(backend.cross_correlation(&truth, &out.im_addcmp, fov, psize)?)
        }
        None => None,
    };

    // Reference level: original data, zero systematic noise.
    let chi2_cp_ref =
        backend.chi_squared(&cal.obs_orig, &out.im_addcmp, ChisqKind::CPhase, &cp_opts)?;
    let chi2_lc_ref =
        backend.chi_squared(&cal.obs_orig, &out.im_addcmp, ChisqKind::LogCAmp, &amp_opts)?;
    let chi2_vis_ref =
        backend.chi_squared(&cal.obs_orig, &out.im_addcmp, ChisqKind::Vis, &amp_opts)?;

    // Original data self-calibrated to the final image.
    let chi2_vis_sub = backend.chi_squared(
        &out.obs_sc_addcmp,
        &out.im_addcmp,
        ChisqKind::Vis,
        &amp_opts,
    )?;

    // Noise-adjusted baseline, self-calibrated to the final image.
    let obs_sys = backend.self_calibrate(
        &cal.obs_sc_init,
        &out.im_addcmp,
        SelfcalMethod::Both,
        &SelfcalOptions::new(pset.fixed.ttype),
    )?;
    let chi2_cp_sys = backend.chi_squared(&obs_sys, &out.im_addcmp, ChisqKind::CPhase, &cp_opts)?;
    let chi2_lc_sys =
        backend.chi_squared(&obs_sys, &out.im_addcmp, ChisqKind::LogCAmp, &amp_opts)?;
    let chi2_vis_sys = backend.chi_squared(&obs_sys, &out.im_addcmp, ChisqKind::Vis, &amp_opts)?;

    Ok(StatsRecord {
        i: pset.row.i,
        nxcorr,
        chi2_cp_ref,
        chi2_lc_ref,
        chi2_vis_ref,
        chi2_vis_sub,
        chi2_cp_sys,
        chi2_lc_sys,
        chi2_vis_sys,
    })
}
