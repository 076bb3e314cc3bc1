//! Pre-imaging calibration.
//!
//! Prepares the averaged observation for reconstruction: measures the total
//! compact flux on the reference long baseline, flags unobserved stations,
//! rescales short baselines so only compact flux is imaged, applies the
//! optional reverse taper and the fractional systematic noise, and takes
//! the snapshots the later stages calibrate and compare against.

use log::debug;

use crate::constants::Jy;
use crate::imaging::ImagingBackend;
use crate::params::ParameterSet;
use crate::visweep_errors::VisweepError;

/// Reference station for the compact-flux baseline.
const ZBL_STATION: &str = "AA";
/// Partner station, 2018+ site code.
const ZBL_PARTNER: &str = "AX";
/// Same physical site under its 2017 code.
const ZBL_PARTNER_ALT: &str = "AP";

/// Calibrated observation variants threaded through the rest of the run.
pub struct Calibrated<B: ImagingBackend> {
    /// Flagged and short-baseline-rescaled observation; drives the static
    /// imaging step and the nominal-resolution estimate.
    pub obs: B::Obs,
    /// Unrescaled reference kept before the short-baseline rescale, used
    /// for final self-calibration and reference chi-squared values.
    pub obs_orig: B::Obs,
    /// Working copy destined for self-calibration (taper + noise applied).
    pub obs_sc: B::Obs,
    /// Snapshot of `obs_sc` before any self-calibration; every round
    /// re-calibrates this baseline state.
    pub obs_sc_init: B::Obs,
    /// Median measured amplitude on the reference long baseline (Jy).
    pub zbl_tot: Jy,
}

/// Apply pre-imaging calibration to a freshly averaged observation.
///
/// The total compact flux is the median amplitude on the AA–AX baseline;
/// when that lookup fails the AA–AP name is tried (the APEX site code
/// changed between the 2017 and 2018 campaigns). A failure on the fallback
/// propagates.
///
/// When the configured target flux differs from the measured total, every
/// baseline shorter than `uv_zblcut` has its visibility and noise fields
/// scaled by `zbl / zbl_tot`, excising the extended flux that should not be
/// imaged. Equal fluxes leave the data untouched.
pub fn calibrate<B: ImagingBackend>(
    backend: &B,
    pset: &ParameterSet,
    obs: B::Obs,
) -> Result<Calibrated<B>, VisweepError> {
    let zbl_tot = match backend.median_baseline_amplitude(&obs, ZBL_STATION, ZBL_PARTNER) {
        Ok(amp) => amp,
        Err(_) => backend.median_baseline_amplitude(&obs, ZBL_STATION, ZBL_PARTNER_ALT)?,
    };

    let obs = backend.flag_unobserved_stations(&obs)?;
    let obs_orig = obs.clone();

    let obs = if pset.row.zbl != zbl_tot {
        debug!(
            "{}: rescaling short baselines by {:.4}",
            pset.outfile,
            pset.row.zbl / zbl_tot
        );
        backend.rescale_short_baselines(&obs, pset.row.zbl / zbl_tot, pset.fixed.uv_zblcut)?
    } else {
        obs
    };

    let obs = backend.reorder_baselines_by_snr(&obs)?;

    let mut obs_sc = obs.clone();
    if pset.reverse_taper > 0.0 {
        obs_sc = backend.reverse_taper(&obs_sc, pset.reverse_taper)?;
    }
    let obs_sc = backend.add_fractional_noise(&obs_sc, pset.row.sys_noise)?;
    let obs_sc_init = obs_sc.clone();

    Ok(Calibrated {
        obs,
        obs_orig,
        obs_sc,
        obs_sc_init,
        zbl_tot,
    })
}
