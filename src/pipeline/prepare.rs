//! Dataset loading and prior-image construction.

use crate::imaging::{GaussComponent, ImagingBackend};
use crate::params::ParameterSet;
use crate::visweep_errors::VisweepError;

/// Flux ratio of the faint secondary prior component.
const SEED_COMPONENT_RATIO: f64 = 1.0e-3;

/// Load the input visibility dataset and coherently average it.
///
/// Scan boundaries are detected by the backend; averaging is per detected
/// scan or over the configured fixed window. Load and parsing errors
/// propagate unchanged — they are neither caught nor retried.
pub fn load_data<B: ImagingBackend>(
    backend: &B,
    pset: &ParameterSet,
) -> Result<B::Obs, VisweepError> {
    let obs = backend.load_visibilities(&pset.fixed.infile)?;
    backend.average_coherent(&obs, pset.row.avg_time)
}

/// Build the Gaussian prior/seed image.
///
/// A blank square image over the configured field of view receives a
/// circular Gaussian of total flux `zbl` and the configured FWHM, plus a
/// second Gaussian at 1/1000 of the flux, offset by one FWHM.
/// The faint component exists purely to avoid a flat-gradient singularity
/// at the optimizer's first step.
pub fn build_prior<B: ImagingBackend>(
    backend: &B,
    pset: &ParameterSet,
    obs: &B::Obs,
) -> Result<B::Image, VisweepError> {
    let empty = backend.blank_image(obs, pset.fixed.npixels, pset.fov)?;
    let main = backend.add_gaussian(
        &empty,
        pset.row.zbl,
        &GaussComponent::circular(pset.prior_fwhm),
    )?;
    backend.add_gaussian(
        &main,
        pset.row.zbl * SEED_COMPONENT_RATIO,
        &GaussComponent {
            fwhm_maj: pset.prior_fwhm,
            fwhm_min: pset.prior_fwhm,
            position_angle: 0.0,
            x_offset: pset.prior_fwhm,
            y_offset: pset.prior_fwhm,
        },
    )
}
