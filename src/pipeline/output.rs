//! Output stage: flux restoration and artifact persistence.

use log::warn;

use crate::imaging::{ImagingBackend, SelfcalMethod, SelfcalOptions};
use crate::params::ParameterSet;
use crate::pipeline::calibrate::Calibrated;
use crate::pipeline::reconstruct::Reconstruction;
use crate::visweep_errors::VisweepError;

/// Flux-restored image and the matching self-calibrated observation, kept
/// for the statistics stage.
pub struct OutputProducts<B: ImagingBackend> {
    /// Final image with the large-scale Gaussian component restoring the
    /// flux removed by the short-baseline rescale.
    pub im_addcmp: B::Image,
    /// Original calibrated observation, amplitude+phase self-calibrated to
    /// the restored image.
    pub obs_sc_addcmp: B::Obs,
}

/// Persist every requested artifact for one run.
///
/// The restored-flux image is compared against the *unrescaled* original
/// observation, so the final products are consistent with the measured
/// data. If a reverse taper was applied during calibration, the saved image
/// is blurred back by the taper FWHM first. Artifacts whose toggle is off
/// are silently absent — no placeholder is written. A requested calibration
/// table that does not exist (no amplitude+phase round ran) logs a warning
/// and writes nothing.
pub fn write_outputs<B: ImagingBackend>(
    backend: &B,
    pset: &ParameterSet,
    cal: &Calibrated<B>,
    rec: &Reconstruction<B>,
) -> Result<OutputProducts<B>, VisweepError> {
    let im_addcmp = backend.restore_extended_flux(&rec.image, &cal.obs_orig, pset.fixed.uv_zblcut)?;
    let obs_sc_addcmp = backend.self_calibrate(
        &cal.obs_orig,
        &im_addcmp,
        SelfcalMethod::Both,
        &SelfcalOptions::new(pset.fixed.ttype),
    )?;

    let im_final = if pset.reverse_taper > 0.0 {
        backend.blur_image(&rec.image, pset.reverse_taper)?
    } else {
        rec.image.clone()
    };
    backend.save_image(&im_final, &pset.fits_path())?;

    if pset.fixed.save_caltab {
        match &rec.caltab {
            Some(table) => backend.save_caltable(table, &cal.obs_sc_init, &pset.caltab_dir())?,
            None => warn!(
                "{}: calibration table requested but no amp+phase round ran",
                pset.outfile
            ),
        }
    }

    if pset.fixed.save_uvfits {
        backend.save_visibilities(&obs_sc_addcmp, &pset.uvfits_path())?;
    }

    if pset.fixed.save_pdf {
        backend.render_image(&im_final, &pset.pdf_path())?;
    }

    if pset.fixed.save_imgsums {
        backend.render_summary(
            &im_addcmp,
            &obs_sc_addcmp,
            &cal.obs_orig,
            &pset.imgsum_path(),
            pset.fixed.uv_zblcut,
        )?;
    }

    Ok(OutputProducts {
        im_addcmp,
        obs_sc_addcmp,
    })
}
