//! Reconstruction with iterative self-calibration — the central control
//! loop of a run.
//!
//! Three phases: a static imaging pass that always executes, then (when
//! self-calibration is enabled) `sc_phase` phase-only rounds followed by
//! `sc_ap` amplitude+phase rounds. Every round blurs the previous
//! reconstruction to the observation's nominal resolution and uses it as
//! the next seed. Optimizer non-convergence is not specially detected; the
//! loops always run their configured counts.

use std::collections::HashMap;

use log::debug;

use crate::constants::StationCode;
use crate::imaging::{
    weights, DataTerm, ImagerSettings, ImagingBackend, RegTerm, SelfcalMethod, SelfcalOptions,
    TermWeights,
};
use crate::params::ParameterSet;
use crate::pipeline::calibrate::Calibrated;
use crate::visweep_errors::VisweepError;

/// Final image plus the calibration table of the last amplitude+phase
/// round.
///
/// `caltab` is `Some` only if at least one amplitude+phase round ran;
/// callers must handle the absent case explicitly.
pub struct Reconstruction<B: ImagingBackend> {
    pub image: B::Image,
    pub caltab: Option<B::CalTable>,
}

fn settings<'a>(
    pset: &'a ParameterSet,
    data_term: &'a TermWeights<DataTerm>,
    reg_term: &'a TermWeights<RegTerm>,
    systematic_noise: &'a HashMap<StationCode, f64>,
) -> ImagerSettings<'a> {
    ImagerSettings {
        data_term,
        reg_term,
        flux: pset.row.zbl,
        maxit: pset.fixed.maxit,
        stop: pset.fixed.stop,
        systematic_noise,
        ttype: pset.fixed.ttype,
        cp_uv_min: pset.fixed.uv_zblcut,
        niter: pset.fixed.niter_static,
        blur_frac: pset.fixed.blurfrac,
    }
}

fn boost_weights(terms: &mut TermWeights<DataTerm>, factor: f64) {
    for weight in terms.values_mut() {
        *weight *= factor;
    }
}

/// Run the optimizer and the self-calibration rounds for one parameter set.
///
/// Phase-only rounds self-calibrate `obs_sc_init` against each new image
/// with a zero solution interval (aligning phases across bands), producing
/// the next working observation. Amplitude+phase rounds instead solve a
/// calibration table against `obs_sc_init` and apply it (nearest
/// interpolation, extrapolating) to produce the next working observation;
/// the last table is returned.
///
/// The `xdw_phase` boost multiplies every active data weight once, on the
/// first phase-only round. The `xdw_ap` boost is keyed off the phase loop's
/// trip count, not the amplitude loop's own index: it fires only when zero
/// phase-only rounds ran, and then on every amplitude+phase round. That
/// coupling is inherited behavior relied upon by existing surveys and is
/// covered by tests; do not "fix" it without revalidating survey outputs.
pub fn reconstruct<B: ImagingBackend>(
    backend: &B,
    pset: &ParameterSet,
    cal: &Calibrated<B>,
    prior: &B::Image,
) -> Result<Reconstruction<B>, VisweepError> {
    let mut data_term = weights::data_terms(pset);
    let reg_term = weights::reg_terms(pset);
    let systematic_noise = weights::systematic_noise_floor(&pset.fixed.sefd_error_budget);

    let res = backend.nominal_resolution(&cal.obs)?;

    // Phase 0: static imaging from the prior, always.
    let mut image = backend.reconstruct(
        &cal.obs_sc,
        prior,
        prior,
        &settings(pset, &data_term, &reg_term, &systematic_noise),
    )?;

    let mut caltab = None;

    if pset.fixed.selfcal {
        let mut obs_sc = cal.obs_sc.clone();

        let mut phase_rounds = 0usize;
        while phase_rounds < pset.row.sc_phase {
            let init = backend.blur_image(&image, res)?;

            if phase_rounds == 0 {
                boost_weights(&mut data_term, pset.row.xdw_phase);
            }

            image = backend.reconstruct(
                &obs_sc,
                &init,
                prior,
                &settings(pset, &data_term, &reg_term, &systematic_noise),
            )?;

            obs_sc = backend.self_calibrate(
                &cal.obs_sc_init,
                &image,
                SelfcalMethod::Phase,
                &SelfcalOptions {
                    solution_interval: Some(0.0),
                    ..SelfcalOptions::new(pset.fixed.ttype)
                },
            )?;

            phase_rounds += 1;
        }
        debug!("{}: {} phase-only rounds done", pset.outfile, phase_rounds);

        let mut ap_rounds = 0usize;
        while ap_rounds < pset.row.sc_ap {
            let init = backend.blur_image(&image, res)?;

            // Keyed off the phase loop's trip count (see function docs).
            if phase_rounds == 0 {
                boost_weights(&mut data_term, pset.row.xdw_ap);
            }

            image = backend.reconstruct(
                &obs_sc,
                &init,
                prior,
                &settings(pset, &data_term, &reg_term, &systematic_noise),
            )?;

            let table = backend.self_calibrate_table(
                &cal.obs_sc_init,
                &image,
                &SelfcalOptions {
                    gain_tol: Some(pset.fixed.gaintol),
                    ..SelfcalOptions::new(pset.fixed.ttype)
                },
            )?;
            obs_sc = backend.apply_caltable(&table, &cal.obs_sc_init)?;
            caltab = Some(table);

            ap_rounds += 1;
        }
        debug!("{}: {} amp+phase rounds done", pset.outfile, ap_rounds);
    }

    Ok(Reconstruction { image, caltab })
}
