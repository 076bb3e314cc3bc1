//! Pure mapping from a resolved parameter set to the optimizer's active
//! term weights and the per-station systematic noise floor.
//!
//! A weight of exactly `0.0` is the inactive sentinel: the term is left out
//! of the returned map entirely, so the optimizer never sees it. The
//! diagnostic closure variants replace the standard closure terms only when
//! `diag_closure` is set *and* their own gate weights are nonzero; the
//! weight carried into the optimizer is the standard `cphase`/`logcamp`
//! value in either case.

use std::collections::HashMap;

use crate::constants::{SefdBudget, StationCode};
use crate::imaging::{DataTerm, RegTerm, TermWeights};
use crate::params::ParameterSet;

/// Select the active data-fidelity terms for one run.
pub fn data_terms(pset: &ParameterSet) -> TermWeights<DataTerm> {
    let row = &pset.row;
    let mut terms = TermWeights::new();

    if row.vis != 0.0 {
        terms.insert(DataTerm::Vis, row.vis);
    }
    if row.amp != 0.0 {
        terms.insert(DataTerm::Amp, row.amp);
    }
    if row.diag_closure {
        if row.logcamp_diag != 0.0 {
            terms.insert(DataTerm::LogCAmpDiag, row.logcamp);
        }
        if row.cphase_diag != 0.0 {
            terms.insert(DataTerm::CPhaseDiag, row.cphase);
        }
    } else {
        if row.logcamp != 0.0 {
            terms.insert(DataTerm::LogCAmp, row.logcamp);
        }
        if row.cphase != 0.0 {
            terms.insert(DataTerm::CPhase, row.cphase);
        }
    }

    terms
}

/// Select the active regularizer terms for one run.
pub fn reg_terms(pset: &ParameterSet) -> TermWeights<RegTerm> {
    let row = &pset.row;
    let mut terms = TermWeights::new();

    if row.simple != 0.0 {
        terms.insert(RegTerm::Simple, row.simple);
    }
    if row.tv2 != 0.0 {
        terms.insert(RegTerm::Tv2, row.tv2);
    }
    if row.tv != 0.0 {
        terms.insert(RegTerm::Tv, row.tv);
    }
    if row.l1 != 0.0 {
        terms.insert(RegTerm::L1, row.l1);
    }
    if row.flux != 0.0 {
        terms.insert(RegTerm::Flux, row.flux);
    }
    if row.rgauss != 0.0 {
        terms.insert(RegTerm::RGauss, row.rgauss);
    }

    terms
}

/// Per-station systematic noise floor derived from the SEFD error budget.
///
/// Each fractional SEFD error `e` maps to `((1 + e)^0.5 - 1) * 0.25`,
/// rescaling the a-priori amplitude calibration error so final results
/// respect the stated budget.
pub fn systematic_noise_floor(budget: &SefdBudget) -> HashMap<StationCode, f64> {
    budget
        .iter()
        .map(|(station, err)| (station.clone(), ((1.0 + err).sqrt() - 1.0) * 0.25))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{FixedParams, SweepAxes};
    use approx::assert_relative_eq;

    fn pset_with(edit: impl FnOnce(&mut crate::params::SweptRow)) -> ParameterSet {
        let fixed = FixedParams::builder("in.uvfits", "run", "out")
            .build()
            .unwrap();
        let mut row = SweepAxes::default().build_table().unwrap().rows()[0].clone();
        edit(&mut row);
        ParameterSet::new(&row, &fixed)
    }

    #[test]
    fn zero_weights_are_left_out() {
        let pset = pset_with(|row| {
            row.vis = 0.0;
            row.amp = 0.2;
            row.cphase = 1.0;
            row.logcamp = 0.0;
        });
        let terms = data_terms(&pset);
        assert_eq!(terms.get(&DataTerm::Amp), Some(&0.2));
        assert_eq!(terms.get(&DataTerm::CPhase), Some(&1.0));
        assert!(!terms.contains_key(&DataTerm::Vis));
        assert!(!terms.contains_key(&DataTerm::LogCAmp));
    }

    #[test]
    fn diagnostic_closure_replaces_standard_terms() {
        let pset = pset_with(|row| {
            row.diag_closure = true;
            row.cphase = 1.5;
            row.logcamp = 2.0;
            row.cphase_diag = 1.0;
            row.logcamp_diag = 1.0;
        });
        let terms = data_terms(&pset);
        // diagnostic keys carry the standard weights
        assert_eq!(terms.get(&DataTerm::CPhaseDiag), Some(&1.5));
        assert_eq!(terms.get(&DataTerm::LogCAmpDiag), Some(&2.0));
        assert!(!terms.contains_key(&DataTerm::CPhase));
        assert!(!terms.contains_key(&DataTerm::LogCAmp));
    }

    #[test]
    fn diagnostic_gates_must_be_nonzero() {
        let pset = pset_with(|row| {
            row.diag_closure = true;
            row.cphase_diag = 0.0;
            row.logcamp_diag = 0.0;
        });
        let terms = data_terms(&pset);
        assert!(!terms.contains_key(&DataTerm::CPhaseDiag));
        assert!(!terms.contains_key(&DataTerm::LogCAmpDiag));
        // standard terms are not re-enabled either
        assert!(!terms.contains_key(&DataTerm::CPhase));
        assert!(!terms.contains_key(&DataTerm::LogCAmp));
    }

    #[test]
    fn reg_terms_follow_the_same_sentinel() {
        let pset = pset_with(|row| {
            row.simple = 1.0;
            row.tv = 0.0;
            row.tv2 = 0.7;
            row.l1 = 0.0;
            row.flux = 2.0;
            row.rgauss = 0.0;
        });
        let terms = reg_terms(&pset);
        assert_eq!(terms.len(), 3);
        assert_eq!(terms.get(&RegTerm::Simple), Some(&1.0));
        assert_eq!(terms.get(&RegTerm::Tv2), Some(&0.7));
        assert_eq!(terms.get(&RegTerm::Flux), Some(&2.0));
    }

    #[test]
    fn noise_floor_formula() {
        let budget: SefdBudget = [("AA".to_string(), 0.1), ("LM".to_string(), 0.0)]
            .into_iter()
            .collect();
        let floor = systematic_noise_floor(&budget);
        assert_relative_eq!(floor["AA"], ((1.1f64).sqrt() - 1.0) * 0.25);
        assert_relative_eq!(floor["LM"], 0.0);
    }
}
