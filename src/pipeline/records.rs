//! Per-run CSV records: statistics and the parameter record that doubles
//! as the resume-completion marker.

use std::path::Path;

use serde::Serialize;

use crate::constants::{Jy, MicroArcSec, Radian, RunIndex};
use crate::params::sweep::AvgTime;
use crate::params::ParameterSet;
use crate::pipeline::stats::StatsRecord;
use crate::visweep_errors::VisweepError;

/// The parameter record persisted for one completed run.
///
/// Carries the full swept row plus two derived values: the radian-converted
/// field of view actually used and the measured total compact flux. The
/// file's presence is the resume guard's completion signal, so this record
/// is written last.
#[derive(Debug, Clone, Serialize)]
pub struct ParamsRecord {
    pub i: RunIndex,
    pub zbl: Jy,
    pub sys_noise: f64,
    pub avg_time: AvgTime,
    pub prior_fwhm_uas: MicroArcSec,
    pub sc_phase: usize,
    pub xdw_phase: f64,
    pub sc_ap: usize,
    pub xdw_ap: f64,
    pub vis: f64,
    pub amp: f64,
    pub cphase: f64,
    pub logcamp: f64,
    pub diag_closure: bool,
    pub cphase_diag: f64,
    pub logcamp_diag: f64,
    pub simple: f64,
    pub l1: f64,
    pub tv: f64,
    pub tv2: f64,
    pub flux: f64,
    pub rgauss: f64,
    pub epsilon_tv: f64,
    /// Field of view used for imaging (radians).
    pub fov: Radian,
    /// Measured total compact flux on the reference baseline (Jy).
    pub zbl_tot: Jy,
}

impl ParamsRecord {
    pub fn new(pset: &ParameterSet, zbl_tot: Jy) -> Self {
        let row = &pset.row;
        ParamsRecord {
            i: row.i,
            zbl: row.zbl,
            sys_noise: row.sys_noise,
            avg_time: row.avg_time,
            prior_fwhm_uas: row.prior_fwhm_uas,
            sc_phase: row.sc_phase,
            xdw_phase: row.xdw_phase,
            sc_ap: row.sc_ap,
            xdw_ap: row.xdw_ap,
            vis: row.vis,
            amp: row.amp,
            cphase: row.cphase,
            logcamp: row.logcamp,
            diag_closure: row.diag_closure,
            cphase_diag: row.cphase_diag,
            logcamp_diag: row.logcamp_diag,
            simple: row.simple,
            l1: row.l1,
            tv: row.tv,
            tv2: row.tv2,
            flux: row.flux,
            rgauss: row.rgauss,
            epsilon_tv: row.epsilon_tv,
            fov: pset.fov,
            zbl_tot,
        }
    }
}

/// Write the single-record statistics file for one run.
pub fn write_stats(path: &Path, record: &StatsRecord) -> Result<(), VisweepError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.serialize(record)?;
    writer.flush()?;
    Ok(())
}

/// Write the parameter record — the completion marker — for one run.
pub fn write_params(path: &Path, pset: &ParameterSet, zbl_tot: Jy) -> Result<(), VisweepError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.serialize(ParamsRecord::new(pset, zbl_tot))?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{FixedParams, SweepAxes};

    #[test]
    fn params_record_is_written_with_headers() {
        let dir = tempfile::tempdir().unwrap();
        let fixed = FixedParams::builder("in.uvfits", "run", dir.path())
            .build()
            .unwrap();
        let row = SweepAxes::default().build_table().unwrap().rows()[0].clone();
        let pset = ParameterSet::new(&row, &fixed);

        let path = pset.params_path();
        write_params(&path, &pset, 0.87).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        let header = lines.next().unwrap();
        let values = lines.next().unwrap();
        assert!(header.starts_with("i,zbl,sys_noise,avg_time"));
        assert!(header.ends_with("fov,zbl_tot"));
        assert!(values.starts_with("0,0.6,0.02,scan"));
        assert!(values.ends_with("0.87"));
    }

    #[test]
    fn stats_record_serializes_absent_nxcorr_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        let record = StatsRecord {
            i: 0,
            nxcorr: None,
            chi2_cp_ref: 1.0,
            chi2_lc_ref: 1.1,
            chi2_vis_ref: 1.2,
            chi2_vis_sub: 0.9,
            chi2_cp_sys: 1.3,
            chi2_lc_sys: 1.4,
            chi2_vis_sys: 1.5,
        };
        write_stats(&path, &record).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "i,nxcorr,chi2_cp_ref,chi2_lc_ref,chi2_vis_ref,chi2_vis_sub,chi2_cp_sys,chi2_lc_sys,chi2_vis_sys"
        );
        assert_eq!(lines.next().unwrap(), "0,,1.0,1.1,1.2,0.9,1.3,1.4,1.5");
    }
}
