//! Swept-parameter axes and the survey parameter table.
//!
//! A survey varies a handful of reconstruction parameters over value lists;
//! [`SweepAxes`] holds one list per swept parameter and
//! [`SweepAxes::build_table`] expands them into a [`ParamTable`] — the
//! cartesian product of every list, one [`SweptRow`] per combination, each
//! row tagged with a unique contiguous index assigned in insertion order.
//! The table is immutable once built.
//!
//! A data/regularizer weight of exactly `0.0` (or `diag_closure = false`)
//! is the defined "inactive" sentinel: the corresponding term is left out
//! of the optimizer entirely (see [`crate::imaging::weights`]).

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use serde::{Serialize, Serializer};

use crate::constants::{Jy, MicroArcSec, RunIndex};
use crate::visweep_errors::VisweepError;

/// Coherent time-averaging window applied after loading the dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AvgTime {
    /// Average over each detected scan (continuous observation interval).
    Scan,
    /// Average over a fixed window, in seconds.
    Seconds(f64),
}

impl fmt::Display for AvgTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvgTime::Scan => f.write_str("scan"),
            AvgTime::Seconds(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for AvgTime {
    type Err = VisweepError;

    /// Parse the literal token `"scan"` or a non-negative duration in seconds.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("scan") {
            return Ok(AvgTime::Scan);
        }
        match s.parse::<f64>() {
            Ok(v) if v >= 0.0 => Ok(AvgTime::Seconds(v)),
            _ => Err(VisweepError::InvalidAvgTime(s.to_string())),
        }
    }
}

impl Serialize for AvgTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One fully-expanded combination of swept parameters.
///
/// Rows are produced by [`SweepAxes::build_table`]; `i` is unique and
/// contiguous from 0 within a table, and is the sole ingredient of the
/// per-run output basename, so concurrent runs never collide on paths.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweptRow {
    /// Row index within the table (0..N-1, insertion order).
    pub i: RunIndex,

    /// Target compact flux density (Jy).
    pub zbl: Jy,
    /// Fractional systematic noise added to the working observation.
    pub sys_noise: f64,
    /// Coherent averaging window.
    pub avg_time: AvgTime,
    /// FWHM of the circular Gaussian prior (µas).
    pub prior_fwhm_uas: MicroArcSec,

    /// Number of phase-only self-calibration rounds.
    pub sc_phase: usize,
    /// Data-weight boost applied on the first phase-only round.
    pub xdw_phase: f64,
    /// Number of amplitude+phase self-calibration rounds.
    pub sc_ap: usize,
    /// Data-weight boost for amplitude+phase rounds (see the reconstruction
    /// loop for the trip-count coupling it inherits).
    pub xdw_ap: f64,

    /// Complex visibility data weight.
    pub vis: f64,
    /// Visibility amplitude data weight.
    pub amp: f64,
    /// Closure phase data weight.
    pub cphase: f64,
    /// Log closure amplitude data weight.
    pub logcamp: f64,
    /// Select the diagnostic closure terms instead of the standard ones.
    pub diag_closure: bool,
    /// Gate for the diagnostic closure-phase term.
    pub cphase_diag: f64,
    /// Gate for the diagnostic log-closure-amplitude term.
    pub logcamp_diag: f64,

    /// Relative entropy against the prior image.
    pub simple: f64,
    /// Sparsity (l1 norm).
    pub l1: f64,
    /// Total variation.
    pub tv: f64,
    /// Total squared variation.
    pub tv2: f64,
    /// Total flux density constraint.
    pub flux: f64,
    /// Compact Gaussian component regularizer.
    pub rgauss: f64,
    /// Epsilon used inside the total-variation definition.
    pub epsilon_tv: f64,
}

/// Value lists for every swept parameter.
///
/// The defaults produce a single-row example table; real surveys override
/// the axes of interest:
///
/// ```rust
/// use visweep::params::{AvgTime, SweepAxes};
///
/// let table = SweepAxes {
///     zbl: vec![0.5, 0.6],
///     sys_noise: vec![0.0, 0.02, 0.05],
///     avg_time: vec![AvgTime::Scan, AvgTime::Seconds(60.0)],
///     ..SweepAxes::default()
/// }
/// .build_table()
/// .unwrap();
/// assert_eq!(table.len(), 12);
/// ```
#[derive(Debug, Clone)]
pub struct SweepAxes {
    pub zbl: Vec<Jy>,
    pub sys_noise: Vec<f64>,
    pub avg_time: Vec<AvgTime>,
    pub prior_fwhm_uas: Vec<MicroArcSec>,
    pub sc_phase: Vec<usize>,
    pub xdw_phase: Vec<f64>,
    pub sc_ap: Vec<usize>,
    pub xdw_ap: Vec<f64>,
    pub vis: Vec<f64>,
    pub amp: Vec<f64>,
    pub cphase: Vec<f64>,
    pub logcamp: Vec<f64>,
    pub diag_closure: Vec<bool>,
    pub cphase_diag: Vec<f64>,
    pub logcamp_diag: Vec<f64>,
    pub simple: Vec<f64>,
    pub l1: Vec<f64>,
    pub tv: Vec<f64>,
    pub tv2: Vec<f64>,
    pub flux: Vec<f64>,
    pub rgauss: Vec<f64>,
    pub epsilon_tv: Vec<f64>,
}

impl Default for SweepAxes {
    fn default() -> Self {
        SweepAxes {
            zbl: vec![0.6],
            sys_noise: vec![0.02],
            avg_time: vec![AvgTime::Scan],
            prior_fwhm_uas: vec![40.0],
            sc_phase: vec![2],
            xdw_phase: vec![10.0],
            sc_ap: vec![2],
            xdw_ap: vec![1.0],
            vis: vec![0.0],
            amp: vec![0.2],
            cphase: vec![1.0],
            logcamp: vec![1.0],
            diag_closure: vec![false],
            cphase_diag: vec![0.0],
            logcamp_diag: vec![0.0],
            simple: vec![1.0],
            l1: vec![1.0],
            tv: vec![1.0],
            tv2: vec![1.0],
            flux: vec![1.0],
            rgauss: vec![0.0],
            epsilon_tv: vec![1.0e-10],
        }
    }
}

impl SweepAxes {
    /// Expand the axes into a [`ParamTable`].
    ///
    /// The table has one row per element of the cartesian product of every
    /// axis, so its length is the product of the axis lengths. Row indices
    /// are assigned in enumeration order, 0..N-1.
    ///
    /// Returns
    /// -----------------
    /// * `Ok(ParamTable)` on success.
    /// * `Err(VisweepError::EmptySweepAxis)` if any axis has no values.
    pub fn build_table(&self) -> Result<ParamTable, VisweepError> {
        self.check_non_empty()?;

        let lens = [
            self.zbl.len(),
            self.sys_noise.len(),
            self.avg_time.len(),
            self.prior_fwhm_uas.len(),
            self.sc_phase.len(),
            self.xdw_phase.len(),
            self.sc_ap.len(),
            self.xdw_ap.len(),
            self.vis.len(),
            self.amp.len(),
            self.cphase.len(),
            self.logcamp.len(),
            self.diag_closure.len(),
            self.cphase_diag.len(),
            self.logcamp_diag.len(),
            self.simple.len(),
            self.l1.len(),
            self.tv.len(),
            self.tv2.len(),
            self.flux.len(),
            self.rgauss.len(),
            self.epsilon_tv.len(),
        ];

        let rows = lens
            .iter()
            .map(|&n| 0..n)
            .multi_cartesian_product()
            .enumerate()
            .map(|(i, idx)| SweptRow {
                i,
                zbl: self.zbl[idx[0]],
                sys_noise: self.sys_noise[idx[1]],
                avg_time: self.avg_time[idx[2]],
                prior_fwhm_uas: self.prior_fwhm_uas[idx[3]],
                sc_phase: self.sc_phase[idx[4]],
                xdw_phase: self.xdw_phase[idx[5]],
                sc_ap: self.sc_ap[idx[6]],
                xdw_ap: self.xdw_ap[idx[7]],
                vis: self.vis[idx[8]],
                amp: self.amp[idx[9]],
                cphase: self.cphase[idx[10]],
                logcamp: self.logcamp[idx[11]],
                diag_closure: self.diag_closure[idx[12]],
                cphase_diag: self.cphase_diag[idx[13]],
                logcamp_diag: self.logcamp_diag[idx[14]],
                simple: self.simple[idx[15]],
                l1: self.l1[idx[16]],
                tv: self.tv[idx[17]],
                tv2: self.tv2[idx[18]],
                flux: self.flux[idx[19]],
                rgauss: self.rgauss[idx[20]],
                epsilon_tv: self.epsilon_tv[idx[21]],
            })
            .collect();

        Ok(ParamTable { rows })
    }

    fn check_non_empty(&self) -> Result<(), VisweepError> {
        let axes: [(&'static str, usize); 22] = [
            ("zbl", self.zbl.len()),
            ("sys_noise", self.sys_noise.len()),
            ("avg_time", self.avg_time.len()),
            ("prior_fwhm_uas", self.prior_fwhm_uas.len()),
            ("sc_phase", self.sc_phase.len()),
            ("xdw_phase", self.xdw_phase.len()),
            ("sc_ap", self.sc_ap.len()),
            ("xdw_ap", self.xdw_ap.len()),
            ("vis", self.vis.len()),
            ("amp", self.amp.len()),
            ("cphase", self.cphase.len()),
            ("logcamp", self.logcamp.len()),
            ("diag_closure", self.diag_closure.len()),
            ("cphase_diag", self.cphase_diag.len()),
            ("logcamp_diag", self.logcamp_diag.len()),
            ("simple", self.simple.len()),
            ("l1", self.l1.len()),
            ("tv", self.tv.len()),
            ("tv2", self.tv2.len()),
            ("flux", self.flux.len()),
            ("rgauss", self.rgauss.len()),
            ("epsilon_tv", self.epsilon_tv.len()),
        ];
        for (name, len) in axes {
            if len == 0 {
                return Err(VisweepError::EmptySweepAxis(name));
            }
        }
        Ok(())
    }
}

/// The immutable survey parameter table: one row per reconstruction run.
#[derive(Debug, Clone)]
pub struct ParamTable {
    rows: Vec<SweptRow>,
}

impl ParamTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[SweptRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SweptRow> {
        self.rows.iter()
    }
}
