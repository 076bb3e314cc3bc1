//! Shared test fixtures: a scripted [`ImagingBackend`] over a small
//! synthetic visibility model.
//!
//! The mock records every backend invocation (with the arguments the
//! pipeline is contractually required to pass) and implements honest
//! arithmetic for the few operations whose data effects the survey logic
//! depends on: median baseline amplitude, station flagging, and
//! short-baseline rescaling. Everything numerical returns deterministic
//! placeholder values.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use visweep::imaging::{
    ChisqKind, ChisqOptions, DataTerm, GaussComponent, ImagerSettings, ImagingBackend,
    SelfcalMethod, SelfcalOptions,
};
use visweep::params::AvgTime;
use visweep::visweep_errors::VisweepError;

/// One synthetic visibility sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthVis {
    pub t1: &'static str,
    pub t2: &'static str,
    pub u: f64,
    pub v: f64,
    pub re: f64,
    pub im: f64,
    pub sigma: f64,
}

impl SynthVis {
    pub fn uvdist(&self) -> f64 {
        (self.u * self.u + self.v * self.v).sqrt()
    }

    pub fn amp(&self) -> f64 {
        (self.re * self.re + self.im * self.im).sqrt()
    }

    fn on_baseline(&self, a: &str, b: &str) -> bool {
        (self.t1 == a && self.t2 == b) || (self.t1 == b && self.t2 == a)
    }
}

/// Synthetic observation: a station list and a sample table.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthObs {
    pub stations: Vec<&'static str>,
    pub samples: Vec<SynthVis>,
}

/// Synthetic image: enough structure to track what the pipeline did to it.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthImage {
    pub npixels: usize,
    pub fov: f64,
    pub flux: f64,
    pub blurred_by: f64,
}

/// Opaque synthetic calibration table.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthCal;

/// Record of one backend invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    LoadVisibilities(PathBuf),
    AverageCoherent(AvgTime),
    MedianBaselineAmplitude(String, String),
    FlagUnobservedStations,
    RescaleShortBaselines { factor: f64, uv_max: f64 },
    ReorderBaselines,
    ReverseTaper(f64),
    AddFractionalNoise(f64),
    NominalResolution,
    BlankImage { npixels: usize, fov: f64 },
    AddGaussian { flux: f64 },
    BlurImage(f64),
    RestoreExtendedFlux { uv_max: f64 },
    Reconstruct { data_term: Vec<(DataTerm, f64)> },
    SelfCalibrate {
        method: SelfcalMethod,
        solution_interval: Option<f64>,
    },
    SelfCalibrateTable { gain_tol: Option<(f64, f64)> },
    ApplyCalTable,
    ChiSquared(ChisqKind),
    LoadImage(PathBuf),
    CrossCorrelation,
    SaveImage(PathBuf),
    SaveVisibilities(PathBuf),
    SaveCaltable(PathBuf),
    RenderImage(PathBuf),
    RenderSummary(PathBuf),
}

/// A four-station array with three samples on the short AA–AX reference
/// baseline (median amplitude exactly 0.6 Jy) and four long baselines well
/// beyond the default `0.1e9` λ short-baseline cut.
pub fn four_station_obs() -> SynthObs {
    let short = |re: f64| SynthVis {
        t1: "AA",
        t2: "AX",
        u: 1.0e6,
        v: 0.0,
        re,
        im: 0.0,
        sigma: 0.01,
    };
    SynthObs {
        stations: vec!["AA", "AX", "LM", "PV"],
        samples: vec![
            short(0.55),
            short(0.6),
            short(0.65),
            SynthVis {
                t1: "AA",
                t2: "LM",
                u: 2.0e9,
                v: 1.0e9,
                re: 0.2,
                im: 0.05,
                sigma: 0.02,
            },
            SynthVis {
                t1: "AA",
                t2: "PV",
                u: 1.5e9,
                v: -0.5e9,
                re: 0.15,
                im: -0.02,
                sigma: 0.02,
            },
            SynthVis {
                t1: "AX",
                t2: "LM",
                u: 2.0e9,
                v: 0.9e9,
                re: 0.19,
                im: 0.04,
                sigma: 0.02,
            },
            SynthVis {
                t1: "LM",
                t2: "PV",
                u: 0.8e9,
                v: 0.7e9,
                re: 0.3,
                im: 0.1,
                sigma: 0.015,
            },
        ],
    }
}

/// Same array, but the reference baseline only exists under the 2017 APEX
/// site code (AP instead of AX).
pub fn obs_with_legacy_apex_code() -> SynthObs {
    let mut obs = four_station_obs();
    obs.stations = vec!["AA", "AP", "LM", "PV"];
    for sample in &mut obs.samples {
        if sample.t2 == "AX" {
            sample.t2 = "AP";
        }
        if sample.t1 == "AX" {
            sample.t1 = "AP";
        }
    }
    obs
}

/// Scripted backend over a [`SynthObs`].
pub struct MockBackend {
    obs: SynthObs,
    calls: Mutex<Vec<Call>>,
    fail_load: bool,
}

impl MockBackend {
    pub fn new(obs: SynthObs) -> Self {
        MockBackend {
            obs,
            calls: Mutex::new(Vec::new()),
            fail_load: false,
        }
    }

    pub fn four_station() -> Self {
        Self::new(four_station_obs())
    }

    /// A backend whose load stage always fails, for failure-isolation tests.
    pub fn failing() -> Self {
        MockBackend {
            obs: four_station_obs(),
            calls: Mutex::new(Vec::new()),
            fail_load: true,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    /// Data-term weight vectors, one per optimizer invocation, in call order.
    pub fn reconstruct_weights(&self) -> Vec<Vec<(DataTerm, f64)>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Reconstruct { data_term } => Some(data_term),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

impl ImagingBackend for MockBackend {
    type Obs = SynthObs;
    type Image = SynthImage;
    type CalTable = SynthCal;

    fn load_visibilities(&self, path: &Path) -> Result<SynthObs, VisweepError> {
        self.record(Call::LoadVisibilities(path.to_path_buf()));
        if self.fail_load {
            return Err(VisweepError::imaging("synthetic load failure"));
        }
        Ok(self.obs.clone())
    }

    fn average_coherent(&self, obs: &SynthObs, avg: AvgTime) -> Result<SynthObs, VisweepError> {
        self.record(Call::AverageCoherent(avg));
        Ok(obs.clone())
    }

    fn median_baseline_amplitude(
        &self,
        obs: &SynthObs,
        station_a: &str,
        station_b: &str,
    ) -> Result<f64, VisweepError> {
        self.record(Call::MedianBaselineAmplitude(
            station_a.to_string(),
            station_b.to_string(),
        ));
        let amps: Vec<f64> = obs
            .samples
            .iter()
            .filter(|s| s.on_baseline(station_a, station_b))
            .map(|s| s.amp())
            .collect();
        if amps.is_empty() {
            return Err(VisweepError::BaselineNotFound {
                station_a: station_a.to_string(),
                station_b: station_b.to_string(),
            });
        }
        Ok(median(amps))
    }

    fn flag_unobserved_stations(&self, obs: &SynthObs) -> Result<SynthObs, VisweepError> {
        self.record(Call::FlagUnobservedStations);
        let mut flagged = obs.clone();
        flagged
            .stations
            .retain(|st| obs.samples.iter().any(|s| s.t1 == *st || s.t2 == *st));
        Ok(flagged)
    }

    fn rescale_short_baselines(
        &self,
        obs: &SynthObs,
        factor: f64,
        uv_max: f64,
    ) -> Result<SynthObs, VisweepError> {
        self.record(Call::RescaleShortBaselines { factor, uv_max });
        let mut rescaled = obs.clone();
        for sample in &mut rescaled.samples {
            if sample.uvdist() < uv_max {
                sample.re *= factor;
                sample.im *= factor;
                sample.sigma *= factor;
            }
        }
        Ok(rescaled)
    }

    fn reorder_baselines_by_snr(&self, obs: &SynthObs) -> Result<SynthObs, VisweepError> {
        self.record(Call::ReorderBaselines);
        Ok(obs.clone())
    }

    fn reverse_taper(&self, obs: &SynthObs, fwhm: f64) -> Result<SynthObs, VisweepError> {
        self.record(Call::ReverseTaper(fwhm));
        Ok(obs.clone())
    }

    fn add_fractional_noise(&self, obs: &SynthObs, frac: f64) -> Result<SynthObs, VisweepError> {
        self.record(Call::AddFractionalNoise(frac));
        let mut noisy = obs.clone();
        for sample in &mut noisy.samples {
            sample.sigma += frac * sample.amp();
        }
        Ok(noisy)
    }

    fn nominal_resolution(&self, obs: &SynthObs) -> Result<f64, VisweepError> {
        self.record(Call::NominalResolution);
        let longest = obs
            .samples
            .iter()
            .map(|s| s.uvdist())
            .fold(0.0f64, f64::max);
        Ok(1.0 / longest)
    }

    fn blank_image(
        &self,
        _obs: &SynthObs,
        npixels: usize,
        fov: f64,
    ) -> Result<SynthImage, VisweepError> {
        self.record(Call::BlankImage { npixels, fov });
        Ok(SynthImage {
            npixels,
            fov,
            flux: 0.0,
            blurred_by: 0.0,
        })
    }

    fn add_gaussian(
        &self,
        image: &SynthImage,
        flux: f64,
        _component: &GaussComponent,
    ) -> Result<SynthImage, VisweepError> {
        self.record(Call::AddGaussian { flux });
        let mut out = image.clone();
        out.flux += flux;
        Ok(out)
    }

    fn blur_image(&self, image: &SynthImage, fwhm: f64) -> Result<SynthImage, VisweepError> {
        self.record(Call::BlurImage(fwhm));
        let mut out = image.clone();
        out.blurred_by = fwhm;
        Ok(out)
    }

    fn restore_extended_flux(
        &self,
        image: &SynthImage,
        _obs: &SynthObs,
        uv_max: f64,
    ) -> Result<SynthImage, VisweepError> {
        self.record(Call::RestoreExtendedFlux { uv_max });
        Ok(image.clone())
    }

    fn reconstruct(
        &self,
        _obs: &SynthObs,
        init: &SynthImage,
        _prior: &SynthImage,
        settings: &ImagerSettings<'_>,
    ) -> Result<SynthImage, VisweepError> {
        self.record(Call::Reconstruct {
            data_term: settings.data_term.iter().map(|(k, v)| (*k, *v)).collect(),
        });
        Ok(SynthImage {
            npixels: init.npixels,
            fov: init.fov,
            flux: settings.flux,
            blurred_by: 0.0,
        })
    }

    fn self_calibrate(
        &self,
        obs: &SynthObs,
        _image: &SynthImage,
        method: SelfcalMethod,
        opts: &SelfcalOptions,
    ) -> Result<SynthObs, VisweepError> {
        self.record(Call::SelfCalibrate {
            method,
            solution_interval: opts.solution_interval,
        });
        Ok(obs.clone())
    }

    fn self_calibrate_table(
        &self,
        _obs: &SynthObs,
        _image: &SynthImage,
        opts: &SelfcalOptions,
    ) -> Result<SynthCal, VisweepError> {
        self.record(Call::SelfCalibrateTable {
            gain_tol: opts.gain_tol,
        });
        Ok(SynthCal)
    }

    fn apply_caltable(&self, _table: &SynthCal, obs: &SynthObs) -> Result<SynthObs, VisweepError> {
        self.record(Call::ApplyCalTable);
        Ok(obs.clone())
    }

    fn chi_squared(
        &self,
        _obs: &SynthObs,
        _image: &SynthImage,
        kind: ChisqKind,
        _opts: &ChisqOptions,
    ) -> Result<f64, VisweepError> {
        self.record(Call::ChiSquared(kind));
        Ok(match kind {
            ChisqKind::Vis => 1.1,
            ChisqKind::CPhase => 1.2,
            ChisqKind::LogCAmp => 1.3,
        })
    }

    fn load_image(&self, path: &Path) -> Result<SynthImage, VisweepError> {
        self.record(Call::LoadImage(path.to_path_buf()));
        Ok(SynthImage {
            npixels: 256,
            fov: 1.0e-9,
            flux: 0.6,
            blurred_by: 0.0,
        })
    }

    fn cross_correlation(
        &self,
        _truth: &SynthImage,
        _image: &SynthImage,
        _fov: f64,
        _psize: f64,
    ) -> Result<f64, VisweepError> {
        self.record(Call::CrossCorrelation);
        Ok(0.93)
    }

    fn save_image(&self, _image: &SynthImage, path: &Path) -> Result<(), VisweepError> {
        self.record(Call::SaveImage(path.to_path_buf()));
        std::fs::write(path, b"synthetic fits")?;
        Ok(())
    }

    fn save_visibilities(&self, _obs: &SynthObs, path: &Path) -> Result<(), VisweepError> {
        self.record(Call::SaveVisibilities(path.to_path_buf()));
        std::fs::write(path, b"synthetic uvfits")?;
        Ok(())
    }

    fn save_caltable(
        &self,
        _table: &SynthCal,
        _obs: &SynthObs,
        dir: &Path,
    ) -> Result<(), VisweepError> {
        self.record(Call::SaveCaltable(dir.to_path_buf()));
        std::fs::create_dir_all(dir)?;
        std::fs::write(dir.join("caltable.txt"), b"synthetic caltable")?;
        Ok(())
    }

    fn render_image(&self, _image: &SynthImage, path: &Path) -> Result<(), VisweepError> {
        self.record(Call::RenderImage(path.to_path_buf()));
        std::fs::write(path, b"synthetic pdf")?;
        Ok(())
    }

    fn render_summary(
        &self,
        _image: &SynthImage,
        _obs_selfcal: &SynthObs,
        _obs_reference: &SynthObs,
        path: &Path,
        _cp_uv_min: f64,
    ) -> Result<(), VisweepError> {
        self.record(Call::RenderSummary(path.to_path_buf()));
        std::fs::write(path, b"synthetic imgsum")?;
        Ok(())
    }
}
