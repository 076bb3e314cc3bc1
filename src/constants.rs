//! # Constants and type definitions for visweep
//!
//! This module centralizes the **unit conversions** and **common type
//! definitions** used throughout the `visweep` library.
//!
//! ## Overview
//!
//! - Angular unit conversion (microarcseconds ↔ radians)
//! - Core type aliases used across the crate
//! - The fixed comparison grid used for ground-truth cross-correlation
//!
//! These definitions are used by the parameter model, the pipeline stages,
//! and the survey driver.

use std::collections::HashMap;

// -------------------------------------------------------------------------------------------------
// Unit conversions
// -------------------------------------------------------------------------------------------------

/// Microarcseconds → radians
pub const RADPERUAS: f64 = std::f64::consts::PI / (180.0 * 3600.0 * 1.0e6);

/// Field of view of the fixed grid used for ground-truth image comparison (µas)
pub const NXCORR_FOV_UAS: f64 = 200.0;

/// Pixel count per side of the fixed ground-truth comparison grid
pub const NXCORR_NPIX: usize = 256;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Flux density in Jansky
pub type Jy = f64;
/// Angle in radians
pub type Radian = f64;
/// Angle in microarcseconds
pub type MicroArcSec = f64;
/// Baseline length (uv-distance) in wavelengths
pub type Lambda = f64;
/// Two-letter station code identifying an array element (e.g. `"AA"`)
pub type StationCode = String;

/// Fractional SEFD calibration error per station, used to derive the
/// per-station systematic noise floor during reconstruction.
pub type SefdBudget = HashMap<StationCode, f64>;

/// Zero-based index of one row in a survey parameter table
pub type RunIndex = usize;
