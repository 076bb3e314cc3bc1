//! # Survey parameter model
//!
//! This module defines the three layers of survey configuration:
//!
//! 1. [`FixedParams`](fixed::FixedParams) – values constant across every run
//!    of a survey (input/output paths, solver tolerances, I/O toggles),
//!    built through a validating fluent builder.
//! 2. [`SweepAxes`](sweep::SweepAxes) / [`ParamTable`](sweep::ParamTable) –
//!    one value list per swept parameter, expanded into the cartesian
//!    product of all lists; each row is tagged with a unique contiguous
//!    index.
//! 3. [`ParameterSet`](param_set::ParameterSet) – one fully-resolved
//!    configuration for a single reconstruction run, merging one swept row
//!    with the fixed parameters and deriving the per-run output basename and
//!    radian-converted angular fields exactly once.
//!
//! Swept and fixed parameters live in disjoint typed namespaces, so a key
//! can never be supplied by both layers at once.

pub mod fixed;
pub mod param_set;
pub mod sweep;

pub use fixed::{FixedParams, FixedParamsBuilder, TransformType};
pub use param_set::ParameterSet;
pub use sweep::{AvgTime, ParamTable, SweepAxes, SweptRow};
