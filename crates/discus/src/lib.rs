//! Monte Carlo multiple scattering corrections
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod config;
mod detector;
mod diagnostics;
mod error;
mod results;
mod simulator;
mod tracer;

#[doc(inline)]
pub use crate::simulator::{GridBuilder, InterpolationPolicy, MultipleScatteringSimulator};

#[doc(inline)]
pub use crate::config::{
    EnergyMode, SimulationConfig, SimulationConfigBuilder, SparseOptions, MAX_SCATTER_ORDER,
};

#[doc(inline)]
pub use crate::tracer::{update_track_direction, PathTracer, QSampler, ScatterResult};

#[doc(inline)]
pub use crate::detector::Detector;

#[doc(inline)]
pub use crate::diagnostics::Diagnostics;

#[doc(inline)]
pub use crate::results::{ResultGroup, Workspace};

#[doc(inline)]
pub use crate::error::{Error, Result};
