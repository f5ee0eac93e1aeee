pub mod access;
pub mod areas;
pub mod cell;
pub mod config;
pub mod density;
pub mod frontier;
pub mod grid;
pub mod land;
pub mod neighbors;
pub mod scenario;
pub mod spatial;
pub mod span;

pub use cell::{CellClass, Frontier};
pub use config::{LandConfig, LandConfigError};
pub use grid::{Affine, Cell, Grid, GridError};
pub use land::{ConfigurationError, Land, RunError, RunSummary, StepMetrics, StepOutcome};
