//! Built-in compilation passes, grouped by pipeline stage.

mod euler;
pub mod layout;
pub mod optimization;
pub mod routing;
pub mod scheduling;
pub mod translation;

pub use layout::{DenseLayout, SabreLayout, SetLayout, TrivialLayout};
pub use optimization::{
    CancelInverseGates, CommutativeCancellation, Optimize1qGates, ResynthesizeTwoQubitRuns,
};
pub use routing::{BasicRouting, CheckMap, FinalPermutation, MappedStatus, SabreRouting, StochasticRouting};
pub use scheduling::{AlapSchedule, AsapSchedule, Schedule};
pub use translation::{BasisTranslation, Decompose3q};
