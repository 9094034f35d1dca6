//! Text preparation and sentence scoring.

pub mod mask;
pub mod model;
pub mod sentences;
pub mod train;
