//! Image pipeline: decode/resize/encode glue, the approximation model,
//! and the shape optimizer consumed by the run engine.

pub mod canvas;
pub mod error;
pub mod model;
pub mod optimizer;
pub mod shapes;

pub use error::PipelineError;
pub use model::Model;
pub use optimizer::{HillClimbOptimizer, ShapeOptimizer};
