//! sf-core: shared foundation for snapflow.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - centering (point vs. cell attachment and the shapes it implies)
//! - error (validation errors shared by every pipeline stage)
//! - validate (axis and shape checks)
//! - timing (stage stopwatch)

pub mod centering;
pub mod error;
pub mod numeric;
pub mod timing;
pub mod validate;

pub use centering::Centering;
pub use error::{Axis, ValidationError, ValidationResult};
pub use numeric::*;
pub use timing::StageTimer;
pub use validate::{check_axis, check_shape};
