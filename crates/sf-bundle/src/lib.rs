//! sf-bundle: fixed-layout per-timestep bundles.
//!
//! A bundle is a `[5, ny, nx]` stack of `f64` layers in the order
//! `[magnitude, component_1, component_2, x_grid, y_grid]`, stored one file
//! per timestep as `timestep_NNNN.npy`.

pub mod bundle;
pub mod error;
pub mod npy;
pub mod pack;
pub mod store;

pub use bundle::{
    BundleLayer, BundleLayout, LAYER_COUNT, TimestepBundle, bundle_file_name, parse_bundle_file_name,
};
pub use error::{BundleError, BundleResult, NpyError, NpyResult, PackError, PackResult};
pub use pack::TimestepSeriesPacker;
pub use store::BundleStore;
