//! sf-grid: rectilinear grid snapshots.
//!
//! Provides:
//! - `GridSnapshot` with point- and cell-centred field maps
//! - a legacy VTK `RECTILINEAR_GRID` decoder (ASCII and BINARY)
//! - `GridSnapshotReader`, the single file -> snapshot path
//! - `DerivedFieldComputer` with pluggable derivation rules

pub mod derive;
pub mod error;
pub mod reader;
pub mod snapshot;
pub mod vtk;

pub use derive::{
    Derivation, DerivationRule, DerivedFieldComputer, DerivedFields, FieldView, FirstAvailable,
    Resolution, SourceSelector, VectorMagnitude,
};
pub use error::{DecodeError, DecodeResult};
pub use reader::{GridSnapshotReader, ReaderConfig};
pub use snapshot::{CoordinateAxis, FieldMap, GridSnapshot};
