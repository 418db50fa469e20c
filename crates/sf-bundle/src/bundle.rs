//! The packaged output for one timestep.

use ndarray::{Array3, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{PackError, PackResult};

/// Number of layers in every bundle.
pub const LAYER_COUNT: usize = 5;

/// Position of each layer in the stack. The order is part of the file
/// format and must not change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BundleLayer {
    Magnitude = 0,
    FirstComponent = 1,
    SecondComponent = 2,
    XGrid = 3,
    YGrid = 4,
}

impl BundleLayer {
    pub const ALL: [BundleLayer; LAYER_COUNT] = [
        BundleLayer::Magnitude,
        BundleLayer::FirstComponent,
        BundleLayer::SecondComponent,
        BundleLayer::XGrid,
        BundleLayer::YGrid,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BundleLayer::Magnitude => "magnitude",
            BundleLayer::FirstComponent => "component_1",
            BundleLayer::SecondComponent => "component_2",
            BundleLayer::XGrid => "x_grid",
            BundleLayer::YGrid => "y_grid",
        }
    }
}

/// Which point fields fill the three data layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleLayout {
    pub magnitude: String,
    pub first: String,
    pub second: String,
}

impl Default for BundleLayout {
    fn default() -> Self {
        Self {
            magnitude: "velocity_magnitude".to_string(),
            first: "x_vel".to_string(),
            second: "y_vel".to_string(),
        }
    }
}

impl BundleLayout {
    /// Field names in layer order.
    pub fn field_names(&self) -> [&str; 3] {
        [&self.magnitude, &self.first, &self.second]
    }
}

/// File name for a timestep: `timestep_0007.npy`.
pub fn bundle_file_name(timestep: u64) -> String {
    format!("timestep_{:04}.npy", timestep)
}

/// Inverse of [`bundle_file_name`]: only the canonical spelling matches,
/// so `timestep_7.npy` is not a bundle name.
pub fn parse_bundle_file_name(name: &str) -> Option<u64> {
    let digits = name.strip_prefix("timestep_")?.strip_suffix(".npy")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let timestep = digits.parse().ok()?;
    (bundle_file_name(timestep) == name).then_some(timestep)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimestepBundle {
    timestep: u64,
    data: Array3<f64>,
}

impl TimestepBundle {
    /// Wrap an existing `[5, ny, nx]` stack.
    pub fn from_array(timestep: u64, data: Array3<f64>) -> PackResult<Self> {
        let layers = data.dim().0;
        if layers != LAYER_COUNT {
            return Err(PackError::LayerCount {
                expected: LAYER_COUNT,
                actual: layers,
            });
        }
        Ok(Self { timestep, data })
    }

    pub fn timestep(&self) -> u64 {
        self.timestep
    }

    /// `(ny, nx)` of each layer.
    pub fn shape(&self) -> (usize, usize) {
        let (_, ny, nx) = self.data.dim();
        (ny, nx)
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn into_data(self) -> Array3<f64> {
        self.data
    }

    pub fn layer(&self, layer: BundleLayer) -> ArrayView2<'_, f64> {
        self.data.index_axis(Axis(0), layer.index())
    }

    pub fn file_name(&self) -> String {
        bundle_file_name(self.timestep)
    }
}
