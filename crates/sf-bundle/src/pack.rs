//! Snapshot + derived fields -> `TimestepBundle`.

use ndarray::{Array2, Array3, Axis};
use sf_core::Centering;
use sf_grid::{DerivedFields, GridSnapshot};

use crate::bundle::{BundleLayer, BundleLayout, LAYER_COUNT, TimestepBundle};
use crate::error::{PackError, PackResult};

/// Assembles the fixed `[magnitude, c1, c2, x, y]` stack for one timestep.
///
/// All three data layers must be point fields, found either on the
/// snapshot itself or among the derived fields. Anything missing is a
/// `PackError`; nothing is zero-filled.
#[derive(Debug, Clone, Default)]
pub struct TimestepSeriesPacker {
    layout: BundleLayout,
}

impl TimestepSeriesPacker {
    pub fn new(layout: BundleLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &BundleLayout {
        &self.layout
    }

    pub fn pack(
        &self,
        snapshot: &GridSnapshot,
        derived: &DerivedFields,
        timestep: u64,
    ) -> PackResult<TimestepBundle> {
        let shape = (snapshot.ny(), snapshot.nx());
        let data_layers = [
            BundleLayer::Magnitude,
            BundleLayer::FirstComponent,
            BundleLayer::SecondComponent,
        ];

        let mut data = Array3::zeros((LAYER_COUNT, shape.0, shape.1));
        for (layer, name) in data_layers.into_iter().zip(self.layout.field_names()) {
            let field = lookup(snapshot, derived, name, timestep)?;
            if field.dim() != shape {
                return Err(PackError::ShapeMismatch {
                    name: name.to_string(),
                    rows: shape.0,
                    cols: shape.1,
                    actual_rows: field.nrows(),
                    actual_cols: field.ncols(),
                });
            }
            data.index_axis_mut(Axis(0), layer.index()).assign(field);
        }
        data.index_axis_mut(Axis(0), BundleLayer::XGrid.index())
            .assign(&snapshot.x_grid());
        data.index_axis_mut(Axis(0), BundleLayer::YGrid.index())
            .assign(&snapshot.y_grid());

        TimestepBundle::from_array(timestep, data)
    }
}

fn lookup<'a>(
    snapshot: &'a GridSnapshot,
    derived: &'a DerivedFields,
    name: &str,
    timestep: u64,
) -> PackResult<&'a Array2<f64>> {
    snapshot
        .field(Centering::Point, name)
        .or_else(|| derived.get(Centering::Point, name))
        .ok_or_else(|| PackError::MissingField {
            name: name.to_string(),
            centering: Centering::Point,
            timestep,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::Axis as GridAxis;
    use sf_grid::{CoordinateAxis, DerivedFieldComputer, FieldMap};

    fn snapshot(nx: usize, ny: usize, points: &[(&str, f64)]) -> GridSnapshot {
        let x = CoordinateAxis::new(GridAxis::X, (0..nx).map(|i| i as f64).collect()).unwrap();
        let y = CoordinateAxis::new(GridAxis::Y, (0..ny).map(|j| 10.0 + j as f64).collect())
            .unwrap();
        let mut fields = FieldMap::new();
        for (name, value) in points {
            fields.insert(name.to_string(), Array2::from_elem((ny, nx), *value));
        }
        GridSnapshot::new(x, y, fields, FieldMap::new()).unwrap()
    }

    #[test]
    fn packs_constant_velocity() {
        let snap = snapshot(4, 3, &[("x_vel", 3.0), ("y_vel", 4.0)]);
        let derived = DerivedFieldComputer::default().compute(&snap);
        let bundle = TimestepSeriesPacker::default()
            .pack(&snap, &derived, 20)
            .unwrap();

        assert_eq!(bundle.data().dim(), (5, 3, 4));
        assert_eq!(bundle.timestep(), 20);
        assert!(bundle.layer(BundleLayer::Magnitude).iter().all(|&v| v == 5.0));
        assert!(bundle.layer(BundleLayer::FirstComponent).iter().all(|&v| v == 3.0));
        assert!(bundle.layer(BundleLayer::SecondComponent).iter().all(|&v| v == 4.0));

        let x = bundle.layer(BundleLayer::XGrid);
        let y = bundle.layer(BundleLayer::YGrid);
        assert_eq!(x.row(2).to_vec(), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(y.column(3).to_vec(), vec![10.0, 11.0, 12.0]);
    }

    #[test]
    fn missing_component_is_pack_error() {
        let snap = snapshot(4, 3, &[("x_vel", 3.0)]);
        let derived = DerivedFieldComputer::default().compute(&snap);
        assert!(derived.is_empty());

        let err = TimestepSeriesPacker::default()
            .pack(&snap, &derived, 7)
            .unwrap_err();
        assert_eq!(
            err,
            PackError::MissingField {
                name: "velocity_magnitude".to_string(),
                centering: Centering::Point,
                timestep: 7,
            }
        );
    }

    #[test]
    fn custom_layout_reads_snapshot_fields() {
        let snap = snapshot(2, 2, &[("speed", 1.0), ("u", 0.6), ("v", 0.8)]);
        let packer = TimestepSeriesPacker::new(BundleLayout {
            magnitude: "speed".to_string(),
            first: "u".to_string(),
            second: "v".to_string(),
        });
        let bundle = packer.pack(&snap, &DerivedFields::default(), 0).unwrap();
        assert!(bundle.layer(BundleLayer::FirstComponent).iter().all(|&v| v == 0.6));
    }
}
