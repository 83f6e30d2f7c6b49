//! Initial tractions on the fault, read from a spatial database.
use crate::error::FaultError;
use crate::field::{names, VertexField};
use crate::orientation::OrientationFrame;
use crate::topology::FaultTopology;
use nalgebra::DVector;
use rupture_traits::{Real, SpatialDatabase};
use rustc_hash::FxHashMap;

/// Names of the traction values queried from the database, in fault coordinates.
pub fn traction_value_names(space_dim: usize) -> Result<&'static [&'static str], FaultError> {
    match space_dim {
        1 => Ok(&["traction-normal"]),
        2 => Ok(&["traction-shear", "traction-normal"]),
        3 => Ok(&[
            "traction-shear-leftlateral",
            "traction-shear-updip",
            "traction-normal",
        ]),
        dim => Err(FaultError::Dimension { dim }),
    }
}

/// A spatial database with the same values everywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformSpatialDatabase<T> {
    label: String,
    values: FxHashMap<String, T>,
}

impl<T: Real> UniformSpatialDatabase<T> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            values: FxHashMap::default(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: T) -> Self {
        self.values.insert(name.into(), value);
        self
    }
}

impl<T: Real> SpatialDatabase<T> for UniformSpatialDatabase<T> {
    fn label(&self) -> &str {
        &self.label
    }

    fn query(&self, value_names: &[&str], _coordinates: &[T]) -> Option<DVector<T>> {
        let values: Option<Vec<T>> = value_names
            .iter()
            .map(|name| self.values.get(*name).copied())
            .collect();
        values.map(DVector::from_vec)
    }
}

/// Query the initial traction at every fault vertex and rotate it to global coordinates.
pub fn query_initial_tractions<T: Real>(
    database: &dyn SpatialDatabase<T>,
    topology: &FaultTopology<T>,
    orientations: &[OrientationFrame<T>],
) -> Result<VertexField<T>, FaultError> {
    let dim = topology.space_dim();
    let value_names = traction_value_names(dim)?;
    let coordinates = topology.coordinates();
    let mut tractions = VertexField::zeros(names::INITIAL_TRACTION, topology.num_vertices(), dim);
    for (v, frame) in orientations.iter().enumerate() {
        let x: Vec<T> = coordinates.get(v, dim).iter().copied().collect();
        let local = database
            .query(value_names, &x)
            .filter(|values| values.len() == dim)
            .ok_or_else(|| FaultError::DataLookup {
                database: database.label().to_string(),
                coordinates: x.iter().map(|&x_i| nalgebra::try_convert::<T, f64>(x_i).unwrap_or(f64::NAN)).collect(),
            })?;
        tractions.set(v, &frame.to_global(&local));
    }
    Ok(tractions)
}
