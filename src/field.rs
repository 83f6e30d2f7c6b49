//! Per-vertex vector fields and a store of named fields.
use crate::error::FaultError;
use nalgebra::{DVector, DVectorView, DVectorViewMut};
use rupture_traits::Real;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;

/// Names of the fields read and written by the fault.
pub mod names {
    /// Displacement (and Lagrange multiplier) at the start of the time step.
    pub const DISP: &str = "disp(t)";
    /// Increment of the solution over the time step.
    pub const DISP_INCR: &str = "dispIncr(t->t+dt)";
    pub const VELOCITY: &str = "velocity(t)";
    pub const RESIDUAL: &str = "residual";
    /// Adjustment to the solution increment computed by the lumped variant.
    pub const DISP_INCR_ADJUST: &str = "dispIncr adjust";

    pub const RELATIVE_DISP: &str = "relative disp";
    pub const RELATIVE_VELOCITY: &str = "relative velocity";
    pub const AREA: &str = "area";
    pub const INITIAL_TRACTION: &str = "initial traction";
    pub const SENSITIVITY_RELATIVE_DISP: &str = "sensitivity relative disp";
    pub const SENSITIVITY_DLAGRANGE: &str = "sensitivity dLagrange";
}

/// A vector quantity of fixed width stored for each vertex.
///
/// Values are stored contiguously, so that vertex `i` occupies entries
/// `i * width .. (i + 1) * width`.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexField<T: Real> {
    label: String,
    width: usize,
    values: DVector<T>,
}

impl<T: Real> VertexField<T> {
    pub fn zeros(label: impl Into<String>, num_vertices: usize, width: usize) -> Self {
        Self {
            label: label.into(),
            width,
            values: DVector::zeros(num_vertices * width),
        }
    }

    /// Construct a field from the concatenated values of all vertices.
    ///
    /// # Panics
    ///
    /// Panics if the number of values is not divisible by the width.
    pub fn from_values(label: impl Into<String>, width: usize, values: DVector<T>) -> Self {
        assert!(width > 0, "Field width must be positive");
        assert_eq!(values.len() % width, 0, "Number of values must be divisible by width");
        Self {
            label: label.into(),
            width,
            values,
        }
    }

    /// Construct a field from the values of each vertex.
    ///
    /// # Panics
    ///
    /// Panics if the vertex values do not all have the given width.
    pub fn from_vertex_values<'a>(
        label: impl Into<String>,
        width: usize,
        vertex_values: impl IntoIterator<Item = &'a DVector<T>>,
    ) -> Self {
        let mut values = Vec::new();
        for value in vertex_values {
            assert_eq!(value.len(), width, "Vertex value must have the width of the field");
            values.extend(value.iter().copied());
        }
        Self::from_values(label, width, DVector::from_vec(values))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn num_vertices(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.values.len() / self.width
        }
    }

    pub fn values(&self) -> &DVector<T> {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut DVector<T> {
        &mut self.values
    }

    /// Read the value at a vertex, asserting that the caller expects the width of the field.
    pub fn get(&self, vertex: usize, width: usize) -> DVectorView<T> {
        assert_eq!(
            width, self.width,
            "Access width {} does not match width {} of field '{}'",
            width, self.width, self.label
        );
        self.vertex(vertex)
    }

    pub fn vertex(&self, vertex: usize) -> DVectorView<T> {
        self.values.rows(vertex * self.width, self.width)
    }

    pub fn vertex_mut(&mut self, vertex: usize) -> DVectorViewMut<T> {
        self.values.rows_mut(vertex * self.width, self.width)
    }

    /// Overwrite the value at a vertex.
    pub fn set(&mut self, vertex: usize, value: &DVector<T>) {
        assert_eq!(value.len(), self.width, "Value width does not match field '{}'", self.label);
        self.vertex_mut(vertex).copy_from(value);
    }

    /// Add to the value at a vertex.
    pub fn add(&mut self, vertex: usize, value: &DVector<T>) {
        assert_eq!(value.len(), self.width, "Value width does not match field '{}'", self.label);
        let mut target = self.vertex_mut(vertex);
        target += value;
    }

    pub fn fill_zero(&mut self) {
        self.values.fill(T::zero());
    }
}

/// Named fields, keyed by their label.
#[derive(Debug, Clone)]
pub struct FieldStore<T: Real> {
    fields: FxHashMap<String, VertexField<T>>,
}

impl<T: Real> Default for FieldStore<T> {
    fn default() -> Self {
        Self {
            fields: FxHashMap::default(),
        }
    }
}

impl<T: Real> FieldStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a zero-initialized field, replacing any field with the same name.
    pub fn add(&mut self, name: &str, num_vertices: usize, width: usize) -> &mut VertexField<T> {
        self.insert(VertexField::zeros(name, num_vertices, width))
    }

    /// Insert the field under its label, replacing any field with the same name.
    pub fn insert(&mut self, field: VertexField<T>) -> &mut VertexField<T> {
        match self.fields.entry(field.label().to_string()) {
            Entry::Occupied(mut entry) => {
                entry.insert(field);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(field),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&VertexField<T>, FaultError> {
        self.fields
            .get(name)
            .ok_or_else(|| FaultError::configuration(format!("Unknown field '{}'.", name)))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut VertexField<T>, FaultError> {
        self.fields
            .get_mut(name)
            .ok_or_else(|| FaultError::configuration(format!("Unknown field '{}'.", name)))
    }

    /// Look up a field that must hold values of the given width for at least `num_vertices`
    /// vertices.
    pub fn get_sized(&self, name: &str, num_vertices: usize, width: usize) -> Result<&VertexField<T>, FaultError> {
        let field = self.get(name)?;
        check_size(field, num_vertices, width)?;
        Ok(field)
    }

    pub fn get_sized_mut(
        &mut self,
        name: &str,
        num_vertices: usize,
        width: usize,
    ) -> Result<&mut VertexField<T>, FaultError> {
        let field = self.get_mut(name)?;
        check_size(field, num_vertices, width)?;
        Ok(field)
    }

    pub fn remove(&mut self, name: &str) -> Option<VertexField<T>> {
        self.fields.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// Check that a field covers `num_vertices` vertices with values of the given width.
pub fn check_size<T: Real>(field: &VertexField<T>, num_vertices: usize, width: usize) -> Result<(), FaultError> {
    if field.width() != width {
        return Err(FaultError::configuration(format!(
            "Field '{}' has width {}, expected {}.",
            field.label(),
            field.width(),
            width
        )));
    }
    if field.num_vertices() < num_vertices {
        return Err(FaultError::configuration(format!(
            "Field '{}' has values for {} vertices, expected at least {}.",
            field.label(),
            field.num_vertices(),
            num_vertices
        )));
    }
    Ok(())
}
