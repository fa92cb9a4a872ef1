//! In-memory labeled array collections.
//!
//! A [`Dataset`] is a bag of coordinate variables, data variables and a flat
//! attribute map. Every builder in the crate returns one. Variables are
//! n-dimensional `ndarray` arrays tagged with dimension names, so slicing and
//! dimension swapping work by name rather than by axis number.

use crate::types::{AttrValue, Attrs, SarComplex, SarError, SarResult};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use ndarray::{concatenate, Array, ArrayD, ArrayViewD, Axis, Dimension, Slice};
use num_traits::AsPrimitive;
use std::ops::Range;

/// Typed storage of a variable
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    Int(ArrayD<i64>),
    Float(ArrayD<f64>),
    Float32(ArrayD<f32>),
    Complex(ArrayD<SarComplex>),
    Bool(ArrayD<bool>),
    Time(ArrayD<DateTime<Utc>>),
}

macro_rules! map_values {
    ($values:expr, $arr:ident => $body:expr) => {
        match $values {
            Values::Int($arr) => Values::Int($body),
            Values::Float($arr) => Values::Float($body),
            Values::Float32($arr) => Values::Float32($body),
            Values::Complex($arr) => Values::Complex($body),
            Values::Bool($arr) => Values::Bool($body),
            Values::Time($arr) => Values::Time($body),
        }
    };
}

macro_rules! impl_values_from {
    ($t:ty, $variant:ident) => {
        impl<D: Dimension> From<Array<$t, D>> for Values {
            fn from(arr: Array<$t, D>) -> Self {
                Values::$variant(arr.into_dyn())
            }
        }

        impl From<Vec<$t>> for Values {
            fn from(v: Vec<$t>) -> Self {
                Values::$variant(Array::from_vec(v).into_dyn())
            }
        }
    };
}

impl_values_from!(i64, Int);
impl_values_from!(f64, Float);
impl_values_from!(f32, Float32);
impl_values_from!(SarComplex, Complex);
impl_values_from!(bool, Bool);
impl_values_from!(DateTime<Utc>, Time);

fn concat_same<T: Clone>(axis: usize, arrays: Vec<&ArrayD<T>>) -> SarResult<ArrayD<T>> {
    let views: Vec<ArrayViewD<T>> = arrays.iter().map(|a| a.view()).collect();
    concatenate(Axis(axis), &views)
        .map_err(|e| SarError::Processing(format!("Failed to concatenate arrays: {}", e)))
}

fn concat_variable(
    datasets: &[Dataset],
    dim: &str,
    name: &str,
    variable: &Variable,
    pick: fn(&Dataset) -> &IndexMap<String, Variable>,
) -> SarResult<Variable> {
    let axis = match variable.axis_of(dim) {
        Some(axis) => axis,
        None => return Ok(variable.clone()),
    };
    let mut parts = Vec::with_capacity(datasets.len());
    for ds in datasets {
        let part = pick(ds)
            .get(name)
            .ok_or_else(|| SarError::Processing(format!("variable {:?} missing from a dataset", name)))?;
        parts.push(&part.values);
    }
    Ok(Variable {
        dims: variable.dims.clone(),
        values: Values::concatenate(axis, &parts)?,
        attrs: variable.attrs.clone(),
        encoding: variable.encoding.clone(),
    })
}

impl Values {
    pub fn shape(&self) -> &[usize] {
        match self {
            Values::Int(a) => a.shape(),
            Values::Float(a) => a.shape(),
            Values::Float32(a) => a.shape(),
            Values::Complex(a) => a.shape(),
            Values::Bool(a) => a.shape(),
            Values::Time(a) => a.shape(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    pub fn dtype(&self) -> &'static str {
        match self {
            Values::Int(_) => "int64",
            Values::Float(_) => "float64",
            Values::Float32(_) => "float32",
            Values::Complex(_) => "complex64",
            Values::Bool(_) => "bool",
            Values::Time(_) => "datetime64[ns]",
        }
    }

    /// Owned copy of `range` along `axis`
    pub fn slice_axis(&self, axis: usize, range: Range<usize>) -> Values {
        let slice = Slice::from(range);
        map_values!(self, a => a.slice_axis(Axis(axis), slice).to_owned())
    }

    /// Concatenate values of the same type along `axis`
    pub fn concatenate(axis: usize, parts: &[&Values]) -> SarResult<Values> {
        let first = parts
            .first()
            .ok_or_else(|| SarError::Processing("Nothing to concatenate".to_string()))?;

        macro_rules! collect_variant {
            ($variant:ident) => {{
                let mut arrays = Vec::with_capacity(parts.len());
                for part in parts {
                    match part {
                        Values::$variant(a) => arrays.push(a),
                        other => {
                            return Err(SarError::Processing(format!(
                                "Cannot concatenate {} with {}",
                                first.dtype(),
                                other.dtype()
                            )))
                        }
                    }
                }
                Values::$variant(concat_same(axis, arrays)?)
            }};
        }

        Ok(match first {
            Values::Int(_) => collect_variant!(Int),
            Values::Float(_) => collect_variant!(Float),
            Values::Float32(_) => collect_variant!(Float32),
            Values::Complex(_) => collect_variant!(Complex),
            Values::Bool(_) => collect_variant!(Bool),
            Values::Time(_) => collect_variant!(Time),
        })
    }

    /// Numeric values widened to `f64`; `None` for complex, bool and time data
    pub fn to_f64(&self) -> Option<ArrayD<f64>> {
        fn widen<T: AsPrimitive<f64>>(a: &ArrayD<T>) -> ArrayD<f64> {
            a.mapv(|v| v.as_())
        }
        match self {
            Values::Int(a) => Some(widen(a)),
            Values::Float(a) => Some(a.clone()),
            Values::Float32(a) => Some(widen(a)),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<&ArrayD<DateTime<Utc>>> {
        match self {
            Values::Time(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&ArrayD<i64>> {
        match self {
            Values::Int(a) => Some(a),
            _ => None,
        }
    }
}

/// A named-dimension array with its own attributes and encoding hints
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub dims: Vec<String>,
    pub values: Values,
    pub attrs: Attrs,
    pub encoding: Attrs,
}

impl Variable {
    /// Create a variable, checking that the number of dims matches the data
    pub fn new<S: Into<String>>(
        dims: impl IntoIterator<Item = S>,
        values: impl Into<Values>,
    ) -> SarResult<Self> {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        let values = values.into();
        if dims.len() != values.ndim() {
            return Err(SarError::Processing(format!(
                "dims {:?} do not match data with shape {:?}",
                dims,
                values.shape()
            )));
        }
        Ok(Self {
            dims,
            values,
            attrs: Attrs::new(),
            encoding: Attrs::new(),
        })
    }

    /// One-dimensional variable along `dim`
    pub fn from_vec<T>(dim: &str, values: Vec<T>) -> Self
    where
        Values: From<Vec<T>>,
    {
        Self {
            dims: vec![dim.to_string()],
            values: Values::from(values),
            attrs: Attrs::new(),
            encoding: Attrs::new(),
        }
    }

    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    /// Size along `dim`, if the variable has that dimension
    pub fn len_of(&self, dim: &str) -> Option<usize> {
        self.axis_of(dim).map(|axis| self.shape()[axis])
    }

    fn isel(&self, dim: &str, range: Range<usize>) -> Variable {
        match self.axis_of(dim) {
            Some(axis) => Variable {
                dims: self.dims.clone(),
                values: self.values.slice_axis(axis, range),
                attrs: self.attrs.clone(),
                encoding: self.encoding.clone(),
            },
            None => self.clone(),
        }
    }

    fn rename_dims(&mut self, swaps: &[(&str, &str)]) {
        for dim in self.dims.iter_mut() {
            if let Some((_, new)) = swaps.iter().find(|(old, _)| dim == old) {
                *dim = new.to_string();
            }
        }
    }
}

/// A collection of coordinate and data variables sharing named dimensions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub coords: IndexMap<String, Variable>,
    pub data_vars: IndexMap<String, Variable>,
    pub attrs: Attrs,
}

impl Dataset {
    pub fn new(attrs: Attrs) -> Self {
        Self {
            coords: IndexMap::new(),
            data_vars: IndexMap::new(),
            attrs,
        }
    }

    pub fn add_coord(&mut self, name: &str, variable: Variable) {
        self.coords.insert(name.to_string(), variable);
    }

    pub fn add_data_var(&mut self, name: &str, variable: Variable) {
        self.data_vars.insert(name.to_string(), variable);
    }

    /// Coordinates first, then data variables
    pub fn variables(&self) -> impl Iterator<Item = (&String, &Variable)> {
        self.coords.iter().chain(self.data_vars.iter())
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.coords.get(name).or_else(|| self.data_vars.get(name))
    }

    pub fn variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        match self.coords.get_mut(name) {
            Some(v) => Some(v),
            None => self.data_vars.get_mut(name),
        }
    }

    /// Dimension sizes in order of first appearance
    pub fn dims(&self) -> IndexMap<String, usize> {
        let mut dims = IndexMap::new();
        for (_, variable) in self.variables() {
            for (dim, size) in variable.dims.iter().zip(variable.shape()) {
                dims.entry(dim.clone()).or_insert(*size);
            }
        }
        dims
    }

    /// Check that dimension sizes agree and that every dimension used by a
    /// data variable is labeled by a coordinate.
    pub fn validate(&self) -> SarResult<()> {
        let mut sizes: IndexMap<&str, usize> = IndexMap::new();
        for (name, variable) in self.variables() {
            for (dim, size) in variable.dims.iter().zip(variable.shape()) {
                match sizes.get(dim.as_str()) {
                    Some(known) if known != size => {
                        return Err(SarError::Processing(format!(
                            "variable {:?} has {}={} but the dataset has {}={}",
                            name, dim, size, dim, known
                        )));
                    }
                    _ => {
                        sizes.insert(dim, *size);
                    }
                }
            }
        }
        for (name, variable) in &self.data_vars {
            for dim in &variable.dims {
                if !self.coords.contains_key(dim) {
                    return Err(SarError::Processing(format!(
                        "data variable {:?} uses dimension {:?} with no coordinate",
                        name, dim
                    )));
                }
            }
        }
        Ok(())
    }

    /// Positional selection of `range` along `dim` for every variable
    pub fn isel(&self, dim: &str, range: Range<usize>) -> SarResult<Dataset> {
        let size = *self
            .dims()
            .get(dim)
            .ok_or_else(|| SarError::Processing(format!("dimension {:?} not found", dim)))?;
        if range.start > range.end || range.end > size {
            return Err(SarError::Processing(format!(
                "selection {:?} out of bounds for {}={}",
                range, dim, size
            )));
        }
        Ok(Dataset {
            coords: self
                .coords
                .iter()
                .map(|(k, v)| (k.clone(), v.isel(dim, range.clone())))
                .collect(),
            data_vars: self
                .data_vars
                .iter()
                .map(|(k, v)| (k.clone(), v.isel(dim, range.clone())))
                .collect(),
            attrs: self.attrs.clone(),
        })
    }

    /// Replace dimensions with 1-D coordinates defined along them.
    ///
    /// Each `(old, new)` pair requires a coordinate `new` whose only dimension
    /// is `old`; afterwards every variable indexed by `old` is indexed by `new`.
    pub fn swap_dims(&self, swaps: &[(&str, &str)]) -> SarResult<Dataset> {
        for (old, new) in swaps {
            match self.coords.get(*new) {
                Some(coord) if coord.dims.len() == 1 && coord.dims[0] == *old => {}
                Some(coord) if coord.dims.len() == 1 && coord.dims[0] == *new => {}
                _ => {
                    return Err(SarError::Processing(format!(
                        "replacement dimension {:?} is not a 1D coordinate along {:?}",
                        new, old
                    )))
                }
            }
        }
        let mut ds = self.clone();
        for (_, variable) in ds.coords.iter_mut().chain(ds.data_vars.iter_mut()) {
            variable.rename_dims(swaps);
        }
        Ok(ds)
    }

    /// Concatenate datasets along `dim`; variables without `dim` and the
    /// attributes are taken from the first dataset.
    pub fn concat(datasets: &[Dataset], dim: &str) -> SarResult<Dataset> {
        let first = datasets
            .first()
            .ok_or_else(|| SarError::Processing("Nothing to concatenate".to_string()))?;

        let mut out = Dataset::new(first.attrs.clone());
        for (name, variable) in &first.coords {
            out.coords.insert(name.clone(), concat_variable(datasets, dim, name, variable, |d| &d.coords)?);
        }
        for (name, variable) in &first.data_vars {
            out.data_vars.insert(
                name.clone(),
                concat_variable(datasets, dim, name, variable, |d| &d.data_vars)?,
            );
        }
        Ok(out)
    }

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    pub fn attr_i64(&self, key: &str) -> SarResult<i64> {
        self.attrs
            .get(key)
            .and_then(AttrValue::as_i64)
            .ok_or_else(|| SarError::Metadata(format!("integer attribute {:?} not found", key)))
    }

    pub fn attr_f64(&self, key: &str) -> SarResult<f64> {
        self.attrs
            .get(key)
            .and_then(AttrValue::as_f64)
            .ok_or_else(|| SarError::Metadata(format!("numeric attribute {:?} not found", key)))
    }

    pub fn attr_str(&self, key: &str) -> SarResult<&str> {
        self.attrs
            .get(key)
            .and_then(AttrValue::as_str)
            .ok_or_else(|| SarError::Metadata(format!("string attribute {:?} not found", key)))
    }

    /// Time coordinate or variable as a flat vector
    pub fn times(&self, name: &str) -> SarResult<Vec<DateTime<Utc>>> {
        self.variable(name)
            .and_then(|v| v.values.as_time())
            .map(|a| a.iter().cloned().collect())
            .ok_or_else(|| SarError::Metadata(format!("time variable {:?} not found", name)))
    }

    /// Numeric coordinate or variable widened to `f64`
    pub fn floats(&self, name: &str) -> SarResult<ArrayD<f64>> {
        self.variable(name)
            .and_then(|v| v.values.to_f64())
            .ok_or_else(|| SarError::Metadata(format!("numeric variable {:?} not found", name)))
    }
}
