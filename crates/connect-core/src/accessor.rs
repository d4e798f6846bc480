//! Array and scalar data accessors for shared-container exchange.
//!
//! Any array of rank N is carried as a flat buffer, an offset into it and a
//! lengths vector of N entries. The size is the product of the lengths, so a
//! scalar is the degenerate case of rank 0 with no lengths and a size of 1,
//! its value sitting at `offset` in the buffer.

use crate::value::{Value, ValueType};

/// Size of a scalar seen as an array.
pub const ARRAY_SIZE_OF_SCALAR: usize = 1;

/// Rank of a scalar seen as an array.
pub const ARRAY_RANK_OF_SCALAR: usize = 0;

/// Lengths vector of a scalar seen as an array.
pub const ARRAY_LENGTHS_OF_SCALAR: [usize; 0] = [];

/// Access to data stored as a flat buffer with offset and lengths.
pub trait ArrayDataAccessor<T> {
    /// Replace the stored data.
    fn set_array_data(&mut self, data: Vec<T>, offset: usize, lengths: Vec<usize>);

    /// Get the whole flat buffer, if any data is stored.
    fn array_data(&self) -> Option<&[T]>;

    fn has_array_data(&self) -> bool {
        self.array_data().is_some()
    }

    /// Get the index of the first element inside the flat buffer.
    fn array_offset(&self) -> usize;

    fn array_lengths(&self) -> &[usize];

    /// Get the number of elements, the product of the lengths.
    ///
    /// Saturates at `usize::MAX` when the product overflows.
    fn array_size(&self) -> usize {
        self.checked_array_size().unwrap_or(usize::MAX)
    }

    /// Get the number of elements, `None` when the product overflows.
    fn checked_array_size(&self) -> Option<usize> {
        checked_product(self.array_lengths())
    }

    /// Get the number of dimensions.
    fn array_rank(&self) -> usize {
        self.array_lengths().len()
    }
}

/// Access to a boolean scalar.
pub trait BoolScalarDataAccessor {
    fn set_bool_scalar_data(&mut self, value: bool);
    fn bool_scalar_data(&self) -> Option<bool>;
    fn has_bool_scalar_data(&self) -> bool {
        self.bool_scalar_data().is_some()
    }
}

/// Access to a 64-bit float scalar.
pub trait Float64ScalarDataAccessor {
    fn set_float64_scalar_data(&mut self, value: f64);
    fn float64_scalar_data(&self) -> Option<f64>;
    fn has_float64_scalar_data(&self) -> bool {
        self.float64_scalar_data().is_some()
    }
}

/// Access to a string scalar.
pub trait StringScalarDataAccessor {
    fn set_string_scalar_data(&mut self, value: String);
    fn string_scalar_data(&self) -> Option<&str>;
    fn has_string_scalar_data(&self) -> bool {
        self.string_scalar_data().is_some()
    }
}

/// Multiply `lengths`, `None` on overflow. Any zero length makes the
/// product zero.
fn checked_product(lengths: &[usize]) -> Option<usize> {
    if lengths.contains(&0) {
        return Some(0);
    }
    lengths
        .iter()
        .try_fold(1usize, |size, length| size.checked_mul(*length))
}

/// A flat buffer with offset and lengths.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayDataContainer<T> {
    data: Option<Vec<T>>,
    offset: usize,
    lengths: Vec<usize>,
}

impl<T> ArrayDataContainer<T> {
    /// Create a container holding no data. Its shape is that of a scalar.
    pub fn new() -> Self {
        Self {
            data: None,
            offset: 0,
            lengths: ARRAY_LENGTHS_OF_SCALAR.to_vec(),
        }
    }

    /// Create a container holding a single scalar.
    pub fn scalar(value: T) -> Self {
        Self {
            data: Some(vec![value]),
            offset: 0,
            lengths: ARRAY_LENGTHS_OF_SCALAR.to_vec(),
        }
    }

    /// Create a container holding an array.
    pub fn array(data: Vec<T>, lengths: Vec<usize>) -> Self {
        Self {
            data: Some(data),
            offset: 0,
            lengths,
        }
    }

    /// Get the element at `offset`, the scalar value for rank-0 data.
    pub fn scalar_ref(&self) -> Option<&T> {
        self.data.as_ref().and_then(|data| data.get(self.offset))
    }

    /// Get the `size` elements starting at `offset`.
    ///
    /// Returns `None` when the range does not fit the buffer or overflows.
    pub fn elements(&self) -> Option<&[T]> {
        let data = self.data.as_ref()?;
        let end = self.offset.checked_add(self.checked_array_size()?)?;
        data.get(self.offset..end)
    }

    fn set_scalar(&mut self, value: T) {
        self.data = Some(vec![value]);
        self.offset = 0;
        self.lengths = ARRAY_LENGTHS_OF_SCALAR.to_vec();
    }
}

impl<T> Default for ArrayDataContainer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ArrayDataAccessor<T> for ArrayDataContainer<T> {
    fn set_array_data(&mut self, data: Vec<T>, offset: usize, lengths: Vec<usize>) {
        self.data = Some(data);
        self.offset = offset;
        self.lengths = lengths;
    }

    fn array_data(&self) -> Option<&[T]> {
        self.data.as_deref()
    }

    fn array_offset(&self) -> usize {
        self.offset
    }

    fn array_lengths(&self) -> &[usize] {
        &self.lengths
    }
}

impl BoolScalarDataAccessor for ArrayDataContainer<bool> {
    fn set_bool_scalar_data(&mut self, value: bool) {
        self.set_scalar(value);
    }

    fn bool_scalar_data(&self) -> Option<bool> {
        self.scalar_ref().copied()
    }
}

impl Float64ScalarDataAccessor for ArrayDataContainer<f64> {
    fn set_float64_scalar_data(&mut self, value: f64) {
        self.set_scalar(value);
    }

    fn float64_scalar_data(&self) -> Option<f64> {
        self.scalar_ref().copied()
    }
}

impl StringScalarDataAccessor for ArrayDataContainer<String> {
    fn set_string_scalar_data(&mut self, value: String) {
        self.set_scalar(value);
    }

    fn string_scalar_data(&self) -> Option<&str> {
        self.scalar_ref().map(String::as_str)
    }
}

/// A data container of one of the exchangeable element types.
#[derive(Debug, Clone, PartialEq)]
pub enum DataContainer {
    Bool(ArrayDataContainer<bool>),
    Int64(ArrayDataContainer<i64>),
    Float64(ArrayDataContainer<f64>),
    Text(ArrayDataContainer<String>),
}

impl DataContainer {
    /// Create an empty container able to hold values of `ty`.
    ///
    /// Returns `None` for `Void` and `Any`, which have no storage.
    pub fn for_type(ty: &ValueType) -> Option<Self> {
        match ty {
            ValueType::Bool => Some(DataContainer::Bool(ArrayDataContainer::new())),
            ValueType::Int64 => Some(DataContainer::Int64(ArrayDataContainer::new())),
            ValueType::Float64 => Some(DataContainer::Float64(ArrayDataContainer::new())),
            ValueType::Text => Some(DataContainer::Text(ArrayDataContainer::new())),
            ValueType::Array(element) => Self::for_type(element),
            ValueType::Void | ValueType::Any => None,
        }
    }

    /// Pack a value into a container.
    ///
    /// Arrays must be rectangular and hold a single element type.
    pub fn from_value(value: &Value) -> Option<Self> {
        let mut lengths = Vec::new();
        let mut probe = value;
        while let Value::Array(items) = probe {
            lengths.push(items.len());
            probe = items.first()?;
        }

        let mut leaves = Vec::with_capacity(lengths.iter().product());
        flatten(value, &lengths, &mut leaves)?;

        let container = match probe {
            Value::Bool(_) => DataContainer::Bool(ArrayDataContainer::array(
                leaves.iter().map(|v| v.as_bool()).collect::<Option<_>>()?,
                lengths,
            )),
            Value::Int(_) => DataContainer::Int64(ArrayDataContainer::array(
                leaves.iter().map(|v| v.as_i64()).collect::<Option<_>>()?,
                lengths,
            )),
            Value::Float(_) => DataContainer::Float64(ArrayDataContainer::array(
                leaves.iter().map(|v| v.as_f64()).collect::<Option<_>>()?,
                lengths,
            )),
            Value::Text(_) => DataContainer::Text(ArrayDataContainer::array(
                leaves
                    .iter()
                    .map(|v| v.as_str().map(str::to_string))
                    .collect::<Option<_>>()?,
                lengths,
            )),
            Value::Void | Value::Array(_) => return None,
        };
        Some(container)
    }

    /// Unpack the container into a value, `None` if it holds no data.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            DataContainer::Bool(c) => unpack(c, |v| Value::Bool(*v)),
            DataContainer::Int64(c) => unpack(c, |v| Value::Int(*v)),
            DataContainer::Float64(c) => unpack(c, |v| Value::Float(*v)),
            DataContainer::Text(c) => unpack(c, |v| Value::Text(v.clone())),
        }
    }

    /// Get the declared type of the stored data.
    pub fn value_type(&self) -> ValueType {
        let (element, rank) = match self {
            DataContainer::Bool(c) => (ValueType::Bool, c.array_rank()),
            DataContainer::Int64(c) => (ValueType::Int64, c.array_rank()),
            DataContainer::Float64(c) => (ValueType::Float64, c.array_rank()),
            DataContainer::Text(c) => (ValueType::Text, c.array_rank()),
        };
        (0..rank).fold(element, |ty, _| ValueType::array_of(ty))
    }

    pub fn has_data(&self) -> bool {
        match self {
            DataContainer::Bool(c) => c.has_array_data(),
            DataContainer::Int64(c) => c.has_array_data(),
            DataContainer::Float64(c) => c.has_array_data(),
            DataContainer::Text(c) => c.has_array_data(),
        }
    }

    pub fn lengths(&self) -> &[usize] {
        match self {
            DataContainer::Bool(c) => c.array_lengths(),
            DataContainer::Int64(c) => c.array_lengths(),
            DataContainer::Float64(c) => c.array_lengths(),
            DataContainer::Text(c) => c.array_lengths(),
        }
    }
}

fn flatten<'a>(value: &'a Value, lengths: &[usize], out: &mut Vec<&'a Value>) -> Option<()> {
    match (value, lengths.split_first()) {
        (Value::Array(items), Some((len, rest))) => {
            if items.len() != *len {
                return None;
            }
            for item in items {
                flatten(item, rest, out)?;
            }
            Some(())
        }
        (Value::Array(_), None) => None,
        (_, Some(_)) => None,
        (leaf, None) => {
            out.push(leaf);
            Some(())
        }
    }
}

fn unpack<T>(container: &ArrayDataContainer<T>, wrap: impl Fn(&T) -> Value) -> Option<Value> {
    let elements = container.elements()?;
    let lengths = container.array_lengths();
    if lengths.is_empty() {
        return elements.first().map(wrap);
    }
    Some(nest(elements, lengths, &wrap))
}

fn nest<T>(elements: &[T], lengths: &[usize], wrap: &impl Fn(&T) -> Value) -> Value {
    match lengths.split_first() {
        None => elements.first().map(wrap).unwrap_or(Value::Void),
        Some((_, [])) => Value::Array(elements.iter().map(wrap).collect()),
        Some((len, rest)) => {
            let stride = checked_product(rest).unwrap_or(0);
            Value::Array(
                (0..*len)
                    .map(|i| nest(&elements[i * stride..(i + 1) * stride], rest, wrap))
                    .collect(),
            )
        }
    }
}
