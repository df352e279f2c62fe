//! NumPy-style indexing and assignment over tensors.
//!
//! An index expression is an ordered list of [`TensorIndex`] descriptors.
//! Integers, slices, `Ellipsis`, and new-axis markers resolve to zero-copy
//! views of the source storage ("basic" indexing); index tensors and masks
//! resolve to a gather on read and a scatter on write ("advanced" indexing).
//! Both regimes compose in a single expression: the descriptor walk first
//! builds the basic view, collecting pending index tensors at the output
//! dimensions they act on, then dispatches the pending list in one step.

use crate::dtype::{Scalar, TensorElement};
use crate::ops::advanced::{self, AdvancedIndex};
use crate::strided::SliceSpec;
use crate::{Result, Tensor, TensorError};
use std::fmt;

/// Bounds of one slice descriptor.
///
/// Unspecified bounds take sign-dependent defaults (`0..MAX` forward,
/// `-1..MIN` backward) and are clamped against the dimension when applied.
/// Each bound may carry the 0-d tensor it was read from.
#[derive(Debug, Clone)]
pub struct Slice {
    start: i64,
    stop: i64,
    step: i64,
    start_source: Option<Tensor<i64>>,
    stop_source: Option<Tensor<i64>>,
    step_source: Option<Tensor<i64>>,
}

impl Slice {
    pub fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        let step = step.unwrap_or(1);
        let (start_default, stop_default) = if step < 0 {
            (-1, i64::MIN)
        } else {
            (0, i64::MAX)
        };
        Self {
            start: start.unwrap_or(start_default),
            stop: stop.unwrap_or(stop_default),
            step,
            start_source: None,
            stop_source: None,
            step_source: None,
        }
    }

    /// Build a slice whose bounds come from 0-d tensors, keeping the
    /// tensors as provenance.
    pub fn from_tensors(
        start: Option<Tensor<i64>>,
        stop: Option<Tensor<i64>>,
        step: Option<Tensor<i64>>,
    ) -> Result<Self> {
        let read = |t: &Option<Tensor<i64>>| -> Result<Option<i64>> {
            match t {
                Some(t) if t.rank() != 0 => Err(TensorError::invalid_argument(
                    "slice",
                    format!("slice bounds must be 0-d tensors, got rank {}", t.rank()),
                )),
                Some(t) => Ok(Some(t.item()?)),
                None => Ok(None),
            }
        };

        let mut slice = Self::new(read(&start)?, read(&stop)?, read(&step)?);
        slice.start_source = start;
        slice.stop_source = stop;
        slice.step_source = step;
        Ok(slice)
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn stop(&self) -> i64 {
        self.stop
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    pub fn start_source(&self) -> Option<&Tensor<i64>> {
        self.start_source.as_ref()
    }

    pub fn stop_source(&self) -> Option<&Tensor<i64>> {
        self.stop_source.as_ref()
    }

    pub fn step_source(&self) -> Option<&Tensor<i64>> {
        self.step_source.as_ref()
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.start, self.stop, self.step)
    }
}

/// One position of an index expression.
#[derive(Debug, Clone)]
pub enum TensorIndex {
    /// New-axis marker: inserts a size-1 dimension.
    None,
    /// Absorbs every dimension no other descriptor accounts for.
    Ellipsis,
    /// Selects one position of a dimension, removing it. May carry the 0-d
    /// tensor it was read from.
    Integer {
        value: i64,
        source: Option<Tensor<i64>>,
    },
    /// Inserts a size-1 dimension and selects it wholly (`true`) or
    /// emptily (`false`).
    Boolean(bool),
    /// Narrows a dimension.
    Slice(Slice),
    /// Integer index tensor: gathers along a dimension.
    IntTensor(Tensor<i64>),
    /// Boolean mask: gathers the true positions of as many dimensions as
    /// the mask has.
    BoolTensor(Tensor<bool>),
}

impl TensorIndex {
    pub fn integer(value: i64) -> Self {
        Self::Integer {
            value,
            source: None,
        }
    }
}

impl From<i64> for TensorIndex {
    fn from(value: i64) -> Self {
        Self::integer(value)
    }
}

impl From<i32> for TensorIndex {
    fn from(value: i32) -> Self {
        Self::integer(value as i64)
    }
}

impl From<bool> for TensorIndex {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Slice> for TensorIndex {
    fn from(slice: Slice) -> Self {
        Self::Slice(slice)
    }
}

impl From<std::ops::Range<i64>> for TensorIndex {
    fn from(range: std::ops::Range<i64>) -> Self {
        Self::Slice(Slice::new(Some(range.start), Some(range.end), None))
    }
}

impl From<std::ops::RangeFrom<i64>> for TensorIndex {
    fn from(range: std::ops::RangeFrom<i64>) -> Self {
        Self::Slice(Slice::new(Some(range.start), None, None))
    }
}

impl From<std::ops::RangeTo<i64>> for TensorIndex {
    fn from(range: std::ops::RangeTo<i64>) -> Self {
        Self::Slice(Slice::new(None, Some(range.end), None))
    }
}

impl From<std::ops::RangeFull> for TensorIndex {
    fn from(_: std::ops::RangeFull) -> Self {
        Self::Slice(Slice::new(None, None, None))
    }
}

impl From<Tensor<i64>> for TensorIndex {
    fn from(tensor: Tensor<i64>) -> Self {
        Self::IntTensor(tensor)
    }
}

impl From<Tensor<bool>> for TensorIndex {
    fn from(tensor: Tensor<bool>) -> Self {
        Self::BoolTensor(tensor)
    }
}

impl fmt::Display for TensorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TensorIndex::None => write!(f, "None"),
            TensorIndex::Ellipsis => write!(f, "..."),
            TensorIndex::Integer { value, .. } => write!(f, "{value}"),
            TensorIndex::Boolean(value) => write!(f, "{value}"),
            TensorIndex::Slice(slice) => write!(f, "{slice}"),
            TensorIndex::IntTensor(tensor) => write!(f, "{tensor}"),
            TensorIndex::BoolTensor(tensor) => write!(f, "{tensor}"),
        }
    }
}

/// Render a whole index expression, e.g. `(1, 0:5:1, None)`.
pub fn render_indices(indices: &[TensorIndex]) -> String {
    let mut out = String::from("(");
    for (i, index) in indices.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&index.to_string());
    }
    out.push(')');
    out
}

/// Number of source dimensions the expression explicitly consumes.
///
/// New-axis, ellipsis, and plain booleans consume none; a boolean mask
/// consumes as many dimensions as it has; everything else consumes one.
fn count_specified_dimensions(indices: &[TensorIndex]) -> usize {
    indices
        .iter()
        .map(|index| match index {
            TensorIndex::None | TensorIndex::Ellipsis | TensorIndex::Boolean(_) => 0,
            TensorIndex::BoolTensor(tensor) => tensor.rank(),
            _ => 1,
        })
        .sum()
}

/// 1-D index tensor standing in for a boolean descriptor on its inserted
/// size-1 axis: `[0]` selects it wholly, an empty tensor selects nothing.
fn bool_to_indexing_tensor(value: bool) -> Tensor<i64> {
    if value {
        Tensor::zeros(&[1])
    } else {
        Tensor::zeros(&[0])
    }
}

fn apply_select<T: TensorElement>(
    src: &Tensor<T>,
    dim: usize,
    index: i64,
    real_dim: usize,
) -> Result<Tensor<T>> {
    if src.is_scalar() {
        return Err(TensorError::invalid_argument(
            "index",
            "invalid index of a 0-dim tensor, use item() instead",
        ));
    }
    let size = src.dims()[dim];
    if index < -(size as i64) || index >= size as i64 {
        return Err(TensorError::index_out_of_bounds(index, real_dim, size));
    }
    src.select(dim, index)
}

fn apply_slice<T: TensorElement>(
    src: &Tensor<T>,
    dim: usize,
    slice: &Slice,
    ensure_view: bool,
) -> Result<Tensor<T>> {
    if src.is_scalar() {
        return Err(TensorError::invalid_argument(
            "slice",
            "slice cannot be applied to a 0-dim tensor",
        ));
    }
    let length = src.dims()[dim] as i64;
    if !ensure_view && slice.start == 0 && slice.stop >= length && slice.step == 1 {
        return Ok(src.alias());
    }
    src.slice_dim(
        dim,
        &SliceSpec::new(Some(slice.start), Some(slice.stop), Some(slice.step)),
    )
}

/// Walk the descriptor list left to right against the source, producing the
/// basic view and collecting pending advanced indices at the output
/// dimensions they act on.
fn apply_slicing<T: TensorElement>(
    src: &Tensor<T>,
    indices: &[TensorIndex],
    out_indices: &mut Vec<Option<AdvancedIndex>>,
) -> Result<Tensor<T>> {
    let specified = count_specified_dimensions(indices);
    if specified > src.rank() {
        return Err(TensorError::too_many_indices(specified, src.rank()));
    }

    let record = |out: &mut Vec<Option<AdvancedIndex>>, dim: &mut usize, idx: AdvancedIndex| {
        while out.len() < *dim + 1 {
            out.push(None);
        }
        out[*dim] = Some(idx);
        *dim += 1;
    };

    let mut result = src.alias();
    let mut dim = 0usize;
    for (i, index) in indices.iter().enumerate() {
        match index {
            TensorIndex::Integer { value, .. } => {
                result = apply_select(&result, dim, *value, i)?;
            }
            TensorIndex::Slice(slice) => {
                result = apply_slice(&result, dim, slice, false)?;
                dim += 1;
            }
            TensorIndex::Ellipsis => {
                dim += src.rank() - specified;
            }
            TensorIndex::None => {
                result = result.unsqueeze(dim)?;
                dim += 1;
            }
            TensorIndex::Boolean(value) => {
                result = result.unsqueeze(dim)?;
                record(
                    out_indices,
                    &mut dim,
                    AdvancedIndex::Long(bool_to_indexing_tensor(*value)),
                );
            }
            TensorIndex::IntTensor(tensor) => {
                if tensor.rank() == 0 {
                    result = apply_select(&result, dim, tensor.item()?, i)?;
                } else {
                    record(out_indices, &mut dim, AdvancedIndex::Long(tensor.alias()));
                }
            }
            TensorIndex::BoolTensor(tensor) => {
                if tensor.rank() == 0 {
                    result = result.unsqueeze(dim)?;
                    record(
                        out_indices,
                        &mut dim,
                        AdvancedIndex::Long(bool_to_indexing_tensor(tensor.item()?)),
                    );
                } else {
                    record(out_indices, &mut dim, AdvancedIndex::Mask(tensor.alias()));
                }
            }
        }
    }
    Ok(result)
}

/// Align every pending index tensor to the view's placement in one step,
/// right before dispatch.
fn align_index_devices<T: TensorElement>(
    src: &Tensor<T>,
    indices: Vec<Option<AdvancedIndex>>,
) -> Result<Vec<Option<AdvancedIndex>>> {
    indices
        .into_iter()
        .map(|entry| {
            Ok(match entry {
                Some(AdvancedIndex::Long(t)) => {
                    Some(AdvancedIndex::Long(t.to_device(src.device())?))
                }
                Some(AdvancedIndex::Mask(t)) => {
                    Some(AdvancedIndex::Mask(t.to_device(src.device())?))
                }
                None => None,
            })
        })
        .collect()
}

fn dispatch_index<T: TensorElement>(
    src: &Tensor<T>,
    indices: Vec<Option<AdvancedIndex>>,
) -> Result<Tensor<T>> {
    let indices = align_index_devices(src, indices)?;
    advanced::index(src, &indices)
}

fn dispatch_index_put<T: TensorElement>(
    src: &Tensor<T>,
    indices: Vec<Option<AdvancedIndex>>,
    value: &Tensor<T>,
) -> Result<()> {
    let indices = align_index_devices(src, indices)?;
    advanced::index_put(src, &indices, value)
}

fn strip_leading_ones(dims: &[usize]) -> &[usize] {
    let first = dims.iter().position(|&d| d != 1).unwrap_or(dims.len());
    &dims[first..]
}

/// Drop leading size-1 dimensions from a view, without copying.
fn trim_leading_ones<T: TensorElement>(src: &Tensor<T>) -> Result<Tensor<T>> {
    let trimmed = strip_leading_ones(src.dims()).to_vec();
    if trimmed.len() == src.rank() {
        return Ok(src.alias());
    }
    if src.is_contiguous() {
        return src.view(&trimmed);
    }
    let mut result = src.alias();
    while result.rank() > trimmed.len() {
        result = result.select(0, 0)?;
    }
    Ok(result)
}

/// Broadcast-copy `src` into `dst`: left-trim size-1 dimensions, expand
/// against the destination shape, copy element-wise.
fn copy_to<T: TensorElement>(dst: &Tensor<T>, src: &Tensor<T>) -> Result<()> {
    let trimmed = trim_leading_ones(src)?;
    let expanded = trimmed
        .expand(dst.dims())
        .map_err(|_| TensorError::shape_mismatch("setitem", dst.shape(), src.shape()))?;
    dst.copy_(&expanded)
}

/// Read the sub-tensor an index expression selects.
///
/// Purely basic expressions return a view aliasing the source storage;
/// expressions with index tensors or masks return a materialized gather.
pub fn get_item<T: TensorElement>(src: &Tensor<T>, indices: &[TensorIndex]) -> Result<Tensor<T>> {
    // simple single descriptors skip the full walk
    if indices.len() == 1 {
        match &indices[0] {
            TensorIndex::None => return src.unsqueeze(0),
            TensorIndex::Ellipsis => return Ok(src.alias()),
            TensorIndex::Integer { value, .. } => return apply_select(src, 0, *value, 0),
            TensorIndex::Slice(slice) => return apply_slice(src, 0, slice, true),
            _ => {}
        }
    }

    let mut tensor_indices = Vec::new();
    let sliced = apply_slicing(src, indices, &mut tensor_indices)?;
    if tensor_indices.is_empty() {
        return Ok(sliced);
    }

    dispatch_index(&sliced, tensor_indices)
}

/// Assign a tensor into the selection an index expression describes,
/// broadcasting the value against it.
pub fn set_item<T: TensorElement>(
    src: &Tensor<T>,
    indices: &[TensorIndex],
    value: &Tensor<T>,
) -> Result<()> {
    if indices.len() == 1 {
        match &indices[0] {
            // assignment to an empty selection succeeds without touching
            // anything, the size of the value is not checked
            TensorIndex::Boolean(false) => return Ok(()),
            TensorIndex::Ellipsis => return copy_to(src, value),
            TensorIndex::None | TensorIndex::Boolean(true) => {
                return copy_to(&src.unsqueeze(0)?, value);
            }
            TensorIndex::Integer { value: index, .. } => {
                return copy_to(&apply_select(src, 0, *index, 0)?, value);
            }
            TensorIndex::Slice(slice) => {
                return copy_to(&apply_slice(src, 0, slice, false)?, value);
            }
            _ => {}
        }
    }

    let mut tensor_indices = Vec::new();
    let sliced = apply_slicing(src, indices, &mut tensor_indices)?;
    if tensor_indices.is_empty() {
        return copy_to(&sliced, value);
    }

    let value_sliced = trim_leading_ones(value)?;
    dispatch_index_put(&sliced, tensor_indices, &value_sliced)
}

/// Assign a scalar into the selection an index expression describes.
///
/// The scalar becomes a 0-d tensor in the source's dtype on the source's
/// device. Quantized destinations keep the legacy route: the value passes
/// through a 0-d float32 tensor on the default device first.
pub fn set_item_scalar<T: TensorElement>(
    src: &Tensor<T>,
    indices: &[TensorIndex],
    value: Scalar,
) -> Result<()> {
    let value = if T::dtype().is_quantized() {
        let float_value = Tensor::<f32>::from_scalar(f32::from_scalar(value));
        Tensor::from_scalar(T::from_scalar(Scalar::Float(float_value.item()? as f64)))
    } else {
        Tensor::from_scalar(T::from_scalar(value)).to_device(src.device())?
    };
    set_item(src, indices, &value)
}

impl<T: TensorElement> Tensor<T> {
    /// Read the sub-tensor an index expression selects. See [`get_item`].
    ///
    /// ```
    /// use tenslice_core::{Tensor, TensorIndex};
    ///
    /// let t = Tensor::<i32>::from_vec(vec![1, 2, 3, 4, 5, 6], &[2, 3]).unwrap();
    /// let row = t.index(&[TensorIndex::from(1)]).unwrap();
    /// assert_eq!(row.to_vec(), vec![4, 5, 6]);
    ///
    /// let cols = t.index(&[TensorIndex::Ellipsis, TensorIndex::from(0..2)]).unwrap();
    /// assert_eq!(cols.dims(), &[2, 2]);
    /// ```
    pub fn index(&self, indices: &[TensorIndex]) -> Result<Tensor<T>> {
        get_item(self, indices)
    }

    /// Assign a tensor into the selection an index expression describes.
    /// See [`set_item`].
    pub fn index_put(&self, indices: &[TensorIndex], value: &Tensor<T>) -> Result<()> {
        set_item(self, indices, value)
    }

    /// Assign a scalar into the selection an index expression describes.
    /// See [`set_item_scalar`].
    ///
    /// ```
    /// use tenslice_core::{Tensor, TensorIndex};
    ///
    /// let t = Tensor::<f32>::zeros(&[2, 2]);
    /// t.index_put_scalar(&[TensorIndex::from(0)], 1.5).unwrap();
    /// assert_eq!(t.to_vec(), vec![1.5, 1.5, 0.0, 0.0]);
    /// ```
    pub fn index_put_scalar(
        &self,
        indices: &[TensorIndex],
        value: impl Into<Scalar>,
    ) -> Result<()> {
        set_item_scalar(self, indices, value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_specified_dimensions() {
        let mask = Tensor::from_vec(vec![true, false, true, true], &[2, 2]).unwrap();
        let indices = [
            TensorIndex::None,
            TensorIndex::integer(0),
            TensorIndex::Ellipsis,
            TensorIndex::Boolean(true),
            TensorIndex::from(0..2),
            TensorIndex::BoolTensor(mask),
            TensorIndex::IntTensor(Tensor::arange(2)),
        ];
        assert_eq!(count_specified_dimensions(&indices), 5);
    }

    #[test]
    fn test_slice_defaults_follow_step_sign() {
        let forward = Slice::new(None, None, None);
        assert_eq!((forward.start(), forward.stop(), forward.step()), (0, i64::MAX, 1));

        let backward = Slice::new(None, None, Some(-2));
        assert_eq!(
            (backward.start(), backward.stop(), backward.step()),
            (-1, i64::MIN, -2)
        );
    }

    #[test]
    fn test_slice_from_tensors_keeps_provenance() {
        let start = Tensor::from_scalar(1i64);
        let slice = Slice::from_tensors(Some(start), None, None).unwrap();
        assert_eq!(slice.start(), 1);
        assert!(slice.start_source().is_some());
        assert!(slice.stop_source().is_none());

        let bad = Tensor::<i64>::from_vec(vec![1, 2], &[2]).unwrap();
        assert!(Slice::from_tensors(Some(bad), None, None).is_err());
    }

    #[test]
    fn test_rendering() {
        let indices = [
            TensorIndex::None,
            TensorIndex::Ellipsis,
            TensorIndex::integer(-1),
            TensorIndex::Boolean(true),
            TensorIndex::from(Slice::new(Some(0), Some(5), Some(2))),
            TensorIndex::IntTensor(Tensor::from_vec(vec![0, 2], &[2]).unwrap()),
        ];
        assert_eq!(
            render_indices(&indices),
            "(None, ..., -1, true, 0:5:2, [0, 2])"
        );
    }

    #[test]
    fn test_bool_to_indexing_tensor() {
        assert_eq!(bool_to_indexing_tensor(true).dims(), &[1]);
        assert_eq!(bool_to_indexing_tensor(true).to_vec(), vec![0]);
        assert_eq!(bool_to_indexing_tensor(false).dims(), &[0]);
    }

    #[test]
    fn test_zero_dim_int_tensor_selects() {
        let t = Tensor::<i32>::from_vec(vec![1, 2, 3, 4], &[2, 2]).unwrap();
        let picked = t
            .index(&[TensorIndex::IntTensor(Tensor::from_scalar(1)), 0i64.into()])
            .unwrap();
        assert_eq!(picked.item().unwrap(), 3);
    }

    #[test]
    fn test_zero_dim_bool_tensor_acts_as_boolean() {
        let t = Tensor::<i32>::from_vec(vec![1, 2], &[2]).unwrap();
        let kept = t
            .index(&[TensorIndex::BoolTensor(Tensor::from_scalar(true)), (..).into()])
            .unwrap();
        assert_eq!(kept.dims(), &[1, 2]);

        let dropped = t
            .index(&[TensorIndex::BoolTensor(Tensor::from_scalar(false)), (..).into()])
            .unwrap();
        assert_eq!(dropped.dims(), &[0, 2]);
    }

    #[test]
    fn test_select_error_reports_descriptor_position() {
        let t = Tensor::<i32>::from_vec(vec![1, 2, 3, 4], &[2, 2]).unwrap();
        let err = t.index(&[0i64.into(), 5i64.into()]).unwrap_err();
        match err {
            TensorError::IndexOutOfBounds { index, dim, size } => {
                assert_eq!((index, dim, size), (5, 1, 2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_scalar_assignment_through_quantized_dtype() {
        use crate::dtype::QInt8;

        let t = Tensor::<QInt8>::full(&[3], QInt8(0));
        t.index_put_scalar(&[TensorIndex::Ellipsis], 7).unwrap();
        assert_eq!(t.to_vec(), vec![QInt8(7); 3]);

        // values out of the quantized range saturate through the float route
        t.index_put_scalar(&[TensorIndex::Ellipsis], 1000).unwrap();
        assert_eq!(t.to_vec(), vec![QInt8(127); 3]);
    }
}
