use crate::{Result, TensorError};

/// Bounds of one slice along one dimension, before normalization.
///
/// `None` fields take the Python-slice defaults for the step's sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SliceSpec {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: Option<i64>,
}

impl SliceSpec {
    pub fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        Self { start, stop, step }
    }

    /// Resolve the spec against a dimension of `size` elements.
    ///
    /// Returns `(start, len, step)` where `start` is the first selected
    /// position (may be -1 only when `len` is 0) and `len` the number of
    /// selected elements. Out-of-range bounds clamp rather than fail,
    /// matching Python slice semantics.
    pub fn normalize(&self, size: usize) -> Result<(isize, usize, isize)> {
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(TensorError::invalid_argument(
                "slice",
                "step cannot be zero",
            ));
        }

        // Bounds arithmetic in i128: callers may pass i64::MIN/MAX sentinels.
        let size = size as i128;
        let adjust = |bound: i128| {
            if bound < 0 {
                bound + size
            } else {
                bound
            }
        };

        let (start, len) = if step > 0 {
            let start = adjust(self.start.unwrap_or(0) as i128).clamp(0, size);
            let stop = adjust(self.stop.unwrap_or(i64::MAX) as i128).clamp(0, size);
            let len = if start >= stop {
                0
            } else {
                (stop - start + step as i128 - 1) / step as i128
            };
            (start, len)
        } else {
            let start = adjust(self.start.unwrap_or(-1) as i128).clamp(-1, size - 1);
            let stop = adjust(self.stop.unwrap_or(i64::MIN) as i128).clamp(-1, size - 1);
            let len = if start <= stop {
                0
            } else {
                (start - stop - step as i128 - 1) / -(step as i128)
            };
            (start, len)
        };

        Ok((start as isize, len as usize, step as isize))
    }
}

impl From<std::ops::Range<i64>> for SliceSpec {
    fn from(range: std::ops::Range<i64>) -> Self {
        Self::new(Some(range.start), Some(range.end), None)
    }
}

/// Strided layout of a tensor view: shape, signed strides, and the offset of
/// the first element within the shared storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StridedLayout {
    shape: Vec<usize>,
    strides: Vec<isize>,
    offset: usize,
}

impl StridedLayout {
    /// C-contiguous layout for a shape, starting at offset 0.
    pub fn contiguous(shape: &[usize]) -> Self {
        Self {
            strides: Self::contiguous_strides(shape),
            shape: shape.to_vec(),
            offset: 0,
        }
    }

    pub fn with_strides(shape: Vec<usize>, strides: Vec<isize>, offset: usize) -> Result<Self> {
        if shape.len() != strides.len() {
            return Err(TensorError::invalid_argument(
                "with_strides",
                format!(
                    "shape and strides must have the same length: {} != {}",
                    shape.len(),
                    strides.len()
                ),
            ));
        }

        Ok(Self {
            shape,
            strides,
            offset,
        })
    }

    fn contiguous_strides(shape: &[usize]) -> Vec<isize> {
        let mut strides = vec![1isize; shape.len()];
        for i in (0..shape.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * shape[i + 1] as isize;
        }
        strides
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Whether the strides are C-order for the shape. The offset does not
    /// matter: a contiguous run starting mid-storage is still contiguous.
    pub fn is_contiguous(&self) -> bool {
        self.strides == Self::contiguous_strides(&self.shape)
    }

    /// Storage offset of the element at logical coordinates `coords`.
    pub fn linear_offset(&self, coords: &[usize]) -> usize {
        let mut linear = self.offset as isize;
        for (&idx, &stride) in coords.iter().zip(&self.strides) {
            linear += idx as isize * stride;
        }
        linear as usize
    }

    /// Remove `dim`, fixing it at position `index` (already normalized to
    /// `0..shape[dim]`).
    pub fn select(&self, dim: usize, index: usize) -> Self {
        let mut shape = self.shape.clone();
        let mut strides = self.strides.clone();
        let offset = (self.offset as isize + index as isize * strides[dim]) as usize;
        shape.remove(dim);
        strides.remove(dim);

        Self {
            shape,
            strides,
            offset,
        }
    }

    /// Narrow `dim` to the elements a slice spec selects, scaling its stride
    /// by the step.
    pub fn slice_dim(&self, dim: usize, spec: &SliceSpec) -> Result<Self> {
        let (start, len, step) = spec.normalize(self.shape[dim])?;

        let mut shape = self.shape.clone();
        let mut strides = self.strides.clone();
        let mut offset = self.offset;
        if len > 0 {
            offset = (offset as isize + start * strides[dim]) as usize;
        }
        shape[dim] = len;
        strides[dim] *= step;

        Ok(Self {
            shape,
            strides,
            offset,
        })
    }

    /// Insert a size-1 dimension at `dim`.
    pub fn unsqueeze(&self, dim: usize) -> Self {
        let mut shape = self.shape.clone();
        let mut strides = self.strides.clone();
        let stride = if dim == shape.len() {
            1
        } else {
            shape[dim] as isize * strides[dim]
        };
        shape.insert(dim, 1);
        strides.insert(dim, stride);

        Self {
            shape,
            strides,
            offset: self.offset,
        }
    }

    /// Expand to `target` with stride-0 broadcasting under leading-size-1
    /// alignment.
    pub fn broadcast_to(&self, target: &[usize]) -> Result<Self> {
        if target.len() < self.shape.len() {
            return Err(TensorError::shape_mismatch(
                "broadcast_to",
                format!("{target:?}"),
                format!("{:?}", self.shape),
            ));
        }

        let lead = target.len() - self.shape.len();
        let mut strides = vec![0isize; target.len()];

        for i in 0..self.shape.len() {
            let self_dim = self.shape[i];
            let target_dim = target[lead + i];

            if self_dim != 1 && self_dim != target_dim {
                return Err(TensorError::shape_mismatch(
                    "broadcast_to",
                    format!("{target:?}"),
                    format!("{:?}", self.shape),
                ));
            }

            strides[lead + i] = if self_dim == 1 { 0 } else { self.strides[i] };
        }

        Ok(Self {
            shape: target.to_vec(),
            strides,
            offset: self.offset,
        })
    }

    /// Reinterpret a contiguous layout under a new shape with the same
    /// element count.
    pub fn reshape(&self, new_shape: &[usize]) -> Result<Self> {
        if !self.is_contiguous() {
            return Err(TensorError::invalid_argument(
                "reshape",
                "layout is not contiguous",
            ));
        }

        let new_numel: usize = new_shape.iter().product();
        if new_numel != self.numel() {
            return Err(TensorError::shape_mismatch(
                "reshape",
                format!("{} elements", self.numel()),
                format!("{new_shape:?} ({new_numel} elements)"),
            ));
        }

        Ok(Self {
            strides: Self::contiguous_strides(new_shape),
            shape: new_shape.to_vec(),
            offset: self.offset,
        })
    }

    /// Row-major iterator over all logical coordinates.
    pub fn index_iter(&self) -> IndexIter {
        IndexIter::new(&self.shape)
    }
}

/// Row-major iterator over multi-dimensional coordinates of a shape.
pub struct IndexIter {
    shape: Vec<usize>,
    current: Vec<usize>,
    done: bool,
}

impl IndexIter {
    pub fn new(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            current: vec![0; shape.len()],
            done: shape.contains(&0),
        }
    }
}

impl Iterator for IndexIter {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current.clone();

        // 0-d shapes yield exactly one (empty) coordinate.
        if self.shape.is_empty() {
            self.done = true;
            return Some(result);
        }

        for i in (0..self.shape.len()).rev() {
            self.current[i] += 1;
            if self.current[i] < self.shape[i] {
                break;
            }
            if i == 0 {
                self.done = true;
            } else {
                self.current[i] = 0;
            }
        }

        Some(result)
    }
}
