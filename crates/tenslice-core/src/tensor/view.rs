use super::Tensor;
use crate::dtype::TensorElement;
use crate::strided::SliceSpec;
use crate::{Device, Result, TensorError};
use std::sync::Arc;

impl<T: TensorElement> Tensor<T> {
    /// View with `dim` removed, fixed at `index`. Negative indices count
    /// from the end of the dimension.
    pub fn select(&self, dim: usize, index: i64) -> Result<Self> {
        if dim >= self.rank() {
            return Err(TensorError::invalid_axis(dim as i64, self.rank()));
        }
        let size = self.dims()[dim];
        let normalized = if index < 0 { index + size as i64 } else { index };
        if normalized < 0 || normalized >= size as i64 {
            return Err(TensorError::index_out_of_bounds(index, dim, size));
        }

        Ok(Self::from_parts(
            Arc::clone(&self.storage),
            self.layout.select(dim, normalized as usize),
            self.device,
        ))
    }

    /// View with `dim` narrowed to the elements `spec` selects. Bounds
    /// clamp; only a zero step fails.
    pub fn slice_dim(&self, dim: usize, spec: &SliceSpec) -> Result<Self> {
        if dim >= self.rank() {
            return Err(TensorError::invalid_axis(dim as i64, self.rank()));
        }

        Ok(Self::from_parts(
            Arc::clone(&self.storage),
            self.layout.slice_dim(dim, spec)?,
            self.device,
        ))
    }

    /// View with a size-1 dimension inserted at `dim`.
    pub fn unsqueeze(&self, dim: usize) -> Result<Self> {
        if dim > self.rank() {
            return Err(TensorError::invalid_axis(dim as i64, self.rank() + 1));
        }

        Ok(Self::from_parts(
            Arc::clone(&self.storage),
            self.layout.unsqueeze(dim),
            self.device,
        ))
    }

    /// Reinterpret a contiguous view under a new shape with the same element
    /// count.
    pub fn view(&self, shape: &[usize]) -> Result<Self> {
        Ok(Self::from_parts(
            Arc::clone(&self.storage),
            self.layout.reshape(shape)?,
            self.device,
        ))
    }

    /// Broadcast view of `shape`, without copying. Size-1 dimensions repeat
    /// via zero strides; incompatible shapes fail.
    pub fn expand(&self, shape: &[usize]) -> Result<Self> {
        Ok(Self::from_parts(
            Arc::clone(&self.storage),
            self.layout.broadcast_to(shape)?,
            self.device,
        ))
    }

    /// Align this tensor to `device`. Returns a shallow alias when the
    /// placement already matches.
    pub fn to_device(&self, device: Device) -> Result<Self> {
        if self.device == device {
            return Ok(self.alias());
        }
        Err(TensorError::device_mismatch(
            "to_device",
            device,
            self.device,
        ))
    }

    /// Element-wise in-place copy from `src`, which must have this view's
    /// exact shape (callers broadcast first, see [`Tensor::expand`]).
    pub fn copy_(&self, src: &Self) -> Result<()> {
        if src.dims() != self.dims() {
            return Err(TensorError::shape_mismatch(
                "copy_",
                self.shape(),
                src.shape(),
            ));
        }

        // Reading and writing the same buffer under one RwLock would
        // deadlock; stage overlapping sources through a fresh buffer.
        let src = if self.shares_storage_with(src) {
            Self::from_vec(src.to_vec(), src.dims())?
        } else {
            src.alias()
        };

        let src_storage = src.read_storage();
        let mut dst_storage = self.write_storage();
        for coords in self.layout.index_iter() {
            let value = src_storage[src.layout.linear_offset(&coords)].clone();
            dst_storage[self.layout.linear_offset(&coords)] = value;
        }
        Ok(())
    }

    /// Fill every element of this view in place.
    pub fn fill_(&self, value: T) {
        let mut storage = self.write_storage();
        for coords in self.layout.index_iter() {
            storage[self.layout.linear_offset(&coords)] = value.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tensor<i32> {
        Tensor::from_vec((1..=6).collect(), &[2, 3]).unwrap()
    }

    #[test]
    fn test_select_removes_dim() {
        let t = sample();
        let row = t.select(0, 1).unwrap();
        assert_eq!(row.dims(), &[3]);
        assert_eq!(row.to_vec(), vec![4, 5, 6]);

        let col = t.select(1, -1).unwrap();
        assert_eq!(col.to_vec(), vec![3, 6]);
    }

    #[test]
    fn test_select_out_of_bounds() {
        let t = sample();
        assert!(t.select(0, 2).is_err());
        assert!(t.select(0, -3).is_err());
        assert!(t.select(2, 0).is_err());
    }

    #[test]
    fn test_slice_dim() {
        let t = Tensor::<i32>::from_vec((0..6).collect(), &[6]).unwrap();
        let sliced = t
            .slice_dim(0, &SliceSpec::new(Some(1), Some(5), Some(2)))
            .unwrap();
        assert_eq!(sliced.to_vec(), vec![1, 3]);
    }

    #[test]
    fn test_unsqueeze() {
        let t = sample();
        assert_eq!(t.unsqueeze(0).unwrap().dims(), &[1, 2, 3]);
        assert_eq!(t.unsqueeze(2).unwrap().dims(), &[2, 3, 1]);
        assert!(t.unsqueeze(3).is_err());
    }

    #[test]
    fn test_view_requires_matching_numel() {
        let t = sample();
        assert_eq!(t.view(&[3, 2]).unwrap().dims(), &[3, 2]);
        assert!(t.view(&[4]).is_err());
    }

    #[test]
    fn test_expand_broadcasts_without_copy() {
        let t = Tensor::<i32>::from_vec(vec![1, 2, 3], &[3]).unwrap();
        let expanded = t.expand(&[2, 3]).unwrap();
        assert_eq!(expanded.to_vec(), vec![1, 2, 3, 1, 2, 3]);
        assert!(expanded.shares_storage_with(&t));
        assert!(t.expand(&[2, 4]).is_err());
    }

    #[test]
    fn test_copy_writes_through_views() {
        let t = sample();
        let row = t.select(0, 0).unwrap();
        let src = Tensor::from_vec(vec![7, 8, 9], &[3]).unwrap();
        row.copy_(&src).unwrap();
        assert_eq!(t.to_vec(), vec![7, 8, 9, 4, 5, 6]);
    }

    #[test]
    fn test_copy_overlapping_views() {
        let t = Tensor::<i32>::from_vec((0..6).collect(), &[6]).unwrap();
        let head = t.slice_dim(0, &SliceSpec::new(None, Some(3), None)).unwrap();
        let tail = t.slice_dim(0, &SliceSpec::new(Some(3), None, None)).unwrap();
        head.copy_(&tail).unwrap();
        assert_eq!(t.to_vec(), vec![3, 4, 5, 3, 4, 5]);
    }

    #[test]
    fn test_to_device_aliases_when_matching() {
        let t = sample();
        let moved = t.to_device(Device::Cpu).unwrap();
        assert!(moved.shares_storage_with(&t));
    }

    #[test]
    fn test_fill() {
        let t = sample();
        t.select(1, 0).unwrap().fill_(0);
        assert_eq!(t.to_vec(), vec![0, 2, 3, 0, 5, 6]);
    }
}
