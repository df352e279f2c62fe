use crate::dtype::TensorElement;
use crate::strided::StridedLayout;
use crate::{DType, Device, Result, Shape, TensorError};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A dense N-dimensional tensor.
///
/// The element buffer is shared: every view constructed from a tensor
/// (select, slice, unsqueeze, expand, alias) holds the same storage `Arc`
/// and differs only in its strided layout. Writes through any view are
/// visible through every other view of the same storage.
#[derive(Debug, Clone)]
pub struct Tensor<T> {
    pub(crate) storage: Arc<RwLock<Vec<T>>>,
    pub(crate) layout: StridedLayout,
    pub(crate) device: Device,
}

impl<T: TensorElement> Tensor<T> {
    pub(crate) fn from_parts(
        storage: Arc<RwLock<Vec<T>>>,
        layout: StridedLayout,
        device: Device,
    ) -> Self {
        Self {
            storage,
            layout,
            device,
        }
    }

    pub(crate) fn read_storage(&self) -> RwLockReadGuard<'_, Vec<T>> {
        // Poisoning means a prior panic mid-write; nothing sensible to recover.
        self.storage.read().expect("tensor storage lock poisoned")
    }

    pub(crate) fn write_storage(&self) -> RwLockWriteGuard<'_, Vec<T>> {
        self.storage.write().expect("tensor storage lock poisoned")
    }

    pub fn shape(&self) -> Shape {
        Shape::from_slice(self.layout.shape())
    }

    /// Dimension sizes.
    pub fn dims(&self) -> &[usize] {
        self.layout.shape()
    }

    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    pub fn offset(&self) -> usize {
        self.layout.offset()
    }

    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.layout.numel()
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn dtype(&self) -> DType {
        T::dtype()
    }

    pub fn is_scalar(&self) -> bool {
        self.rank() == 0
    }

    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    /// A new view object sharing this tensor's storage, with identical
    /// layout but its own identity.
    pub fn alias(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            layout: self.layout.clone(),
            device: self.device,
        }
    }

    /// Whether both tensors are views over the same storage buffer.
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    /// Value at the given coordinates, or `None` when out of bounds.
    pub fn get(&self, coords: &[usize]) -> Option<T> {
        if coords.len() != self.rank() {
            return None;
        }
        for (i, &idx) in coords.iter().enumerate() {
            if idx >= self.dims()[i] {
                return None;
            }
        }
        let offset = self.layout.linear_offset(coords);
        self.read_storage().get(offset).cloned()
    }

    /// The value of a one-element tensor.
    pub fn item(&self) -> Result<T> {
        if self.numel() != 1 {
            return Err(TensorError::invalid_argument(
                "item",
                format!(
                    "only one-element tensors can be converted to a scalar, got {} elements",
                    self.numel()
                ),
            ));
        }
        let coords = vec![0; self.rank()];
        let offset = self.layout.linear_offset(&coords);
        Ok(self.read_storage()[offset].clone())
    }

    /// Materialize the elements in row-major logical order.
    pub fn to_vec(&self) -> Vec<T> {
        let storage = self.read_storage();
        self.layout
            .index_iter()
            .map(|coords| storage[self.layout.linear_offset(&coords)].clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_shares_storage() {
        let tensor = Tensor::<f32>::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        let view = tensor.alias();
        assert!(view.shares_storage_with(&tensor));
        assert_eq!(view.dims(), tensor.dims());
    }

    #[test]
    fn test_get() {
        let tensor = Tensor::<f32>::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        assert_eq!(tensor.get(&[0, 1]), Some(2.0));
        assert_eq!(tensor.get(&[2, 0]), None);
        assert_eq!(tensor.get(&[0]), None);
    }

    #[test]
    fn test_item() {
        let scalar = Tensor::<i64>::from_scalar(7);
        assert_eq!(scalar.item().unwrap(), 7);

        let tensor = Tensor::<i64>::from_vec(vec![1, 2], &[2]).unwrap();
        assert!(tensor.item().is_err());
    }

    #[test]
    fn test_to_vec_respects_layout() {
        let tensor = Tensor::<i32>::from_vec(vec![1, 2, 3, 4, 5, 6], &[2, 3]).unwrap();
        let reversed = tensor
            .slice_dim(1, &crate::SliceSpec::new(None, None, Some(-1)))
            .unwrap();
        assert_eq!(reversed.to_vec(), vec![3, 2, 1, 6, 5, 4]);
    }
}
