use super::Tensor;
use crate::dtype::{Scalar, TensorElement};
use crate::strided::StridedLayout;
use crate::{Device, Result, TensorError};
use ndarray::{ArrayD, IxDyn};
use num_traits::{One, Zero};
use std::sync::{Arc, RwLock};

impl<T: TensorElement> Tensor<T> {
    fn from_buffer(data: Vec<T>, shape: &[usize]) -> Self {
        Self::from_parts(
            Arc::new(RwLock::new(data)),
            StridedLayout::contiguous(shape),
            Device::Cpu,
        )
    }

    /// Create a tensor filled with zeros.
    pub fn zeros(shape: &[usize]) -> Self
    where
        T: Zero,
    {
        let numel = shape.iter().product();
        Self::from_buffer(vec![T::zero(); numel], shape)
    }

    /// Create a tensor filled with ones.
    pub fn ones(shape: &[usize]) -> Self
    where
        T: One,
    {
        let numel = shape.iter().product();
        Self::from_buffer(vec![T::one(); numel], shape)
    }

    /// Create a tensor filled with a value.
    pub fn full(shape: &[usize], value: T) -> Self {
        let numel = shape.iter().product();
        Self::from_buffer(vec![value; numel], shape)
    }

    /// Create a tensor from a row-major data vector and a shape.
    pub fn from_vec(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        let numel: usize = shape.iter().product();
        if data.len() != numel {
            return Err(TensorError::invalid_argument(
                "from_vec",
                format!(
                    "data length {} does not match shape {:?} ({} elements)",
                    data.len(),
                    shape,
                    numel
                ),
            ));
        }
        Ok(Self::from_buffer(data, shape))
    }

    /// Create a 0-dimensional tensor holding one value.
    pub fn from_scalar(value: T) -> Self {
        Self::from_buffer(vec![value], &[])
    }

    /// Create a 1-D tensor with values `0..len`.
    pub fn arange(len: usize) -> Self {
        let data = (0..len)
            .map(|i| T::from_scalar(Scalar::Int(i as i64)))
            .collect();
        Self::from_buffer(data, &[len])
    }

    /// Create a tensor from an `ndarray` array.
    pub fn from_array(array: ArrayD<T>) -> Self {
        let shape = array.shape().to_vec();
        let data = array.iter().cloned().collect();
        Self::from_buffer(data, &shape)
    }

    /// Materialize this tensor as an `ndarray` array.
    pub fn to_array(&self) -> Result<ArrayD<T>> {
        ArrayD::from_shape_vec(IxDyn(self.dims()), self.to_vec())
            .map_err(|e| TensorError::invalid_argument("to_array", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_and_full() {
        let zeros = Tensor::<f32>::zeros(&[2, 3]);
        assert_eq!(zeros.dims(), &[2, 3]);
        assert_eq!(zeros.to_vec(), vec![0.0; 6]);

        let ones = Tensor::<i64>::ones(&[3]);
        assert_eq!(ones.to_vec(), vec![1, 1, 1]);

        let full = Tensor::<bool>::full(&[2], true);
        assert_eq!(full.to_vec(), vec![true, true]);
    }

    #[test]
    fn test_from_vec_validates_length() {
        assert!(Tensor::<i64>::from_vec(vec![1, 2, 3], &[2, 2]).is_err());
        assert!(Tensor::<i64>::from_vec(vec![1, 2, 3, 4], &[2, 2]).is_ok());
    }

    #[test]
    fn test_arange() {
        let t = Tensor::<i64>::arange(4);
        assert_eq!(t.to_vec(), vec![0, 1, 2, 3]);

        let f = Tensor::<f32>::arange(3);
        assert_eq!(f.to_vec(), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_ndarray_round_trip() {
        let array = ArrayD::from_shape_vec(IxDyn(&[2, 2]), vec![1.0f64, 2.0, 3.0, 4.0]).unwrap();
        let tensor = Tensor::from_array(array.clone());
        assert_eq!(tensor.dims(), &[2, 2]);
        assert_eq!(tensor.to_array().unwrap(), array);
    }
}
