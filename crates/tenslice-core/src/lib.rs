//! Core tensor type and NumPy-style indexing/assignment engine.
//!
//! The crate centers on two entry points, [`Tensor::index`] and
//! [`Tensor::index_put`] (plus the scalar form), which translate a list of
//! [`TensorIndex`] descriptors into view operations and gather/scatter
//! calls. The strided layout engine, the view primitives, and the
//! advanced-indexing backend exist to serve that translation.

pub mod device;
pub mod dtype;
pub mod error;
pub mod indexing;
pub mod ops;
pub mod shape;
pub mod strided;
pub mod tensor;

pub use device::Device;
pub use dtype::{DType, QInt8, QUInt8, Scalar, TensorElement};
pub use error::{Result, TensorError};
pub use indexing::{get_item, render_indices, set_item, set_item_scalar, Slice, TensorIndex};
pub use ops::advanced::{index, index_put, nonzero, AdvancedIndex};
pub use shape::Shape;
pub use strided::{IndexIter, SliceSpec, StridedLayout};
pub use tensor::Tensor;
