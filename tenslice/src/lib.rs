//! TenSliceRS: NumPy-style tensor indexing and assignment for Rust.
//!
//! This facade re-exports the public surface of `tenslice-core`.

pub use tenslice_core::{
    get_item, index, index_put, nonzero, render_indices, set_item, set_item_scalar,
    AdvancedIndex, DType, Device, QInt8, QUInt8, Result, Scalar, Shape, Slice, SliceSpec,
    Tensor, TensorElement, TensorError, TensorIndex,
};
