//! Tensor operations beyond the view primitives.

pub mod advanced;
