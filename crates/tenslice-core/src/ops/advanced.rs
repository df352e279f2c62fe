//! Advanced (tensor-valued) indexing primitives.
//!
//! [`index`] gathers into a new tensor and [`index_put`] scatters in place,
//! both driven by an ordered per-dimension list of index tensors. A `None`
//! entry is a hole: that dimension passes through unconstrained. Boolean
//! masks span as many source dimensions as they have and are lowered to
//! integer index tensors before dispatch.

use crate::dtype::TensorElement;
use crate::strided::IndexIter;
use crate::{Result, Shape, Tensor, TensorError};

/// One pending advanced index, positioned at the source dimension it acts on.
#[derive(Debug, Clone)]
pub enum AdvancedIndex {
    /// Integer index tensor; broadcasts together with the other index
    /// tensors in the list.
    Long(Tensor<i64>),
    /// Boolean mask consuming as many source dimensions as its rank.
    Mask(Tensor<bool>),
}

/// Coordinates of the true elements of a mask, as a `[count, rank]` matrix
/// in row-major order.
pub fn nonzero(mask: &Tensor<bool>) -> Result<Tensor<i64>> {
    let rank = mask.rank();
    let mut coords = Vec::new();
    let mut count = 0usize;
    for (coord, value) in IndexIter::new(mask.dims()).zip(mask.to_vec()) {
        if value {
            count += 1;
            coords.extend(coord.iter().map(|&c| c as i64));
        }
    }
    Tensor::from_vec(coords, &[count, rank])
}

/// Lower masks to integer index tensors and pad the list with holes up to
/// the source rank, so entries align one-to-one with source dimensions.
fn expand_index_list<T: TensorElement>(
    src: &Tensor<T>,
    indices: &[Option<AdvancedIndex>],
) -> Result<Vec<Option<Tensor<i64>>>> {
    let src_dims = src.dims();
    let mut expanded: Vec<Option<Tensor<i64>>> = Vec::new();

    for entry in indices {
        match entry {
            None => expanded.push(None),
            Some(AdvancedIndex::Long(t)) => expanded.push(Some(t.alias())),
            Some(AdvancedIndex::Mask(mask)) => {
                let dim = expanded.len();
                let span = mask.rank();
                let covered = src_dims.get(dim..dim + span).unwrap_or(&[]);
                if mask.dims() != covered {
                    return Err(TensorError::shape_mismatch(
                        "mask index",
                        format!("{covered:?}"),
                        format!("{:?}", mask.dims()),
                    ));
                }
                let nz = nonzero(mask)?;
                for j in 0..span {
                    expanded.push(Some(nz.select(1, j as i64)?));
                }
            }
        }
    }

    if expanded.len() > src_dims.len() {
        return Err(TensorError::too_many_indices(
            expanded.len(),
            src_dims.len(),
        ));
    }
    while expanded.len() < src_dims.len() {
        expanded.push(None);
    }
    Ok(expanded)
}

/// Materialized index tensor for one source dimension: its shape and its
/// wrap-normalized values.
struct DimIndex {
    dims: Vec<usize>,
    values: Vec<i64>,
}

impl DimIndex {
    /// Value at a coordinate of the common broadcast shape, under
    /// leading-size-1 alignment.
    fn value_at(&self, bcoord: &[usize]) -> i64 {
        let lead = bcoord.len() - self.dims.len();
        let mut flat = 0usize;
        let mut stride = 1usize;
        for j in (0..self.dims.len()).rev() {
            let c = if self.dims[j] == 1 { 0 } else { bcoord[lead + j] };
            flat += c * stride;
            stride *= self.dims[j];
        }
        self.values[flat]
    }
}

/// Shared shape bookkeeping for gather and scatter: where the broadcast
/// index dims land in the result, and where each hole dim passes through.
struct IndexPlan {
    src_dims: Vec<usize>,
    index: Vec<Option<DimIndex>>,
    broadcast: Vec<usize>,
    out_shape: Vec<usize>,
    b_start: usize,
    hole_pos: Vec<usize>,
}

fn build_plan<T: TensorElement>(
    src: &Tensor<T>,
    indices: &[Option<AdvancedIndex>],
) -> Result<IndexPlan> {
    let expanded = expand_index_list(src, indices)?;
    let src_dims = src.dims().to_vec();

    let mut index: Vec<Option<DimIndex>> = Vec::with_capacity(expanded.len());
    let mut broadcast = Shape::scalar();
    let mut adv_dims = Vec::new();

    for (d, entry) in expanded.iter().enumerate() {
        let t = match entry {
            None => {
                index.push(None);
                continue;
            }
            Some(t) => t,
        };

        let size = src_dims[d];
        let mut values = Vec::with_capacity(t.numel());
        for raw in t.to_vec() {
            let v = if raw < 0 { raw + size as i64 } else { raw };
            if v < 0 || v >= size as i64 {
                return Err(TensorError::index_out_of_bounds(raw, d, size));
            }
            values.push(v);
        }

        let dims = t.dims().to_vec();
        broadcast = broadcast
            .broadcast_shape(&Shape::from_slice(&dims))
            .ok_or_else(|| {
                TensorError::shape_mismatch(
                    "index",
                    format!("index tensors broadcastable with {broadcast}"),
                    format!("{dims:?}"),
                )
            })?;
        adv_dims.push(d);
        index.push(Some(DimIndex { dims, values }));
    }

    if adv_dims.is_empty() {
        return Err(TensorError::invalid_argument(
            "index",
            "at least one index tensor is required",
        ));
    }

    let first = adv_dims[0];
    let last = adv_dims[adv_dims.len() - 1];
    let adjacent = last - first + 1 == adv_dims.len();
    let broadcast = broadcast.to_vec();

    // Adjacent index tensors keep their position in the result; tensors
    // separated by holes move the broadcast dims to the front.
    let mut out_shape = Vec::new();
    let mut hole_pos = vec![usize::MAX; src_dims.len()];
    let b_start;
    if adjacent {
        for d in 0..first {
            hole_pos[d] = out_shape.len();
            out_shape.push(src_dims[d]);
        }
        b_start = out_shape.len();
        out_shape.extend(&broadcast);
        for d in (last + 1)..src_dims.len() {
            hole_pos[d] = out_shape.len();
            out_shape.push(src_dims[d]);
        }
    } else {
        b_start = 0;
        out_shape.extend(&broadcast);
        for d in 0..src_dims.len() {
            if index[d].is_none() {
                hole_pos[d] = out_shape.len();
                out_shape.push(src_dims[d]);
            }
        }
    }

    Ok(IndexPlan {
        src_dims,
        index,
        broadcast,
        out_shape,
        b_start,
        hole_pos,
    })
}

impl IndexPlan {
    fn src_coord(&self, out_coord: &[usize], src_coord: &mut [usize]) {
        let bcoord = &out_coord[self.b_start..self.b_start + self.broadcast.len()];
        for d in 0..self.src_dims.len() {
            src_coord[d] = match &self.index[d] {
                Some(idx) => idx.value_at(bcoord) as usize,
                None => out_coord[self.hole_pos[d]],
            };
        }
    }
}

/// Gather `src` elements addressed by the index list into a new tensor.
pub fn index<T: TensorElement>(
    src: &Tensor<T>,
    indices: &[Option<AdvancedIndex>],
) -> Result<Tensor<T>> {
    let plan = build_plan(src, indices)?;

    let storage = src.read_storage();
    let mut out = Vec::with_capacity(plan.out_shape.iter().product());
    let mut src_coord = vec![0usize; plan.src_dims.len()];
    for out_coord in IndexIter::new(&plan.out_shape) {
        plan.src_coord(&out_coord, &mut src_coord);
        out.push(storage[src.layout.linear_offset(&src_coord)].clone());
    }
    drop(storage);

    Tensor::from_vec(out, &plan.out_shape)
}

/// Scatter `value`, broadcast against the selection shape, into the `src`
/// positions addressed by the index list.
pub fn index_put<T: TensorElement>(
    src: &Tensor<T>,
    indices: &[Option<AdvancedIndex>],
    value: &Tensor<T>,
) -> Result<()> {
    let plan = build_plan(src, indices)?;

    let value = value.expand(&plan.out_shape).map_err(|_| {
        TensorError::shape_mismatch(
            "index_put",
            format!("{:?}", plan.out_shape),
            value.shape(),
        )
    })?;
    // Writing under the same lock the value reads from would deadlock.
    let value = if src.shares_storage_with(&value) {
        Tensor::from_vec(value.to_vec(), value.dims())?
    } else {
        value
    };

    let value_storage = value.read_storage();
    let mut storage = src.write_storage();
    let mut src_coord = vec![0usize; plan.src_dims.len()];
    for out_coord in IndexIter::new(&plan.out_shape) {
        plan.src_coord(&out_coord, &mut src_coord);
        storage[src.layout.linear_offset(&src_coord)] =
            value_storage[value.layout.linear_offset(&out_coord)].clone();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long(values: Vec<i64>) -> Option<AdvancedIndex> {
        let len = values.len();
        Some(AdvancedIndex::Long(
            Tensor::from_vec(values, &[len]).unwrap(),
        ))
    }

    #[test]
    fn test_nonzero() {
        let mask = Tensor::from_vec(vec![true, false, false, true], &[2, 2]).unwrap();
        let nz = nonzero(&mask).unwrap();
        assert_eq!(nz.dims(), &[2, 2]);
        assert_eq!(nz.to_vec(), vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_gather_single_dim() {
        let src = Tensor::<i32>::from_vec((0..4).collect(), &[4]).unwrap();
        let out = index(&src, &[long(vec![0, 2, -1])]).unwrap();
        assert_eq!(out.to_vec(), vec![0, 2, 3]);
        assert!(!out.shares_storage_with(&src));
    }

    #[test]
    fn test_gather_with_leading_hole() {
        let src = Tensor::<i32>::from_vec((0..6).collect(), &[2, 3]).unwrap();
        let out = index(&src, &[None, long(vec![0, 2])]).unwrap();
        assert_eq!(out.dims(), &[2, 2]);
        assert_eq!(out.to_vec(), vec![0, 2, 3, 5]);
    }

    #[test]
    fn test_gather_separated_indices_move_to_front() {
        let src = Tensor::<i32>::from_vec((0..12).collect(), &[2, 3, 2]).unwrap();
        let out = index(&src, &[long(vec![0, 1]), None, long(vec![0, 1])]).unwrap();
        assert_eq!(out.dims(), &[2, 3]);
        assert_eq!(out.to_vec(), vec![0, 2, 4, 7, 9, 11]);
    }

    #[test]
    fn test_gather_broadcasts_index_tensors() {
        let src = Tensor::<i32>::from_vec((0..6).collect(), &[2, 3]).unwrap();
        let rows = Tensor::from_vec(vec![0i64, 1], &[2, 1]).unwrap();
        let cols = Tensor::from_vec(vec![0i64, 2], &[2]).unwrap();
        let out = index(
            &src,
            &[
                Some(AdvancedIndex::Long(rows)),
                Some(AdvancedIndex::Long(cols)),
            ],
        )
        .unwrap();
        assert_eq!(out.dims(), &[2, 2]);
        assert_eq!(out.to_vec(), vec![0, 2, 3, 5]);
    }

    #[test]
    fn test_gather_mask_spans_dims() {
        let src = Tensor::<i32>::from_vec(vec![1, 2, 3, 4], &[2, 2]).unwrap();
        let mask = Tensor::from_vec(vec![true, false, false, true], &[2, 2]).unwrap();
        let out = index(&src, &[Some(AdvancedIndex::Mask(mask))]).unwrap();
        assert_eq!(out.to_vec(), vec![1, 4]);
    }

    #[test]
    fn test_gather_mask_shape_mismatch() {
        let src = Tensor::<i32>::from_vec(vec![1, 2, 3, 4], &[2, 2]).unwrap();
        let mask = Tensor::from_vec(vec![true, false, true], &[3]).unwrap();
        assert!(index(&src, &[Some(AdvancedIndex::Mask(mask))]).is_err());
    }

    #[test]
    fn test_gather_out_of_range() {
        let src = Tensor::<i32>::from_vec((0..4).collect(), &[4]).unwrap();
        assert!(index(&src, &[long(vec![4])]).is_err());
        assert!(index(&src, &[long(vec![-5])]).is_err());
    }

    #[test]
    fn test_gather_incompatible_index_shapes() {
        let src = Tensor::<i32>::from_vec((0..6).collect(), &[2, 3]).unwrap();
        assert!(index(&src, &[long(vec![0, 1]), long(vec![0, 1, 2])]).is_err());
    }

    #[test]
    fn test_scatter_broadcast_value() {
        let src = Tensor::<i32>::zeros(&[2, 3]);
        let value = Tensor::from_scalar(9);
        index_put(&src, &[None, long(vec![0, 2])], &value).unwrap();
        assert_eq!(src.to_vec(), vec![9, 0, 9, 9, 0, 9]);
    }

    #[test]
    fn test_scatter_empty_selection() {
        let src = Tensor::<i32>::from_vec(vec![1, 2], &[2]).unwrap();
        index_put(&src, &[long(vec![])], &Tensor::from_scalar(7)).unwrap();
        assert_eq!(src.to_vec(), vec![1, 2]);
    }

    #[test]
    fn test_scatter_value_aliasing_source() {
        let src = Tensor::<i32>::from_vec((0..4).collect(), &[4]).unwrap();
        let value = src.alias();
        index_put(&src, &[long(vec![0, 1, 2, 3])], &value).unwrap();
        assert_eq!(src.to_vec(), vec![0, 1, 2, 3]);
    }
}
