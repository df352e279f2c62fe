use super::Tensor;
use crate::dtype::TensorElement;
use std::fmt;

fn write_level<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    data: &[T],
    dims: &[usize],
    offset: usize,
) -> fmt::Result {
    match dims {
        [] => write!(f, "{}", data[offset]),
        [len] => {
            write!(f, "[")?;
            for i in 0..*len {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", data[offset + i])?;
            }
            write!(f, "]")
        }
        [len, rest @ ..] => {
            let inner: usize = rest.iter().product();
            write!(f, "[")?;
            for i in 0..*len {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_level(f, data, rest, offset + i * inner)?;
            }
            write!(f, "]")
        }
    }
}

/// Nested bracket rendering of the element data, for diagnostics.
impl<T: TensorElement + fmt::Display> fmt::Display for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.to_vec();
        write_level(f, &data, self.dims(), 0)
    }
}
