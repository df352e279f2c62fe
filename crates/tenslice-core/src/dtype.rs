use half::{bf16, f16};
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Runtime element type of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum DType {
    Float16,
    BFloat16,
    Float32,
    Float64,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Bool,
    QInt8,
    QUInt8,
}

impl DType {
    /// Size of one element in bytes.
    pub fn size(&self) -> usize {
        match self {
            DType::Float16 | DType::BFloat16 | DType::Int16 | DType::UInt16 => 2,
            DType::Float32 | DType::Int32 | DType::UInt32 => 4,
            DType::Float64 | DType::Int64 | DType::UInt64 => 8,
            DType::Int8 | DType::UInt8 | DType::Bool | DType::QInt8 | DType::QUInt8 => 1,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DType::Float16 => "float16",
            DType::BFloat16 => "bfloat16",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
            DType::Int8 => "int8",
            DType::Int16 => "int16",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::UInt8 => "uint8",
            DType::UInt16 => "uint16",
            DType::UInt32 => "uint32",
            DType::UInt64 => "uint64",
            DType::Bool => "bool",
            DType::QInt8 => "qint8",
            DType::QUInt8 => "quint8",
        }
    }

    pub fn is_floating(&self) -> bool {
        matches!(
            self,
            DType::Float16 | DType::BFloat16 | DType::Float32 | DType::Float64
        )
    }

    pub fn is_integral(&self, include_bool: bool) -> bool {
        match self {
            DType::Int8
            | DType::Int16
            | DType::Int32
            | DType::Int64
            | DType::UInt8
            | DType::UInt16
            | DType::UInt32
            | DType::UInt64 => true,
            DType::Bool => include_bool,
            _ => false,
        }
    }

    pub fn is_quantized(&self) -> bool {
        matches!(self, DType::QInt8 | DType::QUInt8)
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A dtype-erased numeric literal, used where a value must cross element
/// types (scalar assignment in particular).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    pub fn to_f64(self) -> f64 {
        match self {
            Scalar::Int(v) => v as f64,
            Scalar::Float(v) => v,
            Scalar::Bool(v) => {
                if v {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    pub fn to_i64(self) -> i64 {
        match self {
            Scalar::Int(v) => v,
            Scalar::Float(v) => v as i64,
            Scalar::Bool(v) => v as i64,
        }
    }

    pub fn to_bool(self) -> bool {
        match self {
            Scalar::Int(v) => v != 0,
            Scalar::Float(v) => v != 0.0,
            Scalar::Bool(v) => v,
        }
    }
}

macro_rules! scalar_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Scalar {
            fn from(v: $t) -> Self {
                Scalar::Int(v as i64)
            }
        })*
    };
}

scalar_from_int!(i8, i16, i32, i64, u8, u16, u32, usize);

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar::Float(v as f64)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

/// Element type of a quantized int8 tensor.
///
/// The affine parameters (scale, zero point) live outside this crate; the
/// wrapper exists so quantized destinations are distinguishable at the type
/// level, which the scalar-assignment path keys on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QInt8(pub i8);

/// Element type of a quantized unsigned int8 tensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QUInt8(pub u8);

impl std::fmt::Display for QInt8 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for QUInt8 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ties a Rust element type to its runtime `DType` and defines how a
/// dtype-erased `Scalar` lands in that type.
pub trait TensorElement: Clone + Default + Send + Sync + 'static {
    fn dtype() -> DType;
    fn from_scalar(v: Scalar) -> Self;
}

macro_rules! tensor_element_int {
    ($($t:ty => $d:expr),*) => {
        $(impl TensorElement for $t {
            fn dtype() -> DType {
                $d
            }

            fn from_scalar(v: Scalar) -> Self {
                v.to_i64() as $t
            }
        })*
    };
}

tensor_element_int!(
    i8 => DType::Int8,
    i16 => DType::Int16,
    i32 => DType::Int32,
    i64 => DType::Int64,
    u8 => DType::UInt8,
    u16 => DType::UInt16,
    u32 => DType::UInt32,
    u64 => DType::UInt64
);

impl TensorElement for f32 {
    fn dtype() -> DType {
        DType::Float32
    }

    fn from_scalar(v: Scalar) -> Self {
        v.to_f64() as f32
    }
}

impl TensorElement for f64 {
    fn dtype() -> DType {
        DType::Float64
    }

    fn from_scalar(v: Scalar) -> Self {
        v.to_f64()
    }
}

impl TensorElement for f16 {
    fn dtype() -> DType {
        DType::Float16
    }

    fn from_scalar(v: Scalar) -> Self {
        f16::from_f64(v.to_f64())
    }
}

impl TensorElement for bf16 {
    fn dtype() -> DType {
        DType::BFloat16
    }

    fn from_scalar(v: Scalar) -> Self {
        bf16::from_f64(v.to_f64())
    }
}

impl TensorElement for bool {
    fn dtype() -> DType {
        DType::Bool
    }

    fn from_scalar(v: Scalar) -> Self {
        v.to_bool()
    }
}

impl TensorElement for QInt8 {
    fn dtype() -> DType {
        DType::QInt8
    }

    fn from_scalar(v: Scalar) -> Self {
        QInt8(v.to_f64().round().clamp(i8::MIN as f64, i8::MAX as f64) as i8)
    }
}

impl TensorElement for QUInt8 {
    fn dtype() -> DType {
        DType::QUInt8
    }

    fn from_scalar(v: Scalar) -> Self {
        QUInt8(v.to_f64().round().clamp(0.0, u8::MAX as f64) as u8)
    }
}
