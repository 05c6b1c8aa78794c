//! Data schemas.
//!
//! A [`DataType`] describes the layout of a value in GPU memory using WGSL's
//! host-shareable layout rules. Schemas are plain values; they carry no GPU state.
//!
//! Constructors mirror WGSL spelling:
//!
//! ```
//! use tandem_gpu::data as d;
//!
//! let positions = d::array_of(d::vec4f(), 24);
//! assert_eq!(positions.wgsl(), "array<vec4f, 24>");
//! assert_eq!(positions.size(), 384);
//! ```

use std::fmt;

/// Scalar component type.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Scalar {
    U32,
    I32,
    F32,
    /// Half precision. Requires `shader-f16` on the device.
    F16,
}

impl Scalar {
    /// WGSL scalar name (`u32`, `i32`, `f32`, `f16`).
    pub const fn wgsl(self) -> &'static str {
        match self {
            Scalar::U32 => "u32",
            Scalar::I32 => "i32",
            Scalar::F32 => "f32",
            Scalar::F16 => "f16",
        }
    }

    /// Suffix used by the predeclared vector aliases (`vec4f`, `vec2u`, ...).
    const fn suffix(self) -> char {
        match self {
            Scalar::U32 => 'u',
            Scalar::I32 => 'i',
            Scalar::F32 => 'f',
            Scalar::F16 => 'h',
        }
    }

    /// Size in bytes.
    pub const fn size(self) -> u64 {
        match self {
            Scalar::F16 => 2,
            _ => 4,
        }
    }
}

/// Layout description of a GPU value.
///
/// Vector widths are 2, 3 or 4; matrices are `f32` with 2–4 columns and rows.
/// Use the free constructors in this module rather than building variants by hand.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum DataType {
    Scalar(Scalar),
    Vector { scalar: Scalar, width: u8 },
    Matrix { columns: u8, rows: u8 },
    Array { element: Box<DataType>, count: u32 },
}

impl DataType {
    /// WGSL spelling of the type.
    pub fn wgsl(&self) -> String {
        match self {
            DataType::Scalar(s) => s.wgsl().to_string(),
            DataType::Vector { scalar, width } => format!("vec{width}{}", scalar.suffix()),
            DataType::Matrix { columns, rows } => format!("mat{columns}x{rows}f"),
            DataType::Array { element, count } => format!("array<{}, {count}>", element.wgsl()),
        }
    }

    /// Required alignment in bytes (WGSL `AlignOf`).
    pub fn align(&self) -> u64 {
        match self {
            DataType::Scalar(s) => s.size(),
            DataType::Vector { scalar, width } => match width {
                2 => 2 * scalar.size(),
                _ => 4 * scalar.size(),
            },
            DataType::Matrix { rows, .. } => column(*rows).align(),
            DataType::Array { element, .. } => element.align(),
        }
    }

    /// Size in bytes (WGSL `SizeOf`).
    pub fn size(&self) -> u64 {
        match self {
            DataType::Scalar(s) => s.size(),
            DataType::Vector { scalar, width } => u64::from(*width) * scalar.size(),
            DataType::Matrix { columns, rows } => u64::from(*columns) * column(*rows).stride(),
            DataType::Array { element, count } => u64::from(*count) * element.stride(),
        }
    }

    /// Size rounded up to alignment; the distance between consecutive array elements.
    pub fn stride(&self) -> u64 {
        round_up(self.align(), self.size())
    }

    /// Number of elements: the array length, or 1 for a non-array schema.
    pub fn element_count(&self) -> u32 {
        match self {
            DataType::Array { count, .. } => *count,
            _ => 1,
        }
    }

    /// Element schema: the array element type, or the schema itself.
    pub fn element_type(&self) -> &DataType {
        match self {
            DataType::Array { element, .. } => element,
            other => other,
        }
    }

    /// Scalar component type, if the schema is a scalar or a vector.
    pub fn scalar(&self) -> Option<Scalar> {
        match self {
            DataType::Scalar(s) | DataType::Vector { scalar: s, .. } => Some(*s),
            _ => None,
        }
    }

    /// Number of scalar components (1 for scalars, width for vectors).
    pub fn components(&self) -> Option<u8> {
        match self {
            DataType::Scalar(_) => Some(1),
            DataType::Vector { width, .. } => Some(*width),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, DataType::Array { .. })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wgsl())
    }
}

fn column(rows: u8) -> DataType {
    DataType::Vector { scalar: Scalar::F32, width: rows }
}

fn round_up(align: u64, n: u64) -> u64 {
    n.div_ceil(align) * align
}

pub fn u32() -> DataType {
    DataType::Scalar(Scalar::U32)
}

pub fn i32() -> DataType {
    DataType::Scalar(Scalar::I32)
}

pub fn f32() -> DataType {
    DataType::Scalar(Scalar::F32)
}

pub fn f16() -> DataType {
    DataType::Scalar(Scalar::F16)
}

/// Vector of `width` components. Panics if `width` is not 2, 3 or 4.
pub fn vector(scalar: Scalar, width: u8) -> DataType {
    assert!((2..=4).contains(&width), "vector width must be 2, 3 or 4, got {width}");
    DataType::Vector { scalar, width }
}

pub fn vec2u() -> DataType {
    vector(Scalar::U32, 2)
}

pub fn vec3u() -> DataType {
    vector(Scalar::U32, 3)
}

pub fn vec4u() -> DataType {
    vector(Scalar::U32, 4)
}

pub fn vec2i() -> DataType {
    vector(Scalar::I32, 2)
}

pub fn vec3i() -> DataType {
    vector(Scalar::I32, 3)
}

pub fn vec4i() -> DataType {
    vector(Scalar::I32, 4)
}

pub fn vec2f() -> DataType {
    vector(Scalar::F32, 2)
}

pub fn vec3f() -> DataType {
    vector(Scalar::F32, 3)
}

pub fn vec4f() -> DataType {
    vector(Scalar::F32, 4)
}

pub fn vec2h() -> DataType {
    vector(Scalar::F16, 2)
}

pub fn vec3h() -> DataType {
    vector(Scalar::F16, 3)
}

pub fn vec4h() -> DataType {
    vector(Scalar::F16, 4)
}

pub fn mat4x4f() -> DataType {
    DataType::Matrix { columns: 4, rows: 4 }
}

/// Fixed-size array of `count` elements.
pub fn array_of(element: DataType, count: u32) -> DataType {
    DataType::Array { element: Box::new(element), count }
}
