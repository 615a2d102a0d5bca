//! Element types of tensor values.

use std::error::Error;
use std::fmt;
use std::str::FromStr;

/// Data type of the elements of a tensor.
///
/// `Dynamic` means that the type is not yet known. It is compatible with
/// every other type.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum ElementType {
    Dynamic,
    Boolean,
    BF16,
    F16,
    F32,
    F64,
    I4,
    I8,
    I16,
    I32,
    I64,
    U1,
    U4,
    U8,
    U16,
    U32,
    U64,
}

impl ElementType {
    /// Return true if this is a signed or unsigned integer type.
    ///
    /// `Boolean` is not considered integral.
    pub fn is_integral(self) -> bool {
        use ElementType::*;
        matches!(self, I4 | I8 | I16 | I32 | I64 | U1 | U4 | U8 | U16 | U32 | U64)
    }

    /// Return true if this is a floating point type.
    pub fn is_real(self) -> bool {
        use ElementType::*;
        matches!(self, BF16 | F16 | F32 | F64)
    }

    pub fn is_dynamic(self) -> bool {
        self == ElementType::Dynamic
    }

    /// Return true if this type is integral or not yet known.
    ///
    /// Operands which carry indices accept types for which this is true.
    pub fn may_be_integral(self) -> bool {
        self.is_dynamic() || self.is_integral()
    }

    /// Size of one element in bits, or `None` for `Dynamic`.
    pub fn bit_width(self) -> Option<u32> {
        use ElementType::*;
        let bits = match self {
            Dynamic => return None,
            U1 => 1,
            I4 | U4 => 4,
            Boolean | I8 | U8 => 8,
            BF16 | F16 | I16 | U16 => 16,
            F32 | I32 | U32 => 32,
            F64 | I64 | U64 => 64,
        };
        Some(bits)
    }

    /// Return true if a value of type `self` may be used where `other` is
    /// expected.
    pub fn compatible(self, other: ElementType) -> bool {
        self.is_dynamic() || other.is_dynamic() || self == other
    }

    /// Return the more specific of two compatible types, or `None` if they
    /// are incompatible.
    pub fn merge(self, other: ElementType) -> Option<ElementType> {
        match (self, other) {
            (ElementType::Dynamic, other) | (other, ElementType::Dynamic) => Some(other),
            (a, b) if a == b => Some(a),
            _ => None,
        }
    }

    /// Lower-case name of this type, as used in diagnostics and graph files.
    pub fn name(self) -> &'static str {
        use ElementType::*;
        match self {
            Dynamic => "dynamic",
            Boolean => "boolean",
            BF16 => "bf16",
            F16 => "f16",
            F32 => "f32",
            F64 => "f64",
            I4 => "i4",
            I8 => "i8",
            I16 => "i16",
            I32 => "i32",
            I64 => "i64",
            U1 => "u1",
            U4 => "u4",
            U8 => "u8",
            U16 => "u16",
            U32 => "u32",
            U64 => "u64",
        }
    }

    const ALL: [ElementType; 17] = {
        use ElementType::*;
        [
            Dynamic, Boolean, BF16, F16, F32, F64, I4, I8, I16, I32, I64, U1, U4, U8, U16, U32,
            U64,
        ]
    };
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when parsing an unknown element type name.
#[derive(Clone, Debug, PartialEq)]
pub struct UnknownElementType(pub String);

impl fmt::Display for UnknownElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown element type \"{}\"", self.0)
    }
}

impl Error for UnknownElementType {}

impl FromStr for ElementType {
    type Err = UnknownElementType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|ty| ty.name() == s)
            .ok_or_else(|| UnknownElementType(s.to_string()))
    }
}
