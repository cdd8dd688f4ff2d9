// SPDX-License-Identifier: MIT OR Apache-2.0
//! Primitive element types that can flow through ports.
//!
//! Every port is parameterised by a [`PortValue`]. The set of port value types
//! is closed: each one carries a [`ValueKind`] tag, and that tag is what the
//! name-based port lookup compares when heterogeneous nodes are wired
//! together.

use crate::port::{AnyPort, PortCell};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Type tag for a port element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// `bool`
    Bool,
    /// `i8`
    I8,
    /// `i16`
    I16,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
    /// `f32`
    F32,
    /// `f64`
    F64,
}

impl ValueKind {
    /// All value kinds, in declaration order
    pub const ALL: [ValueKind; 11] = [
        Self::Bool,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::F32,
        Self::F64,
    ];

    /// Name used as the prefix of node kind names (`Int` in `IntAdd`)
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::I8 => "SByte",
            Self::I16 => "Short",
            Self::I32 => "Int",
            Self::I64 => "Long",
            Self::U8 => "Byte",
            Self::U16 => "UShort",
            Self::U32 => "UInt",
            Self::U64 => "ULong",
            Self::F32 => "Float",
            Self::F64 => "Double",
        }
    }

    /// Whether arithmetic is defined for this kind
    pub fn is_numeric(self) -> bool {
        !matches!(self, Self::Bool)
    }

    /// Whether this is a floating point kind
    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Whether bitwise operators are defined for this kind
    pub fn is_bitwise(self) -> bool {
        !self.is_float()
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Widened intermediate representation used by checked conversions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    /// Boolean
    Bool(bool),
    /// Any integer, widened
    Int(i128),
    /// Any float, widened
    Float(f64),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

/// A value could not be represented in the target kind
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    /// Value is outside the target range
    #[error("{value} is out of range for {target}")]
    OutOfRange {
        /// Offending value
        value: Scalar,
        /// Requested kind
        target: ValueKind,
    },

    /// NaN or infinity converted to an integer kind
    #[error("{value} is not finite and cannot be converted to {target}")]
    NotFinite {
        /// Offending value
        value: Scalar,
        /// Requested kind
        target: ValueKind,
    },

    /// Only 0 and 1 convert to `bool`
    #[error("{value} is not a boolean (expected 0 or 1)")]
    NotBoolean {
        /// Offending value
        value: Scalar,
    },
}

/// Element type of a port.
///
/// Implemented for the primitive numeric types and `bool`. The wrap/unwrap
/// pair maps a typed port cell to and from its [`AnyPort`] variant, which is
/// how name-based lookups recover a typed handle without runtime type
/// reflection.
pub trait PortValue: Copy + Default + PartialEq + PartialOrd + fmt::Debug + fmt::Display + 'static {
    /// Type tag of this element type
    const KIND: ValueKind;

    /// Erase a typed port cell
    fn wrap(cell: Rc<PortCell<Self>>) -> AnyPort;

    /// Recover a typed port cell if the variant matches
    fn unwrap(port: &AnyPort) -> Option<&Rc<PortCell<Self>>>;

    /// Widen to the conversion intermediate
    fn to_scalar(self) -> Scalar;

    /// Checked narrowing from the conversion intermediate
    fn from_scalar(value: Scalar) -> Result<Self, ConversionError>;
}

/// Checked conversion between two port value types.
///
/// Float to integer truncates toward zero, integer to float rounds to the
/// nearest representable value. Anything that would wrap or saturate fails.
pub fn convert<A: PortValue, B: PortValue>(value: A) -> Result<B, ConversionError> {
    B::from_scalar(value.to_scalar())
}

// Integral float values inside this bound are exact in i128.
const FLOAT_TO_INT_BOUND: f64 = 1.0e38;

macro_rules! impl_integer_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl PortValue for $ty {
                const KIND: ValueKind = ValueKind::$variant;

                fn wrap(cell: Rc<PortCell<Self>>) -> AnyPort {
                    AnyPort::$variant(cell)
                }

                fn unwrap(port: &AnyPort) -> Option<&Rc<PortCell<Self>>> {
                    match port {
                        AnyPort::$variant(cell) => Some(cell),
                        _ => None,
                    }
                }

                fn to_scalar(self) -> Scalar {
                    Scalar::Int(self as i128)
                }

                fn from_scalar(value: Scalar) -> Result<Self, ConversionError> {
                    let out_of_range = || ConversionError::OutOfRange { value, target: Self::KIND };
                    match value {
                        Scalar::Bool(b) => Ok(Self::from(b)),
                        Scalar::Int(i) => <$ty>::try_from(i).map_err(|_| out_of_range()),
                        Scalar::Float(f) => {
                            if !f.is_finite() {
                                return Err(ConversionError::NotFinite { value, target: Self::KIND });
                            }
                            let truncated = f.trunc();
                            if truncated.abs() >= FLOAT_TO_INT_BOUND {
                                return Err(out_of_range());
                            }
                            <$ty>::try_from(truncated as i128).map_err(|_| out_of_range())
                        }
                    }
                }
            }
        )*
    };
}

impl_integer_value! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
}

impl PortValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn wrap(cell: Rc<PortCell<Self>>) -> AnyPort {
        AnyPort::Bool(cell)
    }

    fn unwrap(port: &AnyPort) -> Option<&Rc<PortCell<Self>>> {
        match port {
            AnyPort::Bool(cell) => Some(cell),
            _ => None,
        }
    }

    fn to_scalar(self) -> Scalar {
        Scalar::Bool(self)
    }

    fn from_scalar(value: Scalar) -> Result<Self, ConversionError> {
        match value {
            Scalar::Bool(b) => Ok(b),
            Scalar::Int(0) => Ok(false),
            Scalar::Int(1) => Ok(true),
            Scalar::Float(f) if f == 0.0 => Ok(false),
            Scalar::Float(f) if f == 1.0 => Ok(true),
            _ => Err(ConversionError::NotBoolean { value }),
        }
    }
}

impl PortValue for f32 {
    const KIND: ValueKind = ValueKind::F32;

    fn wrap(cell: Rc<PortCell<Self>>) -> AnyPort {
        AnyPort::F32(cell)
    }

    fn unwrap(port: &AnyPort) -> Option<&Rc<PortCell<Self>>> {
        match port {
            AnyPort::F32(cell) => Some(cell),
            _ => None,
        }
    }

    fn to_scalar(self) -> Scalar {
        Scalar::Float(f64::from(self))
    }

    fn from_scalar(value: Scalar) -> Result<Self, ConversionError> {
        match value {
            Scalar::Bool(b) => Ok(if b { 1.0 } else { 0.0 }),
            Scalar::Int(i) => Ok(i as f32),
            Scalar::Float(f) => {
                let narrowed = f as f32;
                if f.is_finite() && narrowed.is_infinite() {
                    return Err(ConversionError::OutOfRange { value, target: Self::KIND });
                }
                Ok(narrowed)
            }
        }
    }
}

impl PortValue for f64 {
    const KIND: ValueKind = ValueKind::F64;

    fn wrap(cell: Rc<PortCell<Self>>) -> AnyPort {
        AnyPort::F64(cell)
    }

    fn unwrap(port: &AnyPort) -> Option<&Rc<PortCell<Self>>> {
        match port {
            AnyPort::F64(cell) => Some(cell),
            _ => None,
        }
    }

    fn to_scalar(self) -> Scalar {
        Scalar::Float(self)
    }

    fn from_scalar(value: Scalar) -> Result<Self, ConversionError> {
        match value {
            Scalar::Bool(b) => Ok(if b { 1.0 } else { 0.0 }),
            Scalar::Int(i) => Ok(i as f64),
            Scalar::Float(f) => Ok(f),
        }
    }
}

/// Expand `$body` once per value kind, with `$T` bound to the matching
/// Rust type. An optional `else` arm handles the kinds not listed.
macro_rules! dispatch_kind {
    (@arms $kind:expr, $T:ident => $body:expr; $($variant:ident: $ty:ty),*;) => {
        match $kind {
            $($crate::value::ValueKind::$variant => {
                #[allow(dead_code)]
                type $T = $ty;
                $body
            })*
        }
    };
    (@arms $kind:expr, $T:ident => $body:expr; $($variant:ident: $ty:ty),*; else $fallback:expr) => {
        match $kind {
            $($crate::value::ValueKind::$variant => {
                #[allow(dead_code)]
                type $T = $ty;
                $body
            })*
            _ => $fallback,
        }
    };
    (@numeric $kind:expr, $T:ident => $body:expr, else $fallback:expr) => {
        $crate::value::dispatch_kind!(@arms $kind, $T => $body;
            I8: i8, I16: i16, I32: i32, I64: i64,
            U8: u8, U16: u16, U32: u32, U64: u64, F32: f32, F64: f64;
            else $fallback)
    };
    (@bitwise $kind:expr, $T:ident => $body:expr, else $fallback:expr) => {
        $crate::value::dispatch_kind!(@arms $kind, $T => $body;
            Bool: bool, I8: i8, I16: i16, I32: i32, I64: i64,
            U8: u8, U16: u16, U32: u32, U64: u64;
            else $fallback)
    };
    (@float $kind:expr, $T:ident => $body:expr, else $fallback:expr) => {
        $crate::value::dispatch_kind!(@arms $kind, $T => $body;
            F32: f32, F64: f64;
            else $fallback)
    };
    ($kind:expr, $T:ident => $body:expr) => {
        $crate::value::dispatch_kind!(@arms $kind, $T => $body;
            Bool: bool, I8: i8, I16: i16, I32: i32, I64: i64,
            U8: u8, U16: u16, U32: u32, U64: u64, F32: f32, F64: f64;)
    };
}

pub(crate) use dispatch_kind;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_narrowing_is_checked() {
        assert_eq!(convert::<i32, u8>(200), Ok(200u8));
        assert!(matches!(
            convert::<i32, u8>(300),
            Err(ConversionError::OutOfRange { target: ValueKind::U8, .. })
        ));
        assert!(convert::<i64, u64>(-1).is_err());
        assert_eq!(convert::<u64, i64>(5), Ok(5));
    }

    #[test]
    fn test_float_to_int_truncates_toward_zero() {
        assert_eq!(convert::<f32, i32>(7.9), Ok(7));
        assert_eq!(convert::<f64, i32>(-7.9), Ok(-7));
        assert_eq!(convert::<f64, u8>(255.99), Ok(255));
        assert!(convert::<f64, u8>(256.0).is_err());
        assert!(convert::<f64, i64>(9.3e18).is_err());
        assert!(convert::<f64, i64>(1.0e300).is_err());
    }

    #[test]
    fn test_non_finite_to_int_fails() {
        assert!(matches!(
            convert::<f32, i32>(f32::NAN),
            Err(ConversionError::NotFinite { .. })
        ));
        assert!(matches!(
            convert::<f64, u16>(f64::INFINITY),
            Err(ConversionError::NotFinite { .. })
        ));
    }

    #[test]
    fn test_double_to_float_range() {
        assert_eq!(convert::<f64, f32>(1.5), Ok(1.5f32));
        assert!(convert::<f64, f32>(1.0e300).is_err());
        assert_eq!(convert::<f64, f32>(3.4028235e38), Ok(f32::MAX));
        assert_eq!(convert::<f64, f32>(-3.4028235e38), Ok(f32::MIN));
        assert!(convert::<f64, f32>(-1.0e39).is_err());
        assert!(convert::<f64, f32>(f64::INFINITY).unwrap().is_infinite());
        assert!(convert::<f64, f32>(f64::NAN).unwrap().is_nan());
    }

    #[test]
    fn test_bool_conversions() {
        assert_eq!(convert::<bool, i32>(true), Ok(1));
        assert_eq!(convert::<bool, f64>(false), Ok(0.0));
        assert_eq!(convert::<u8, bool>(1), Ok(true));
        assert_eq!(convert::<f32, bool>(0.0), Ok(false));
        assert!(matches!(
            convert::<i32, bool>(2),
            Err(ConversionError::NotBoolean { .. })
        ));
    }

    #[test]
    fn test_int_to_float_rounds() {
        assert_eq!(convert::<i32, f64>(-3), Ok(-3.0));
        assert_eq!(convert::<u64, f32>(16_777_217), Ok(16_777_216.0));
    }

    #[test]
    fn test_dispatch_kind() {
        fn kind_of(kind: ValueKind) -> ValueKind {
            dispatch_kind!(kind, T => T::KIND)
        }
        for kind in ValueKind::ALL {
            assert_eq!(kind_of(kind), kind);
        }

        let float_count = ValueKind::ALL
            .iter()
            .filter(|kind| dispatch_kind!(@float **kind, T => T::KIND.is_float(), else false))
            .count();
        assert_eq!(float_count, 2);
    }
}
