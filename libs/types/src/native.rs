//! # Native Type Table
//!
//! Fixed mapping from MAVLink field kinds to wire width and signedness.
//! The table is a process-wide constant: every method is a `match` the
//! compiler folds away, so schema walks never touch a lookup structure.
//!
//! | Kind   | Width | Signed |
//! |--------|-------|--------|
//! | INT8   | 1     | yes    |
//! | UINT8  | 1     | no     |
//! | INT16  | 2     | yes    |
//! | UINT16 | 2     | no     |
//! | INT32  | 4     | yes    |
//! | UINT32 | 4     | no     |
//! | INT64  | 8     | yes    |
//! | UINT64 | 8     | no     |
//! | FLOAT  | 4     | yes    |
//! | DOUBLE | 8     | yes    |
//! | CHAR   | 1     | no     |

use crate::error::{SchemaError, SchemaResult};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Field kind of a MAVLink payload element
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum NativeType {
    Int8 = 0,
    UInt8 = 1,
    Int16 = 2,
    UInt16 = 3,
    Int32 = 4,
    UInt32 = 5,
    Int64 = 6,
    UInt64 = 7,
    Float = 8,
    Double = 9,
    Char = 10,
}

impl NativeType {
    /// Every kind, in discriminant order
    pub const ALL: [NativeType; 11] = [
        NativeType::Int8,
        NativeType::UInt8,
        NativeType::Int16,
        NativeType::UInt16,
        NativeType::Int32,
        NativeType::UInt32,
        NativeType::Int64,
        NativeType::UInt64,
        NativeType::Float,
        NativeType::Double,
        NativeType::Char,
    ];

    /// Encoded width of a single element in bytes
    #[inline]
    pub const fn width(self) -> usize {
        match self {
            NativeType::Int8 | NativeType::UInt8 | NativeType::Char => 1,
            NativeType::Int16 | NativeType::UInt16 => 2,
            NativeType::Int32 | NativeType::UInt32 | NativeType::Float => 4,
            NativeType::Int64 | NativeType::UInt64 | NativeType::Double => 8,
        }
    }

    #[inline]
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            NativeType::Int8
                | NativeType::Int16
                | NativeType::Int32
                | NativeType::Int64
                | NativeType::Float
                | NativeType::Double
        )
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, NativeType::Float | NativeType::Double)
    }

    /// C type name as written in MAVLink XML dictionaries
    pub const fn c_name(self) -> &'static str {
        match self {
            NativeType::Int8 => "int8_t",
            NativeType::UInt8 => "uint8_t",
            NativeType::Int16 => "int16_t",
            NativeType::UInt16 => "uint16_t",
            NativeType::Int32 => "int32_t",
            NativeType::UInt32 => "uint32_t",
            NativeType::Int64 => "int64_t",
            NativeType::UInt64 => "uint64_t",
            NativeType::Float => "float",
            NativeType::Double => "double",
            NativeType::Char => "char",
        }
    }

    /// Parse a dictionary declaration such as `uint16_t` or `char[16]`
    ///
    /// Returns the element kind and the array length (1 for scalars).
    pub fn parse_declaration(declaration: &str) -> SchemaResult<(NativeType, usize)> {
        let declaration = declaration.trim();
        match declaration.split_once('[') {
            None => Ok((declaration.parse()?, 1)),
            Some((base, rest)) => {
                let length = rest
                    .strip_suffix(']')
                    .and_then(|n| n.trim().parse::<usize>().ok())
                    .filter(|n| *n > 0)
                    .ok_or_else(|| SchemaError::InvalidArraySuffix {
                        type_name: declaration.to_string(),
                    })?;
                Ok((base.trim().parse()?, length))
            }
        }
    }
}

impl FromStr for NativeType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "int8_t" | "int8" => NativeType::Int8,
            // mavlink_version is a uint8_t the generator fills with the dialect version
            "uint8_t" | "uint8" | "uint8_t_mavlink_version" => NativeType::UInt8,
            "int16_t" | "int16" => NativeType::Int16,
            "uint16_t" | "uint16" => NativeType::UInt16,
            "int32_t" | "int32" => NativeType::Int32,
            "uint32_t" | "uint32" => NativeType::UInt32,
            "int64_t" | "int64" => NativeType::Int64,
            "uint64_t" | "uint64" => NativeType::UInt64,
            "float" => NativeType::Float,
            "double" => NativeType::Double,
            "char" => NativeType::Char,
            other => {
                return Err(SchemaError::UnknownNativeType {
                    name: other.to_string(),
                })
            }
        };
        Ok(kind)
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.c_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_table() {
        let widths: Vec<usize> = NativeType::ALL.iter().map(|t| t.width()).collect();
        assert_eq!(widths, vec![1, 1, 2, 2, 4, 4, 8, 8, 4, 8, 1]);
    }

    #[test]
    fn test_signedness() {
        assert!(NativeType::Int8.is_signed());
        assert!(!NativeType::UInt64.is_signed());
        assert!(NativeType::Float.is_signed());
        assert!(!NativeType::Char.is_signed());
    }

    #[test]
    fn test_discriminant_round_trip() {
        for kind in NativeType::ALL {
            let raw: u8 = kind.into();
            assert_eq!(NativeType::try_from(raw).unwrap(), kind);
        }
        assert!(NativeType::try_from(11u8).is_err());
    }

    #[test]
    fn test_parse_c_names() {
        for kind in NativeType::ALL {
            assert_eq!(kind.c_name().parse::<NativeType>().unwrap(), kind);
        }
        assert_eq!(
            "uint8_t_mavlink_version".parse::<NativeType>().unwrap(),
            NativeType::UInt8
        );
        assert!(matches!(
            "bool".parse::<NativeType>(),
            Err(SchemaError::UnknownNativeType { .. })
        ));
    }

    #[test]
    fn test_parse_declaration() {
        assert_eq!(
            NativeType::parse_declaration("char[16]").unwrap(),
            (NativeType::Char, 16)
        );
        assert_eq!(
            NativeType::parse_declaration(" float ").unwrap(),
            (NativeType::Float, 1)
        );
        assert!(matches!(
            NativeType::parse_declaration("uint8_t[0]"),
            Err(SchemaError::InvalidArraySuffix { .. })
        ));
        assert!(matches!(
            NativeType::parse_declaration("uint8_t[4"),
            Err(SchemaError::InvalidArraySuffix { .. })
        ));
    }
}
