// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed field descriptors.

use std::fmt;
use std::str::FromStr;

use super::SchemaError;

/// Primitive type of an object field.
///
/// The discriminants are the numeric codes folded into the object
/// identifier hash. Reordering them changes every identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum FieldType {
    Int8 = 0,
    Int16 = 1,
    Int32 = 2,
    Uint8 = 3,
    Uint16 = 4,
    Uint32 = 5,
    Float32 = 6,
    Enum = 7,
}

impl FieldType {
    /// All field types, in code order.
    pub const ALL: [FieldType; 8] = [
        FieldType::Int8,
        FieldType::Int16,
        FieldType::Int32,
        FieldType::Uint8,
        FieldType::Uint16,
        FieldType::Uint32,
        FieldType::Float32,
        FieldType::Enum,
    ];

    /// Numeric code used by the identifier hash.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Size of one element on the wire, in bytes.
    #[inline]
    #[must_use]
    pub const fn byte_width(self) -> usize {
        match self {
            FieldType::Int8 | FieldType::Uint8 | FieldType::Enum => 1,
            FieldType::Int16 | FieldType::Uint16 => 2,
            FieldType::Int32 | FieldType::Uint32 | FieldType::Float32 => 4,
        }
    }

    /// Canonical type name as written in definition files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FieldType::Int8 => "int8",
            FieldType::Int16 => "int16",
            FieldType::Int32 => "int32",
            FieldType::Uint8 => "uint8",
            FieldType::Uint16 => "uint16",
            FieldType::Uint32 => "uint32",
            FieldType::Float32 => "float",
            FieldType::Enum => "enum",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "int8" => Ok(FieldType::Int8),
            "int16" => Ok(FieldType::Int16),
            "int32" => Ok(FieldType::Int32),
            "uint8" => Ok(FieldType::Uint8),
            "uint16" => Ok(FieldType::Uint16),
            "uint32" => Ok(FieldType::Uint32),
            "float" | "float32" => Ok(FieldType::Float32),
            "enum" => Ok(FieldType::Enum),
            other => Err(SchemaError::UnknownFieldType(other.to_string())),
        }
    }
}

/// One typed field of an object definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    /// Field name, unique within the owning object.
    pub name: String,
    /// Number of array elements; 0 means unspecified (scalar).
    pub element_count: u32,
    /// Primitive type.
    pub field_type: FieldType,
    /// Enum tags in declaration order. Empty unless `field_type` is `Enum`.
    pub options: Vec<String>,
}

impl FieldDescriptor {
    /// Scalar field with no options.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            element_count: 0,
            field_type,
            options: Vec::new(),
        }
    }

    /// Enum field with the given tags.
    pub fn enumeration<I, S>(name: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            element_count: 0,
            field_type: FieldType::Enum,
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    /// Set the element count.
    #[must_use]
    pub fn elements(mut self, count: u32) -> Self {
        self.element_count = count;
        self
    }

    #[inline]
    #[must_use]
    pub fn byte_width(&self) -> usize {
        self.field_type.byte_width()
    }

    /// Bytes this field occupies in an object payload.
    #[must_use]
    pub fn size(&self) -> usize {
        self.byte_width() * self.element_count.max(1) as usize
    }
}
