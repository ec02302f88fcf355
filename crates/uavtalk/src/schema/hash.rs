// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Object identifier hashing.
//!
//! UAVTalk names every object type by a 32-bit identifier derived from its
//! definition with a shift-add-XOR rolling hash. Two endpoints only
//! understand each other if they derive the same identifiers, so everything
//! in this module is part of the wire contract.
//!
//! # Algorithm
//!
//! ```text
//! hash = 0
//! fold(name)
//! fold(is_settings), fold(is_single_instance)
//! for field in canonical order:
//!     fold(field.name), fold(field.element_count), fold(field.type_code)
//!     if enum: fold(option) for each option
//! id = hash & 0xFFFF_FFFE
//!
//! fold(v)  : hash ^= (hash << 5) + (hash >> 2) + v     (u32, wrapping)
//! fold(str): fold(c as u32) for each char
//! ```

use super::{FieldDescriptor, ObjectSchema};

/// Mask applied to the final hash. Bit 0 is reserved for metadata objects.
pub const ID_MASK: u32 = 0xFFFF_FFFE;

/// Direction of the width-based canonical field sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FieldOrder {
    /// Narrowest fields first.
    #[default]
    Ascending,
    /// Widest fields first.
    Descending,
}

/// Mapping of the `settings` / `singleinstance` definition attributes onto
/// the two schema flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FlagMapping {
    /// `settings` -> is_settings, `singleinstance` -> is_single_instance.
    #[default]
    Direct,
    /// `settings` -> is_single_instance, `singleinstance` -> is_settings.
    Swapped,
}

impl FlagMapping {
    /// Map raw attribute values to `(is_settings, is_single_instance)`.
    #[must_use]
    pub fn apply(self, settings_attr: bool, single_instance_attr: bool) -> (bool, bool) {
        match self {
            FlagMapping::Direct => (settings_attr, single_instance_attr),
            FlagMapping::Swapped => (single_instance_attr, settings_attr),
        }
    }
}

/// Hashing configuration shared by every endpoint of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HashConfig {
    #[cfg_attr(feature = "serde", serde(default))]
    pub field_order: FieldOrder,
    #[cfg_attr(feature = "serde", serde(default))]
    pub flag_mapping: FlagMapping,
}

/// Sort fields into canonical order (stable, by byte width).
pub fn canonical_sort(fields: &mut [FieldDescriptor], order: FieldOrder) {
    match order {
        FieldOrder::Ascending => fields.sort_by_key(FieldDescriptor::byte_width),
        FieldOrder::Descending => {
            fields.sort_by(|a, b| b.byte_width().cmp(&a.byte_width()));
        }
    }
}

/// Rolling shift-add-XOR hasher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentifierHasher {
    hash: u32,
}

impl IdentifierHasher {
    #[must_use]
    pub const fn new() -> Self {
        Self { hash: 0 }
    }

    /// Fold one integer into the hash.
    #[inline]
    pub fn fold_u32(&mut self, value: u32) -> &mut Self {
        let h = self.hash;
        self.hash = h ^ (h << 5).wrapping_add(h >> 2).wrapping_add(value);
        self
    }

    #[inline]
    pub fn fold_bool(&mut self, value: bool) -> &mut Self {
        self.fold_u32(u32::from(value))
    }

    /// Fold every character of `s`, left to right, as its code point.
    pub fn fold_str(&mut self, s: &str) -> &mut Self {
        for c in s.chars() {
            self.fold_u32(c as u32);
        }
        self
    }

    /// Raw running hash, bit 0 not cleared.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.hash
    }

    /// Final identifier with the metadata bit cleared.
    #[inline]
    #[must_use]
    pub const fn finish(&self) -> u32 {
        self.hash & ID_MASK
    }

    /// Compute the identifier of a schema whose fields are already in
    /// canonical order.
    #[must_use]
    pub fn identifier(schema: &ObjectSchema) -> u32 {
        let mut hasher = Self::new();
        hasher
            .fold_str(schema.name())
            .fold_bool(schema.is_settings())
            .fold_bool(schema.is_single_instance());

        for field in schema.fields() {
            hasher
                .fold_str(&field.name)
                .fold_u32(field.element_count)
                .fold_u32(field.field_type.code());

            if field.field_type == super::FieldType::Enum {
                for option in &field.options {
                    hasher.fold_str(option);
                }
            }
        }

        hasher.finish()
    }
}
