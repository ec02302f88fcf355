// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UAVTalk object schemas.
//!
//! An [`ObjectSchema`] is built once from a parsed definition, its fields
//! are put into canonical order and its identifier is derived with
//! [`IdentifierHasher`]. After that the schema never changes.

mod field;
mod hash;
mod object;

pub use field::{FieldDescriptor, FieldType};
pub use hash::{canonical_sort, FieldOrder, FlagMapping, HashConfig, IdentifierHasher, ID_MASK};
pub use object::ObjectSchema;

use thiserror::Error;

/// Errors raised while building a schema from a definition.
///
/// Each one is fatal for the definition it came from only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("expected <object> definition, found <{0}>")]
    NotAnObject(String),

    #[error("<{element}> is missing attribute `{attribute}`")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("unknown field type `{0}`")]
    UnknownFieldType(String),

    #[error("field `{field}` has invalid element count `{value}`")]
    InvalidElements { field: String, value: String },

    #[error("duplicate field `{0}`")]
    DuplicateField(String),

    #[error("enum field `{0}` declares no options")]
    EmptyEnum(String),
}
