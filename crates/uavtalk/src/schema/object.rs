// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Object schema construction.

use std::collections::HashSet;

use super::hash::{canonical_sort, HashConfig, IdentifierHasher};
use super::{FieldDescriptor, FieldType, SchemaError};
use crate::definition::DefinitionNode;

/// One UAVTalk object definition.
///
/// Fields are stored in canonical order and the identifier is computed at
/// construction; neither changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSchema {
    name: String,
    is_settings: bool,
    is_single_instance: bool,
    description: String,
    fields: Vec<FieldDescriptor>,
    identifier: u32,
}

impl ObjectSchema {
    /// Start building a schema by hand.
    pub fn builder(name: impl Into<String>) -> ObjectSchemaBuilder {
        ObjectSchemaBuilder {
            name: name.into(),
            is_settings: false,
            is_single_instance: false,
            description: String::new(),
            fields: Vec::new(),
        }
    }

    /// Build a schema from a parsed definition tree.
    ///
    /// `node` is either the `<object>` element itself or a document root
    /// whose first `<object>` child is used.
    pub fn from_definition(node: &DefinitionNode, config: HashConfig) -> Result<Self, SchemaError> {
        let object = if node.tag == "object" {
            node
        } else {
            node.first_child("object")
                .ok_or_else(|| SchemaError::NotAnObject(node.tag.clone()))?
        };

        let name = object
            .attribute("name")
            .ok_or(SchemaError::MissingAttribute {
                element: "object",
                attribute: "name",
            })?;

        let (is_settings, is_single_instance) = config.flag_mapping.apply(
            parse_flag(object.attribute("settings")),
            parse_flag(object.attribute("singleinstance")),
        );

        let description = object
            .first_child("description")
            .and_then(DefinitionNode::text)
            .unwrap_or_default();

        let fields = object
            .children_named("field")
            .map(field_from_definition)
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = Self::builder(name)
            .settings(is_settings)
            .single_instance(is_single_instance)
            .description(description);
        builder.fields = fields;
        builder.build(config)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_settings(&self) -> bool {
        self.is_settings
    }

    pub fn is_single_instance(&self) -> bool {
        self.is_single_instance
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Fields in canonical order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Object identifier (bit 0 always clear).
    #[inline]
    pub fn identifier(&self) -> u32 {
        self.identifier
    }

    /// Identifier of this object's metadata variant.
    #[inline]
    pub fn metadata_identifier(&self) -> u32 {
        self.identifier | 1
    }

    /// Expected size of one instance's data payload.
    pub fn payload_size(&self) -> usize {
        self.fields.iter().map(FieldDescriptor::size).sum()
    }
}

/// Hand-built schema, see [`ObjectSchema::builder`].
#[derive(Debug, Clone)]
pub struct ObjectSchemaBuilder {
    name: String,
    is_settings: bool,
    is_single_instance: bool,
    description: String,
    fields: Vec<FieldDescriptor>,
}

impl ObjectSchemaBuilder {
    #[must_use]
    pub fn settings(mut self, value: bool) -> Self {
        self.is_settings = value;
        self
    }

    #[must_use]
    pub fn single_instance(mut self, value: bool) -> Self {
        self.is_single_instance = value;
        self
    }

    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    /// Append a field in declaration order.
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Validate, sort the fields and derive the identifier.
    pub fn build(self, config: HashConfig) -> Result<ObjectSchema, SchemaError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
            if field.field_type == FieldType::Enum && field.options.is_empty() {
                return Err(SchemaError::EmptyEnum(field.name.clone()));
            }
        }

        let mut fields = self.fields;
        for field in &mut fields {
            if field.field_type != FieldType::Enum {
                field.options.clear();
            }
        }
        canonical_sort(&mut fields, config.field_order);

        let mut schema = ObjectSchema {
            name: self.name,
            is_settings: self.is_settings,
            is_single_instance: self.is_single_instance,
            description: self.description,
            fields,
            identifier: 0,
        };
        schema.identifier = IdentifierHasher::identifier(&schema);
        Ok(schema)
    }
}

fn parse_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn field_from_definition(node: &DefinitionNode) -> Result<FieldDescriptor, SchemaError> {
    let name = node.attribute("name").ok_or(SchemaError::MissingAttribute {
        element: "field",
        attribute: "name",
    })?;

    let field_type: FieldType = node
        .attribute("type")
        .ok_or(SchemaError::MissingAttribute {
            element: "field",
            attribute: "type",
        })?
        .parse()?;

    let element_count = match node.attribute("elements") {
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| SchemaError::InvalidElements {
                field: name.to_string(),
                value: raw.to_string(),
            })?,
        None => element_names(node).len() as u32,
    };

    let options = match node.attribute("options") {
        Some(list) => split_list(list),
        None => node
            .first_child("options")
            .map(|o| {
                o.children_named("option")
                    .filter_map(DefinitionNode::text)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
    };

    Ok(FieldDescriptor {
        name: name.to_string(),
        element_count,
        field_type,
        options,
    })
}

fn element_names(node: &DefinitionNode) -> Vec<String> {
    if let Some(list) = node.attribute("elementnames") {
        return split_list(list);
    }
    node.first_child("elementnames")
        .map(|e| {
            e.children_named("elementname")
                .filter_map(DefinitionNode::text)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
