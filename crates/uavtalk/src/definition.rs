// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Generic object definition tree.
//!
//! The registry consumes definitions as a plain element tree and never
//! looks at document syntax. With the `xml` feature (default) this module
//! also converts OpenPilot-style XML definition files into that tree:
//!
//! ```xml
//! <xml>
//!   <object name="FlightBatteryState" singleinstance="true" settings="false">
//!     <description>Battery status.</description>
//!     <field name="Voltage" units="V" type="float" elements="1"/>
//!     <field name="Status" type="enum" elements="1" options="Ok,Low,Critical"/>
//!   </object>
//! </xml>
//! ```

#[cfg(feature = "xml")]
use std::path::{Path, PathBuf};

#[cfg(feature = "xml")]
use thiserror::Error;

/// One element of a parsed definition document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinitionNode {
    /// Element name (`object`, `field`, `description`, ...).
    pub tag: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    /// Trimmed text content, if any.
    pub text: Option<String>,
    /// Child elements in document order.
    pub children: Vec<DefinitionNode>,
}

impl DefinitionNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn child(mut self, child: DefinitionNode) -> Self {
        self.children.push(child);
        self
    }

    /// Value of the first attribute called `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First child element called `tag`.
    pub fn first_child(&self, tag: &str) -> Option<&DefinitionNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// All child elements called `tag`.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a DefinitionNode> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

/// Errors reading a definition document.
#[cfg(feature = "xml")]
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse XML: {0}")]
    Xml(#[from] roxmltree::Error),
}

/// Parse an XML definition document into a tree rooted at its root element.
#[cfg(feature = "xml")]
pub fn parse_xml(content: &str) -> Result<DefinitionNode, DefinitionError> {
    let doc = roxmltree::Document::parse(content)?;
    Ok(convert(doc.root_element()))
}

/// Read and parse one XML definition file.
#[cfg(feature = "xml")]
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<DefinitionNode, DefinitionError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| DefinitionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_xml(&content)
}

#[cfg(feature = "xml")]
fn convert(node: roxmltree::Node<'_, '_>) -> DefinitionNode {
    let attributes = node
        .attributes()
        .map(|a| (a.name().to_string(), a.value().to_string()))
        .collect();

    let text: String = node
        .children()
        .filter(|c| c.is_text())
        .filter_map(|c| c.text())
        .collect();
    let text = text.trim();

    DefinitionNode {
        tag: node.tag_name().name().to_string(),
        attributes,
        text: (!text.is_empty()).then(|| text.to_string()),
        children: node.children().filter(|c| c.is_element()).map(convert).collect(),
    }
}
