// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UAVTalk protocol engine.
//!
//! UAVTalk is the telemetry protocol spoken between OpenPilot-family flight
//! controllers and their ground control stations. Every object type is
//! described by a definition file; both ends derive the same 32-bit object
//! identifier from that definition and use it to tag frames on the wire.
//!
//! # Features
//!
//! - **Schemas**: typed field descriptors, canonical field order and
//!   identifier hashing ([`schema`])
//! - **Registry**: schemas keyed by identifier with a cache of the latest
//!   payload per instance ([`registry`])
//! - **Codec**: frame decoding with sync, length and CRC-8 validation
//!   ([`frame`], [`crc`])
//! - **Definitions**: generic definition tree and XML loader ([`definition`])
//!
//! # Quick Start
//!
//! ```
//! use uavtalk::{decode_frame, Frame, FrameType, HashConfig, SchemaRegistry};
//! use uavtalk::definition::DefinitionNode;
//!
//! let mut registry = SchemaRegistry::new(HashConfig::default());
//! let def = DefinitionNode::new("object")
//!     .attr("name", "Test")
//!     .attr("singleinstance", "true")
//!     .child(DefinitionNode::new("field").attr("name", "A").attr("type", "uint8"));
//! let id = registry.register(&def).unwrap().identifier();
//!
//! let bytes = Frame::new(FrameType::Object, id, 0, vec![42]).encode().unwrap();
//! let frame = decode_frame(&bytes).unwrap();
//! assert!(registry.lookup(frame.object_id).is_some());
//! ```

pub mod crc;
pub mod definition;
pub mod frame;
pub mod registry;
pub mod schema;

pub use frame::{decode_frame, encode_frame, Frame, FrameType, RejectReason};
pub use registry::{InstanceData, ObjectKind, RegistryError, SchemaRegistry};
#[cfg(feature = "xml")]
pub use registry::LoadReport;
pub use schema::{
    FieldDescriptor, FieldOrder, FieldType, FlagMapping, HashConfig, IdentifierHasher,
    ObjectSchema, SchemaError,
};
