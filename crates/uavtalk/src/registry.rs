// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Object schema registry and instance cache.

use std::collections::{BTreeMap, HashMap};
#[cfg(feature = "xml")]
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;

use crate::definition::DefinitionNode;
use crate::schema::{HashConfig, ObjectSchema, SchemaError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown object id 0x{0:08X}")]
    UnknownObject(u32),

    #[error("invalid definition: {0}")]
    Schema(#[from] SchemaError),
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Most recent payload seen for one object instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceData {
    pub payload: Vec<u8>,
    pub updated_at: SystemTime,
}

/// Whether an identifier names an object's data or its metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Data,
    Metadata,
}

#[derive(Debug)]
struct Entry {
    schema: ObjectSchema,
    instances: BTreeMap<u16, InstanceData>,
    last_updated: Option<SystemTime>,
}

// ---------------------------------------------------------------------------
// SchemaRegistry
// ---------------------------------------------------------------------------

/// Schemas keyed by object identifier, plus the latest data per instance.
///
/// Single-instance objects keep one slot (instance 0) whatever instance id
/// arrives on the wire; multi-instance objects keep one slot per instance.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    config: HashConfig,
    entries: HashMap<u32, Entry>,
}

impl SchemaRegistry {
    pub fn new(config: HashConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
        }
    }

    /// Hashing configuration used for every registration.
    pub fn config(&self) -> HashConfig {
        self.config
    }

    /// Build a schema from a definition tree and store it.
    pub fn register(&mut self, definition: &DefinitionNode) -> Result<&ObjectSchema, SchemaError> {
        let schema = ObjectSchema::from_definition(definition, self.config)?;
        Ok(self.register_schema(schema))
    }

    /// Store an already built schema.
    ///
    /// An existing entry with the same identifier is replaced, cached data
    /// included.
    pub fn register_schema(&mut self, schema: ObjectSchema) -> &ObjectSchema {
        let id = schema.identifier();
        let entry = Entry {
            schema,
            instances: BTreeMap::new(),
            last_updated: None,
        };

        if let Some(old) = self.entries.insert(id, entry) {
            log::warn!(
                "object id 0x{:08X} registered twice ({} replaces {})",
                id,
                self.entries[&id].schema.name(),
                old.schema.name()
            );
        }

        &self.entries[&id].schema
    }

    pub fn lookup(&self, id: u32) -> Option<&ObjectSchema> {
        self.entries.get(&id).map(|e| &e.schema)
    }

    /// Resolve an identifier that may name a metadata variant (`id | 1`).
    pub fn resolve(&self, id: u32) -> Option<(&ObjectSchema, ObjectKind)> {
        if id & 1 == 0 {
            self.lookup(id).map(|s| (s, ObjectKind::Data))
        } else {
            self.lookup(id & !1).map(|s| (s, ObjectKind::Metadata))
        }
    }

    /// Cache the latest payload of one object instance.
    pub fn record_instance_data(
        &mut self,
        id: u32,
        instance_id: u16,
        payload: &[u8],
        timestamp: SystemTime,
    ) -> Result<(), RegistryError> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(RegistryError::UnknownObject(id))?;

        let slot = if entry.schema.is_single_instance() {
            0
        } else {
            instance_id
        };

        let data = entry.instances.entry(slot).or_insert_with(|| InstanceData {
            payload: Vec::new(),
            updated_at: timestamp,
        });
        data.payload.clear();
        data.payload.extend_from_slice(payload);
        data.updated_at = timestamp;
        entry.last_updated = Some(timestamp);

        Ok(())
    }

    /// Latest cached data of one instance.
    pub fn instance(&self, id: u32, instance_id: u16) -> Option<&InstanceData> {
        let entry = self.entries.get(&id)?;
        let slot = if entry.schema.is_single_instance() {
            0
        } else {
            instance_id
        };
        entry.instances.get(&slot)
    }

    /// Number of instances with cached data.
    pub fn instance_count(&self, id: u32) -> usize {
        self.entries.get(&id).map_or(0, |e| e.instances.len())
    }

    /// Time of the most recent update of any instance of the object.
    pub fn last_updated(&self, id: u32) -> Option<SystemTime> {
        self.entries.get(&id).and_then(|e| e.last_updated)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All schemas, sorted by identifier.
    pub fn schemas(&self) -> Vec<&ObjectSchema> {
        let mut schemas: Vec<_> = self.entries.values().map(|e| &e.schema).collect();
        schemas.sort_by_key(|s| s.identifier());
        schemas
    }
}

// ---------------------------------------------------------------------------
// Directory loading
// ---------------------------------------------------------------------------

/// Outcome of loading a definition directory.
#[cfg(feature = "xml")]
#[derive(Debug, Default)]
pub struct LoadReport {
    /// `(file, object id)` of every registered definition.
    pub registered: Vec<(PathBuf, u32)>,
    /// Files that could not be read, parsed or registered.
    pub failed: Vec<(PathBuf, String)>,
}

#[cfg(feature = "xml")]
impl SchemaRegistry {
    /// Register every `*.xml` file of a directory.
    ///
    /// A bad file is logged and skipped; only failing to list the directory
    /// is an error. Files are processed in name order.
    pub fn load_dir<P: AsRef<Path>>(&mut self, dir: P) -> std::io::Result<LoadReport> {
        let dir = dir.as_ref();
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
            })
            .collect();
        paths.sort();

        let mut report = LoadReport::default();
        for path in paths {
            let result = crate::definition::read_file(&path)
                .map_err(|e| e.to_string())
                .and_then(|tree| {
                    self.register(&tree)
                        .map(ObjectSchema::identifier)
                        .map_err(|e| e.to_string())
                });

            match result {
                Ok(id) => {
                    log::debug!("registered {} as 0x{:08X}", path.display(), id);
                    report.registered.push((path, id));
                }
                Err(err) => {
                    log::warn!("skipping definition {}: {}", path.display(), err);
                    report.failed.push((path, err));
                }
            }
        }

        log::info!(
            "loaded {} object definitions from {} ({} failed)",
            report.registered.len(),
            dir.display(),
            report.failed.len()
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDescriptor, FieldType};
    use std::time::Duration;

    fn schema(name: &str, single: bool) -> ObjectSchema {
        ObjectSchema::builder(name)
            .single_instance(single)
            .field(FieldDescriptor::new("Value", FieldType::Uint16))
            .build(HashConfig::default())
            .unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let mut reg = SchemaRegistry::default();
        let id = reg.register_schema(schema("Attitude", true)).identifier();

        assert_eq!(reg.len(), 1);
        assert_eq!(reg.lookup(id).unwrap().name(), "Attitude");
        assert!(reg.lookup(id ^ 2).is_none());
    }

    #[test]
    fn test_register_definition() {
        let mut reg = SchemaRegistry::default();
        let def = DefinitionNode::new("object")
            .attr("name", "Test")
            .attr("singleinstance", "true")
            .child(DefinitionNode::new("field").attr("name", "A").attr("type", "uint8"));

        let id = reg.register(&def).unwrap().identifier();
        assert_eq!(id, 0x6F6E_B07A);

        let bad = DefinitionNode::new("object").attr("name", "Bad").child(
            DefinitionNode::new("field").attr("name", "A").attr("type", "string"),
        );
        assert!(reg.register(&bad).is_err());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_resolve_metadata() {
        let mut reg = SchemaRegistry::default();
        let id = reg.register_schema(schema("Attitude", true)).identifier();

        assert_eq!(reg.resolve(id).map(|(_, k)| k), Some(ObjectKind::Data));
        assert_eq!(reg.resolve(id | 1).map(|(_, k)| k), Some(ObjectKind::Metadata));
        assert!(reg.lookup(id | 1).is_none());
        assert!(reg.resolve(id ^ 4).is_none());
    }

    #[test]
    fn test_record_single_instance() {
        let mut reg = SchemaRegistry::default();
        let id = reg.register_schema(schema("Attitude", true)).identifier();
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(10);
        let t1 = t0 + Duration::from_secs(1);

        assert!(reg.last_updated(id).is_none());

        reg.record_instance_data(id, 0, &[1, 2], t0).unwrap();
        reg.record_instance_data(id, 5, &[3, 4], t1).unwrap();

        assert_eq!(reg.instance_count(id), 1);
        let data = reg.instance(id, 0).unwrap();
        assert_eq!(data.payload, [3, 4]);
        assert_eq!(data.updated_at, t1);
        assert_eq!(reg.instance(id, 9).unwrap().payload, [3, 4]);
        assert_eq!(reg.last_updated(id), Some(t1));
    }

    #[test]
    fn test_record_multi_instance() {
        let mut reg = SchemaRegistry::default();
        let id = reg.register_schema(schema("Waypoint", false)).identifier();
        let now = SystemTime::now();

        reg.record_instance_data(id, 0, &[0xA], now).unwrap();
        reg.record_instance_data(id, 1, &[0xB], now).unwrap();

        assert_eq!(reg.instance_count(id), 2);
        assert_eq!(reg.instance(id, 0).unwrap().payload, [0xA]);
        assert_eq!(reg.instance(id, 1).unwrap().payload, [0xB]);
        assert!(reg.instance(id, 2).is_none());
    }

    #[test]
    fn test_record_unknown_object() {
        let mut reg = SchemaRegistry::default();
        assert_eq!(
            reg.record_instance_data(0x1234, 0, &[1], SystemTime::now()),
            Err(RegistryError::UnknownObject(0x1234))
        );
        assert!(reg.is_empty());
    }

    #[test]
    fn test_duplicate_identifier_overwrites() {
        let mut reg = SchemaRegistry::default();
        let id = reg.register_schema(schema("Attitude", true)).identifier();
        reg.record_instance_data(id, 0, &[1], SystemTime::now()).unwrap();

        reg.register_schema(schema("Attitude", true));
        assert_eq!(reg.len(), 1);
        assert!(reg.instance(id, 0).is_none());
    }

    #[test]
    fn test_schemas_sorted() {
        let mut reg = SchemaRegistry::default();
        for name in ["A", "B", "C", "D"] {
            reg.register_schema(schema(name, true));
        }
        let ids: Vec<u32> = reg.schemas().iter().map(|s| s.identifier()).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }
}
