//! Nested output document keyed by entity ancestry.

use crate::error::{CoreError, CoreResult};
use fsjson_codec::Key;
use serde_json::{Map, Value};
use std::io::Write;

/// Accumulates entities into `kind -> id_or_name -> { fields, child kinds }`.
///
/// An entity with ancestors is nested under each ancestor in turn. Writing
/// the same key twice merges the new fields into the existing node, with
/// later values replacing earlier ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentTree {
    root: Map<String, Value>,
    entities: u64,
}

impl DocumentTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `fields` into the node for `key`, creating ancestors as needed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the key is empty or a path step lands
    /// on a field that already holds a non-object value. The tree is left
    /// unchanged only in the empty-key case.
    pub fn insert(&mut self, key: &Key, fields: Map<String, Value>) -> CoreResult<()> {
        if key.path.is_empty() {
            return Err(CoreError::invalid_operation("entity key has an empty path"));
        }

        let mut node = &mut self.root;
        for element in &key.path {
            let by_id = child_object(node, &element.kind)?;
            node = child_object(by_id, &element.id_or_name.to_string())?;
        }
        node.extend(fields);
        self.entities += 1;
        Ok(())
    }

    /// Number of successful inserts.
    pub fn entity_count(&self) -> u64 {
        self.entities
    }

    /// Returns `true` if nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Returns the top-level map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Consumes the tree, returning it as a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    /// Serializes the tree as UTF-8 JSON.
    ///
    /// Pretty output uses a two-space indent.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_json<W: Write>(&self, writer: W, pretty: bool) -> CoreResult<()> {
        if pretty {
            serde_json::to_writer_pretty(writer, &self.root)?;
        } else {
            serde_json::to_writer(writer, &self.root)?;
        }
        Ok(())
    }
}

fn child_object<'a>(map: &'a mut Map<String, Value>, key: &str) -> CoreResult<&'a mut Map<String, Value>> {
    map.entry(key)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| {
            CoreError::invalid_operation(format!("\"{key}\" already holds a non-object value"))
        })
}
