//! Datastore entity model.
//!
//! These types mirror the `EntityProto` message closely; interpretation of
//! meanings into typed values happens in [`crate::value`].

use std::fmt;

/// Identifier of one key path element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdOrName {
    /// Numeric id.
    Id(i64),
    /// String name.
    Name(String),
    /// Neither id nor name was set.
    Incomplete,
}

impl fmt::Display for IdOrName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => f.write_str(name),
            Self::Incomplete => f.write_str("null"),
        }
    }
}

/// One `(kind, id or name)` step of a key path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathElement {
    /// Entity kind.
    pub kind: String,
    /// Identifier within the kind.
    pub id_or_name: IdOrName,
}

impl PathElement {
    /// Creates an element with a numeric id.
    pub fn with_id(kind: impl Into<String>, id: i64) -> Self {
        Self {
            kind: kind.into(),
            id_or_name: IdOrName::Id(id),
        }
    }

    /// Creates an element with a string name.
    pub fn with_name(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id_or_name: IdOrName::Name(name.into()),
        }
    }
}

/// Entity key: an ancestor path ending in the entity itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Key {
    /// Application id.
    pub app: String,
    /// Namespace, if any.
    pub namespace: Option<String>,
    /// Path from the root ancestor to this entity.
    pub path: Vec<PathElement>,
}

impl Key {
    /// Creates a key from a path.
    pub fn new(app: impl Into<String>, path: Vec<PathElement>) -> Self {
        Self {
            app: app.into(),
            namespace: None,
            path,
        }
    }

    /// The last path element.
    pub fn leaf(&self) -> Option<&PathElement> {
        self.path.last()
    }

    /// Kind of the entity this key names.
    pub fn kind(&self) -> Option<&str> {
        self.leaf().map(|element| element.kind.as_str())
    }

    /// Identifier of the entity this key names.
    pub fn id_or_name(&self) -> Option<&IdOrName> {
        self.leaf().map(|element| &element.id_or_name)
    }

    /// The key of the parent entity, if this key has ancestors.
    pub fn parent(&self) -> Option<Key> {
        if self.path.len() < 2 {
            return None;
        }
        Some(Key {
            app: self.app.clone(),
            namespace: self.namespace.clone(),
            path: self.path[..self.path.len() - 1].to_vec(),
        })
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, element) in self.path.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}:{}", element.kind, element.id_or_name)?;
        }
        Ok(())
    }
}

/// Semantic hint attached to a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Meaning {
    /// Date and time in microseconds since the epoch.
    GdWhen,
    /// Geographic point.
    GeoRssPoint,
    /// Unindexed binary data.
    Blob,
    /// Unindexed long text.
    Text,
    /// Indexed short binary data.
    ByteString,
    /// Serialized embedded entity.
    EntityProto,
    /// Explicitly empty list.
    EmptyList,
    /// Any other meaning code.
    Other(i32),
}

impl Meaning {
    /// Converts a wire value to a meaning.
    pub fn from_i32(code: i32) -> Self {
        match code {
            7 => Self::GdWhen,
            9 => Self::GeoRssPoint,
            14 => Self::Blob,
            15 => Self::Text,
            16 => Self::ByteString,
            19 => Self::EntityProto,
            24 => Self::EmptyList,
            other => Self::Other(other),
        }
    }

    /// Converts the meaning to its wire value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::GdWhen => 7,
            Self::GeoRssPoint => 9,
            Self::Blob => 14,
            Self::Text => 15,
            Self::ByteString => 16,
            Self::EntityProto => 19,
            Self::EmptyList => 24,
            Self::Other(code) => code,
        }
    }
}

/// A user value. Only the fields the export uses are kept.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserValue {
    /// Email address.
    pub email: String,
    /// Authentication domain.
    pub auth_domain: String,
    /// Optional nickname.
    pub nickname: Option<String>,
}

/// Raw property value as stored on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// No value field was set.
    Null,
    /// Integer.
    Int64(i64),
    /// Boolean.
    Bool(bool),
    /// Byte string; text, blobs, and embedded entities all use this.
    String(Vec<u8>),
    /// Double.
    Double(f64),
    /// Point with `x` as latitude and `y` as longitude.
    Point {
        /// Latitude.
        x: f64,
        /// Longitude.
        y: f64,
    },
    /// User.
    User(UserValue),
    /// Reference to another entity.
    Reference(Key),
}

/// A named property.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name.
    pub name: String,
    /// Semantic hint.
    pub meaning: Option<Meaning>,
    /// Whether this is one element of a list property.
    pub multiple: bool,
    /// Stored value.
    pub value: PropertyValue,
    /// `false` for properties stored in the raw (unindexed) list.
    pub indexed: bool,
}

impl Property {
    /// Creates an indexed, single-valued property without a meaning.
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            meaning: None,
            multiple: false,
            value,
            indexed: true,
        }
    }

    /// Sets the meaning.
    #[must_use]
    pub fn meaning(mut self, meaning: Meaning) -> Self {
        self.meaning = Some(meaning);
        self
    }

    /// Marks the property as one element of a list.
    #[must_use]
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// Marks the property as unindexed.
    #[must_use]
    pub fn unindexed(mut self) -> Self {
        self.indexed = false;
        self
    }
}

/// A decoded entity.
///
/// Embedded entities usually carry no key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entity {
    /// Entity key.
    pub key: Option<Key>,
    /// Indexed and raw properties in stream order.
    pub properties: Vec<Property>,
}

impl Entity {
    /// Creates an entity with the given key and no properties.
    pub fn new(key: Key) -> Self {
        Self {
            key: Some(key),
            properties: Vec::new(),
        }
    }

    /// Appends a property.
    #[must_use]
    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child_key() -> Key {
        Key::new(
            "app",
            vec![
                PathElement::with_name("User", "alice"),
                PathElement::with_id("Order", 7),
            ],
        )
    }

    #[test]
    fn key_accessors() {
        let key = child_key();
        assert_eq!(key.kind(), Some("Order"));
        assert_eq!(key.id_or_name(), Some(&IdOrName::Id(7)));

        let parent = key.parent().unwrap();
        assert_eq!(parent.kind(), Some("User"));
        assert!(parent.parent().is_none());
    }

    #[test]
    fn key_display() {
        assert_eq!(child_key().to_string(), "User:alice/Order:7");
    }

    #[test]
    fn incomplete_id_displays_null() {
        assert_eq!(IdOrName::Incomplete.to_string(), "null");
    }

    #[test]
    fn meaning_codes() {
        for code in [7, 9, 14, 15, 16, 19, 24, 3] {
            assert_eq!(Meaning::from_i32(code).as_i32(), code);
        }
        assert_eq!(Meaning::from_i32(19), Meaning::EntityProto);
    }
}
