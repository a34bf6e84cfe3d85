/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! ActivityStreams documents as stored by `fedstore_core`.
//!
//! Only the properties the collection store and the delivery queue look at are
//! typed. Everything else rides along in a flattened property map so that a
//! document survives a storage round trip unchanged.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use url::Url;

mod vocabulary;

pub use vocabulary::{classify, TypeClass};

pub const ACTIVITY_STREAMS_CONTEXT: &str = "https://www.w3.org/ns/activitystreams";
pub const PUBLIC_ADDRESS: &str = "https://www.w3.org/ns/activitystreams#Public";

#[derive(Debug, thiserror::Error)]
pub enum VocabError {
    #[error("document is not a JSON object")]
    NotAnObject,
    #[error("document has no string `type` discriminator")]
    MissingType,
    #[error("unrecognized document type `{0}`")]
    UnknownType(String),
    #[error("expected `{expected}` document, found `{found}`")]
    UnexpectedType { expected: &'static str, found: String },
    #[error("malformed `{kind}` document: {source}")]
    Shape {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Any ActivityStreams document, resolved by its `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ActivityStreams {
    OrderedCollection(OrderedCollection),
    OrderedCollectionPage(OrderedCollectionPage),
    Actor(Actor),
    Activity(Object),
    Object(Object),
    Link(Object),
    /// A type outside the known vocabulary. Only built explicitly; decoding
    /// an unrecognized `type` is an error.
    Unknown(Object),
}

/// The `type` discriminator. JSON-LD allows a list; the first entry the
/// vocabulary recognizes is the primary type, and the list is written back
/// as it was read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeName {
    One(String),
    Many(Vec<String>),
}

impl TypeName {
    pub fn primary(&self) -> &str {
        match self {
            Self::One(kind) => kind,
            Self::Many(kinds) => primary_of(kinds.iter().map(String::as_str)).unwrap_or_default(),
        }
    }
}

impl From<&str> for TypeName {
    fn from(kind: &str) -> Self {
        Self::One(kind.to_string())
    }
}

/// A collection member: either a bare IRI or an embedded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CollectionItem {
    Iri(Url),
    Embedded(Box<ActivityStreams>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedCollection {
    #[serde(rename = "type")]
    pub kind: TypeName,
    pub id: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered_items: Option<Vec<CollectionItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<Url>,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedCollectionPage {
    #[serde(rename = "type")]
    pub kind: TypeName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered_items: Option<Vec<CollectionItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<Url>,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    #[serde(rename = "type")]
    pub kind: TypeName,
    pub id: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inbox: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbox: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub following: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liked: Option<Url>,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

/// Activities, plain objects and links share this loose shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    #[serde(rename = "type")]
    pub kind: TypeName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Url>,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl ActivityStreams {
    /// Resolves a generic JSON map to its concrete variant by `type`.
    pub fn from_value(value: Value) -> Result<Self, VocabError> {
        let kind = type_of(&value)?.to_string();
        let Some(class) = classify(&kind) else {
            return Err(VocabError::UnknownType(kind));
        };
        let shape = |source| VocabError::Shape {
            kind: kind.clone(),
            source,
        };
        Ok(match class {
            TypeClass::OrderedCollection => {
                Self::OrderedCollection(serde_json::from_value(value).map_err(shape)?)
            }
            TypeClass::OrderedCollectionPage => {
                Self::OrderedCollectionPage(serde_json::from_value(value).map_err(shape)?)
            }
            TypeClass::Actor => Self::Actor(serde_json::from_value(value).map_err(shape)?),
            TypeClass::Activity => Self::Activity(serde_json::from_value(value).map_err(shape)?),
            TypeClass::Object => Self::Object(serde_json::from_value(value).map_err(shape)?),
            TypeClass::Link => Self::Link(serde_json::from_value(value).map_err(shape)?),
        })
    }

    /// Serializes to a key-ordered JSON map.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::OrderedCollection(c) => c.kind.primary(),
            Self::OrderedCollectionPage(p) => p.kind.primary(),
            Self::Actor(a) => a.kind.primary(),
            Self::Activity(o) | Self::Object(o) | Self::Link(o) | Self::Unknown(o) => {
                o.kind.primary()
            }
        }
    }

    pub fn id(&self) -> Option<&Url> {
        match self {
            Self::OrderedCollection(c) => Some(&c.id),
            Self::OrderedCollectionPage(p) => p.id.as_ref(),
            Self::Actor(a) => Some(&a.id),
            Self::Activity(o) | Self::Object(o) | Self::Link(o) | Self::Unknown(o) => o.id.as_ref(),
        }
    }

    fn properties(&self) -> &Map<String, Value> {
        match self {
            Self::OrderedCollection(c) => &c.properties,
            Self::OrderedCollectionPage(p) => &p.properties,
            Self::Actor(a) => &a.properties,
            Self::Activity(o) | Self::Object(o) | Self::Link(o) | Self::Unknown(o) => &o.properties,
        }
    }

    /// True when `to` or `cc` addresses the public collection.
    pub fn is_public(&self) -> bool {
        let props = self.properties();
        ["to", "cc"]
            .iter()
            .filter_map(|k| props.get(*k))
            .any(|v| addresses(v).any(|s| s == PUBLIC_ADDRESS))
    }

    /// Every addressed IRI across `to`, `bto`, `cc`, `bcc` and `audience`,
    /// minus the public collection. Duplicates removed, order kept.
    pub fn recipients(&self) -> Vec<Url> {
        let props = self.properties();
        let mut out: Vec<Url> = Vec::new();
        for key in ["to", "bto", "cc", "bcc", "audience"] {
            let Some(v) = props.get(key) else { continue };
            for s in addresses(v) {
                if s == PUBLIC_ADDRESS {
                    continue;
                }
                if let Ok(u) = Url::parse(s) {
                    if !out.contains(&u) {
                        out.push(u);
                    }
                }
            }
        }
        out
    }
}

impl<'de> Deserialize<'de> for ActivityStreams {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

impl OrderedCollection {
    pub fn new(id: Url) -> Self {
        Self {
            kind: "OrderedCollection".into(),
            id,
            total_items: None,
            ordered_items: None,
            first: None,
            last: None,
            properties: Map::new(),
        }
    }

    /// IRIs of the ordered items, skipping embedded documents without an id.
    pub fn item_iris(&self) -> Vec<Url> {
        item_iris(self.ordered_items.as_deref())
    }

    pub fn from_value(value: Value) -> Result<Self, VocabError> {
        match ActivityStreams::from_value(value)? {
            ActivityStreams::OrderedCollection(c) => Ok(c),
            other => Err(unexpected("OrderedCollection", &other)),
        }
    }
}

impl OrderedCollectionPage {
    pub fn new() -> Self {
        Self {
            kind: "OrderedCollectionPage".into(),
            id: None,
            part_of: None,
            start_index: None,
            total_items: None,
            ordered_items: None,
            next: None,
            prev: None,
            properties: Map::new(),
        }
    }

    pub fn item_iris(&self) -> Vec<Url> {
        item_iris(self.ordered_items.as_deref())
    }

    pub fn len(&self) -> usize {
        self.ordered_items.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn from_value(value: Value) -> Result<Self, VocabError> {
        match ActivityStreams::from_value(value)? {
            ActivityStreams::OrderedCollectionPage(p) => Ok(p),
            other => Err(unexpected("OrderedCollectionPage", &other)),
        }
    }
}

impl Default for OrderedCollectionPage {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor {
    pub fn new(kind: &str, id: Url) -> Self {
        Self {
            kind: kind.into(),
            id,
            preferred_username: None,
            inbox: None,
            outbox: None,
            followers: None,
            following: None,
            liked: None,
            properties: Map::new(),
        }
    }

    /// `endpoints.sharedInbox`, when the actor advertises one.
    pub fn shared_inbox(&self) -> Option<Url> {
        self.properties
            .get("endpoints")
            .and_then(|e| e.get("sharedInbox"))
            .and_then(Value::as_str)
            .and_then(|s| Url::parse(s).ok())
    }

    pub fn from_value(value: Value) -> Result<Self, VocabError> {
        match ActivityStreams::from_value(value)? {
            ActivityStreams::Actor(a) => Ok(a),
            other => Err(unexpected("Actor", &other)),
        }
    }
}

fn type_of(value: &Value) -> Result<&str, VocabError> {
    let map = value.as_object().ok_or(VocabError::NotAnObject)?;
    match map.get("type") {
        Some(Value::String(kind)) => Ok(kind),
        Some(Value::Array(kinds)) => {
            primary_of(kinds.iter().filter_map(Value::as_str)).ok_or(VocabError::MissingType)
        }
        _ => Err(VocabError::MissingType),
    }
}

fn primary_of<'a, I>(mut kinds: I) -> Option<&'a str>
where
    I: Iterator<Item = &'a str> + Clone,
{
    kinds
        .clone()
        .find(|k| classify(k).is_some())
        .or_else(|| kinds.next())
}

fn unexpected(expected: &'static str, found: &ActivityStreams) -> VocabError {
    VocabError::UnexpectedType {
        expected,
        found: found.kind().to_string(),
    }
}

fn item_iris(items: Option<&[CollectionItem]>) -> Vec<Url> {
    items
        .unwrap_or_default()
        .iter()
        .filter_map(|it| match it {
            CollectionItem::Iri(u) => Some(u.clone()),
            CollectionItem::Embedded(doc) => doc.id().cloned(),
        })
        .collect()
}

fn addresses(v: &Value) -> impl Iterator<Item = &str> {
    let items: Vec<&str> = match v {
        Value::String(s) => vec![s.as_str()],
        Value::Array(arr) => arr.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    items.into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_variants_by_type() {
        let note = json!({"type": "Note", "id": "https://a.example/notes/1", "content": "hi"});
        assert!(matches!(
            ActivityStreams::from_value(note).unwrap(),
            ActivityStreams::Object(_)
        ));
        let person = json!({"type": "Person", "id": "https://a.example/users/x"});
        assert!(matches!(
            ActivityStreams::from_value(person).unwrap(),
            ActivityStreams::Actor(_)
        ));
        let follow = json!({"type": "Follow", "actor": "https://a.example/users/x"});
        assert!(matches!(
            ActivityStreams::from_value(follow).unwrap(),
            ActivityStreams::Activity(_)
        ));
    }

    #[test]
    fn unknown_or_missing_type_fails() {
        let ship = json!({"type": "Spaceship", "id": "https://a.example/s/1", "warp": 9});
        let err = ActivityStreams::from_value(ship).unwrap_err();
        assert!(matches!(err, VocabError::UnknownType(ref k) if k == "Spaceship"));
        let err = ActivityStreams::from_value(json!({"type": []})).unwrap_err();
        assert!(matches!(err, VocabError::MissingType));
        let err = ActivityStreams::from_value(json!({"id": "https://a.example/x"})).unwrap_err();
        assert!(matches!(err, VocabError::MissingType));
        let err = ActivityStreams::from_value(json!([1, 2])).unwrap_err();
        assert!(matches!(err, VocabError::NotAnObject));
    }

    #[test]
    fn explicit_unknown_serializes_as_is() {
        let mut properties = Map::new();
        properties.insert("warp".to_string(), json!(9));
        let doc = ActivityStreams::Unknown(Object {
            kind: "Spaceship".into(),
            id: Some(Url::parse("https://a.example/s/1").unwrap()),
            properties,
        });
        assert_eq!(doc.kind(), "Spaceship");
        assert_eq!(
            doc.to_value().unwrap(),
            json!({"type": "Spaceship", "id": "https://a.example/s/1", "warp": 9})
        );
    }

    #[test]
    fn type_lists_resolve_on_first_known_entry() {
        let raw = json!({
            "type": ["ext:Thing", "Create"],
            "id": "https://a.example/activities/7",
            "to": ["https://b.example/users/bob"]
        });
        let doc = ActivityStreams::from_value(raw.clone()).unwrap();
        assert!(matches!(doc, ActivityStreams::Activity(_)));
        assert_eq!(doc.kind(), "Create");
        assert_eq!(doc.to_value().unwrap(), raw);

        let err = ActivityStreams::from_value(json!({"type": ["ext:Thing"]})).unwrap_err();
        assert!(matches!(err, VocabError::UnknownType(ref k) if k == "ext:Thing"));
    }

    #[test]
    fn unmodelled_properties_survive() {
        let raw = json!({
            "@context": ACTIVITY_STREAMS_CONTEXT,
            "type": "OrderedCollection",
            "id": "https://a.example/users/x/outbox",
            "totalItems": 2,
            "orderedItems": ["https://a.example/a/2", {"type": "Note", "id": "https://a.example/a/1"}],
            "summary": "outbox"
        });
        let doc = ActivityStreams::from_value(raw.clone()).unwrap();
        assert_eq!(doc.to_value().unwrap(), raw);
        let ActivityStreams::OrderedCollection(c) = doc else {
            panic!("expected collection");
        };
        assert_eq!(c.item_iris().len(), 2);
    }

    #[test]
    fn typed_decoder_rejects_other_types() {
        let err = OrderedCollection::from_value(json!({"type": "Note"})).unwrap_err();
        assert!(matches!(err, VocabError::UnexpectedType { expected: "OrderedCollection", .. }));
    }

    #[test]
    fn public_and_recipients() {
        let doc = ActivityStreams::from_value(json!({
            "type": "Create",
            "to": PUBLIC_ADDRESS,
            "cc": ["https://a.example/users/x/followers", "https://b.example/users/y"],
            "bcc": "https://b.example/users/y"
        }))
        .unwrap();
        assert!(doc.is_public());
        let r = doc.recipients();
        assert_eq!(r.len(), 2);
        assert_eq!(r[1].as_str(), "https://b.example/users/y");
    }
}
