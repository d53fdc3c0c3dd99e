//! Generic nested records as they appear in the extension payload

use serde_json::{Map, Number, Value as Json};

/// Key marking a JSON object as a reference into a document array
pub const LINK_TYPE_KEY: &str = "__mhc_link_type";

/// Key written for components without properties, so the component still
/// shows up as a non-empty object
pub const EMPTY_COMPONENT_KEY: &str = "__empty_component_dummy";

/// Which document array a reference indexes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Node,
    Texture,
    Image,
}

impl LinkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkKind::Node => "node",
            LinkKind::Texture => "texture",
            LinkKind::Image => "image",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "node" => Some(LinkKind::Node),
            "texture" => Some(LinkKind::Texture),
            "image" => Some(LinkKind::Image),
            _ => None,
        }
    }
}

/// A schema-agnostic value in the interchange payload
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Map(RecordMap),
    List(Vec<Record>),
    Reference { kind: LinkKind, index: usize },
}

/// String-keyed map that keeps insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordMap(Vec<(String, Record)>);

impl RecordMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace in place
    pub fn insert(&mut self, key: impl Into<String>, value: Record) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Record> {
        self.0.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<Record> {
        let pos = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(pos).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Record)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Record)> for RecordMap {
    fn from_iter<I: IntoIterator<Item = (String, Record)>>(iter: I) -> Self {
        let mut map = RecordMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Record {
    /// Payload of a component that has no properties
    pub fn empty_component() -> Record {
        let mut map = RecordMap::new();
        map.insert(EMPTY_COMPONENT_KEY, Record::Null);
        Record::Map(map)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Record::Null => "null",
            Record::Bool(_) => "bool",
            Record::Int(_) => "int",
            Record::Float(_) => "float",
            Record::String(_) => "string",
            Record::Map(_) => "map",
            Record::List(_) => "list",
            Record::Reference { .. } => "reference",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Record::Int(i) => Some(*i as f64),
            Record::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Record::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Record::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&RecordMap> {
        match self {
            Record::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut RecordMap> {
        match self {
            Record::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Record]> {
        match self {
            Record::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Json {
        match self {
            Record::Null => Json::Null,
            Record::Bool(b) => Json::Bool(*b),
            Record::Int(i) => Json::Number((*i).into()),
            Record::Float(f) => Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
            Record::String(s) => Json::String(s.clone()),
            Record::Map(m) => Json::Object(
                m.iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect::<Map<String, Json>>(),
            ),
            Record::List(l) => Json::Array(l.iter().map(Record::to_json).collect()),
            Record::Reference { kind, index } => {
                let mut obj = Map::new();
                obj.insert(LINK_TYPE_KEY.to_string(), Json::String(kind.as_str().to_string()));
                obj.insert("index".to_string(), Json::Number((*index as u64).into()));
                Json::Object(obj)
            }
        }
    }

    pub fn from_json(json: &Json) -> Record {
        match json {
            Json::Null => Record::Null,
            Json::Bool(b) => Record::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Record::Int(i),
                None => Record::Float(n.as_f64().unwrap_or(0.0)),
            },
            Json::String(s) => Record::String(s.clone()),
            Json::Array(items) => Record::List(items.iter().map(Record::from_json).collect()),
            Json::Object(obj) => {
                if let Some(reference) = parse_reference(obj) {
                    return reference;
                }
                Record::Map(
                    obj.iter()
                        .map(|(k, v)| (k.clone(), Record::from_json(v)))
                        .collect(),
                )
            }
        }
    }
}

fn parse_reference(obj: &Map<String, Json>) -> Option<Record> {
    let kind = LinkKind::parse(obj.get(LINK_TYPE_KEY)?.as_str()?)?;
    let index = obj.get("index")?.as_u64()?;
    Some(Record::Reference {
        kind,
        index: usize::try_from(index).ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reference_json_shape() {
        let r = Record::Reference {
            kind: LinkKind::Node,
            index: 3,
        };
        assert_eq!(r.to_json(), json!({"__mhc_link_type": "node", "index": 3}));
        assert_eq!(Record::from_json(&r.to_json()), r);
    }

    #[test]
    fn test_malformed_reference_stays_a_map() {
        let raw = json!({"__mhc_link_type": "mesh", "index": 1});
        assert!(matches!(Record::from_json(&raw), Record::Map(_)));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(Record::from_json(&json!(2)), Record::Int(2));
        assert_eq!(Record::from_json(&json!(2.5)), Record::Float(2.5));
        assert_eq!(Record::Float(f64::NAN).to_json(), Json::Null);
    }

    #[test]
    fn test_map_keeps_insertion_order() {
        let mut map = RecordMap::new();
        map.insert("z", Record::Int(1));
        map.insert("a", Record::Int(2));
        map.insert("z", Record::Int(3));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["z", "a"]);
        assert_eq!(map.get("z"), Some(&Record::Int(3)));

        let json = Record::Map(map).to_json().to_string();
        assert_eq!(json, r#"{"z":3,"a":2}"#);
    }

    #[test]
    fn test_empty_component() {
        assert_eq!(
            Record::empty_component().to_json(),
            json!({"__empty_component_dummy": null})
        );
    }
}
