use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

// Top-level wrapper of every search response
#[derive(Debug, Clone, Default)]
pub struct SearchResultEnvelope {
    pub data: Vec<Value>, // Raw records, decoded per item later
}

// Accepts a JSON object only, never a sequence of fields
impl<'de> Deserialize<'de> for SearchResultEnvelope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Fields {
            #[serde(default)]
            data: Vec<Value>,
        }

        match Value::deserialize(deserializer)? {
            object @ Value::Object(_) => Fields::deserialize(object)
                .map(|fields| SearchResultEnvelope { data: fields.data })
                .map_err(de::Error::custom),
            other => Err(de::Error::custom(format!(
                "expected a JSON object envelope, found {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Names {
    pub international: String,        // e.g., "Super Mario 64"
    pub japanese: Option<String>,     // Not every entity has a Japanese name
}

// A game as returned in bulk mode
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub id: String,
    pub names: Names,
    pub abbreviation: String,         // e.g., "sm64"
    pub weblink: String,              // Link to the game page
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub names: Names,
    pub weblink: String,              // Link to the profile page
    pub location: Option<Location>,   // Optional: users may hide their location
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub country: Country,
    pub region: Option<Region>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Country {
    pub code: String,                 // e.g., "jp"
    pub names: Names,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub code: String,                 // e.g., "us/ca"
    pub names: Names,
}

// A record type that can be pulled out of a search envelope
pub trait Entity: DeserializeOwned {
    const KIND: &'static str;

    // Records that do not fit the schema yield None
    fn from_node(node: Value) -> Option<Self> {
        match serde_json::from_value(node) {
            Ok(entity) => Some(entity),
            Err(err) => {
                debug!(kind = Self::KIND, error = %err, "skipping malformed record");
                None
            }
        }
    }
}

impl Entity for Game {
    const KIND: &'static str = "game";
}

impl Entity for User {
    const KIND: &'static str = "user";
}

impl SearchResultEnvelope {
    // Keep the records that decode as `T`, in their original order
    pub fn into_entities<T: Entity>(self) -> Vec<T> {
        self.data.into_iter().filter_map(T::from_node).collect()
    }
}

impl Game {
    // One-line label used when listing results
    pub fn summary(&self) -> String {
        format!("{} ({})", self.names.international, self.abbreviation)
    }
}

impl User {
    pub fn location_label(&self) -> Option<&str> {
        self.location
            .as_ref()
            .map(|location| location.country.names.international.as_str())
            .filter(|name| !name.is_empty())
    }
}
