//! Profile attributes and their wire form.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Profile attributes keyed by name. Keys are unique and order carries no
/// meaning; values are always the canonical string form, so a numeric or
/// boolean attribute travels as its string rendering.
pub type AttributeMap = BTreeMap<String, String>;

/// One attribute in the list form the directory expects on the wire.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Convert an attribute map into the directory's wire list.
#[must_use]
pub fn encode(attributes: &AttributeMap) -> Vec<Attribute> {
    attributes
        .iter()
        .map(|(name, value)| Attribute::new(name, value))
        .collect()
}

/// Convert the directory's wire list back into an attribute map.
#[must_use]
pub fn decode(attributes: &[Attribute]) -> AttributeMap {
    attributes
        .iter()
        .map(|attribute| (attribute.name.clone(), attribute.value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn encode_then_decode_round_trips() {
        let mut attributes = AttributeMap::new();
        attributes.insert("email".to_string(), "a@b.com".to_string());
        attributes.insert("given_name".to_string(), "A".to_string());

        let decoded = decode(&encode(&attributes));
        assert_eq!(decoded, attributes);
    }

    #[test]
    fn decode_ignores_list_order() {
        let shuffled = vec![
            Attribute::new("given_name", "A"),
            Attribute::new("email", "a@b.com"),
        ];
        let ordered = vec![
            Attribute::new("email", "a@b.com"),
            Attribute::new("given_name", "A"),
        ];
        assert_eq!(decode(&shuffled), decode(&ordered));
    }

    #[test]
    fn wire_shape_round_trips() -> Result<()> {
        let attribute = Attribute::new("email", "a@b.com");
        let value = serde_json::to_value(&attribute)?;
        assert_eq!(value["name"], "email");
        assert_eq!(value["value"], "a@b.com");

        let decoded: Attribute = serde_json::from_value(value)?;
        assert_eq!(decoded, attribute);
        Ok(())
    }
}
