//! Serde helpers for platform ids.
//!
//! Webhook payloads carry ids as JSON numbers (`"location_id": 24826418`)
//! while GraphQL payloads carry them as strings
//! (`"gid://shopify/Location/24826418"`). Both deserialize into `String`;
//! canonicalization happens in the core crate.

use serde::Deserializer;
use serde::de::{self, Visitor};
use std::fmt;

struct IdVisitor;

impl<'de> Visitor<'de> for IdVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an id as a number or string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_owned())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }
}

struct OptionIdVisitor;

impl<'de> Visitor<'de> for OptionIdVisitor {
    type Value = Option<String>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an optional id as a number or string")
    }

    fn visit_none<E: de::Error>(self) -> Result<Option<String>, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Option<String>, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Option<String>, D::Error> {
        flexible(d).map(Some)
    }
}

/// Deserialize a required id from a number or a string.
pub fn flexible<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    d.deserialize_any(IdVisitor)
}

/// Deserialize an optional id; use together with `#[serde(default)]`.
pub fn flexible_option<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    d.deserialize_option(OptionIdVisitor)
}
