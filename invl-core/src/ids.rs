//! Platform id normalization.
//!
//! The platform spells the same resource either as a bare number (`42`,
//! webhook payloads) or as a resource path (`gid://shopify/InventoryItem/42`,
//! GraphQL). Every id is reduced to its canonical bare form before key
//! derivation or storage, and expanded back to the resource path for
//! GraphQL calls. Store lookups match on [`spellings`] so rows written
//! before normalization are still found.

use smallvec::SmallVec;

pub const GID_PREFIX: &str = "gid://shopify/";

/// Resource kinds that appear in ledger rows or platform calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    InventoryItem,
    Location,
    ProductVariant,
    Order,
    Fulfillment,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::InventoryItem => "InventoryItem",
            ResourceKind::Location => "Location",
            ResourceKind::ProductVariant => "ProductVariant",
            ResourceKind::Order => "Order",
            ResourceKind::Fulfillment => "Fulfillment",
        }
    }
}

/// Equivalent spellings of one id, canonical form first.
pub type Spellings = SmallVec<[String; 2]>;

/// Reduce an id to its canonical comparable form.
///
/// Idempotent: `canonical_id(&canonical_id(x)) == canonical_id(x)`.
pub fn canonical_id(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_query = trimmed.split('?').next().unwrap_or(trimmed);
    match without_query.strip_prefix(GID_PREFIX) {
        Some(path) => path.rsplit('/').next().unwrap_or(path).to_owned(),
        None => without_query.to_owned(),
    }
}

/// The resource-path form used by GraphQL calls.
pub fn gid(kind: ResourceKind, raw: &str) -> String {
    format!("{GID_PREFIX}{}/{}", kind.as_str(), canonical_id(raw))
}

/// All spellings of `raw` that refer to the same resource.
pub fn spellings(kind: ResourceKind, raw: &str) -> Spellings {
    let canonical = canonical_id(raw);
    let mut out = Spellings::new();
    if canonical.is_empty() {
        out.push(canonical);
        return out;
    }
    out.push(gid(kind, &canonical));
    out.insert(0, canonical);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_forms_agree() {
        assert_eq!(canonical_id("42"), "42");
        assert_eq!(canonical_id(" 42 "), "42");
        assert_eq!(canonical_id("gid://shopify/InventoryItem/42"), "42");
        assert_eq!(
            canonical_id("gid://shopify/InventoryLevel/7?inventory_item_id=42"),
            "7"
        );
        assert_eq!(canonical_id("loc_1"), "loc_1");
    }

    #[test]
    fn test_canonical_is_idempotent() {
        for raw in ["gid://shopify/Location/9", "9", "inv_1", ""] {
            let once = canonical_id(raw);
            assert_eq!(canonical_id(&once), once);
        }
    }

    #[test]
    fn test_spellings() {
        let s = spellings(ResourceKind::Location, "gid://shopify/Location/9");
        assert_eq!(s.as_slice(), ["9", "gid://shopify/Location/9"]);
        assert_eq!(spellings(ResourceKind::Location, "9"), s);
        assert_eq!(gid(ResourceKind::InventoryItem, "42"), "gid://shopify/InventoryItem/42");
    }
}
