//! Idempotency key derivation.

use time::OffsetDateTime;

use crate::ids::canonical_id;

const ABSENT: &str = "-";

/// Identifying attributes of one observed change.
#[derive(Debug, Clone, Copy)]
pub struct KeyParts<'a> {
    pub tenant_id: &'a str,
    /// Distinct classes never share a key, even for the same source.
    pub activity_class: &'a str,
    pub inventory_item_id: &'a str,
    pub location_id: &'a str,
    pub source_id: Option<&'a str>,
    pub sub_source_id: Option<&'a str>,
    pub timestamp: OffsetDateTime,
}

/// Derive the per-tenant deduplication key.
///
/// Format: `{tenant}:{activity_class}:{item}:{location}:{source}:{sub_source}:{unix_seconds}`.
/// Ids are reduced to their canonical spelling, absent segments become `-`
/// and the timestamp is truncated to whole seconds, so every re-delivery of
/// the same observation yields the same key.
pub fn derive_key(parts: &KeyParts<'_>) -> String {
    format!(
        "{}:{}:{}:{}:{}:{}:{}",
        segment(Some(parts.tenant_id)),
        segment(Some(parts.activity_class)),
        segment(Some(parts.inventory_item_id)),
        segment(Some(parts.location_id)),
        segment(parts.source_id),
        segment(parts.sub_source_id),
        parts.timestamp.unix_timestamp(),
    )
}

fn segment(raw: Option<&str>) -> String {
    match raw.map(canonical_id) {
        Some(id) if !id.is_empty() => id,
        _ => ABSENT.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn parts(timestamp: OffsetDateTime) -> KeyParts<'static> {
        KeyParts {
            tenant_id: "t1.myshopify.com",
            activity_class: "order_sales",
            inventory_item_id: "inv_1",
            location_id: "loc_1",
            source_id: Some("order_123"),
            sub_source_id: Some("f1:li1"),
            timestamp,
        }
    }

    #[test]
    fn test_key_format() {
        let key = derive_key(&parts(datetime!(2024-01-01 10:03:00 UTC)));
        assert_eq!(
            key,
            "t1.myshopify.com:order_sales:inv_1:loc_1:order_123:f1:li1:1704103380"
        );
    }

    #[test]
    fn test_sub_second_jitter_is_absorbed() {
        let a = derive_key(&parts(datetime!(2024-01-01 10:03:00.120 UTC)));
        let b = derive_key(&parts(datetime!(2024-01-01 10:03:00.980 UTC)));
        assert_eq!(a, b);
    }

    #[test]
    fn test_offsets_do_not_change_the_key() {
        let utc = derive_key(&parts(datetime!(2024-01-01 10:03:00 UTC)));
        let local = derive_key(&parts(datetime!(2024-01-01 19:03:00 +9)));
        assert_eq!(utc, local);
    }

    #[test]
    fn test_activity_classes_never_collide() {
        let ts = datetime!(2024-01-01 10:03:00 UTC);
        let sales = derive_key(&parts(ts));
        let generic = derive_key(&KeyParts {
            activity_class: "generic_webhook",
            ..parts(ts)
        });
        assert_ne!(sales, generic);
    }

    #[test]
    fn test_id_spellings_share_a_key() {
        let ts = datetime!(2024-01-01 10:03:00 UTC);
        let bare = derive_key(&KeyParts {
            inventory_item_id: "42",
            location_id: "7",
            ..parts(ts)
        });
        let qualified = derive_key(&KeyParts {
            inventory_item_id: "gid://shopify/InventoryItem/42",
            location_id: "gid://shopify/Location/7",
            ..parts(ts)
        });
        assert_eq!(bare, qualified);
    }

    #[test]
    fn test_absent_segments() {
        let key = derive_key(&KeyParts {
            source_id: None,
            sub_source_id: Some("  "),
            ..parts(datetime!(1970-01-01 00:00:05 UTC))
        });
        assert_eq!(key, "t1.myshopify.com:order_sales:inv_1:loc_1:-:-:5");
    }
}
