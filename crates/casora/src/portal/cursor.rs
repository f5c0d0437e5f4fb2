//! Opaque resume markers for the portal listing.
//!
//! A cursor is the base64url encoding of the JSON tuple
//! `[currency, price, tenantId, propertyId]` taken from the last row of a page.

use base64::{engine::general_purpose, Engine};

use super::query::SortKey;
use crate::domain::{Currency, PropertyId, TenantId, MAX_ID_LEN};

/// Worst-case JSON for one id: quotes plus a six-byte `\u00XX` escape per byte.
const MAX_ENCODED_ID_LEN: usize = 2 + 6 * MAX_ID_LEN;

/// `["PEN",<u64>,<tenant>,<property>]` with the widest currency code and price.
const MAX_TUPLE_LEN: usize = 1 + 5 + 1 + 20 + 1 + MAX_ENCODED_ID_LEN + 1 + MAX_ENCODED_ID_LEN + 1;

/// Longest cursor [`make_cursor`] can emit for ids within [`MAX_ID_LEN`].
pub const MAX_CURSOR_LEN: usize = (MAX_TUPLE_LEN * 4).div_ceil(3);

pub fn make_cursor(key: &SortKey) -> String {
    let tuple = (
        key.currency,
        key.price,
        key.tenant_id.as_str(),
        key.property_id.as_str(),
    );
    let json = serde_json::to_vec(&tuple).unwrap_or_default();
    general_purpose::URL_SAFE_NO_PAD.encode(json)
}

/// `None` for anything that is not a cursor produced by [`make_cursor`].
pub fn parse_cursor(raw: &str) -> Option<SortKey> {
    let raw = raw.trim();
    if raw.is_empty() || raw.len() > MAX_CURSOR_LEN {
        return None;
    }
    let bytes = general_purpose::URL_SAFE_NO_PAD.decode(raw).ok()?;
    let (currency, price, tenant_id, property_id): (Currency, u64, String, String) =
        serde_json::from_slice(&bytes).ok()?;
    if tenant_id.trim().is_empty() || property_id.trim().is_empty() {
        return None;
    }

    Some(SortKey {
        currency,
        price,
        tenant_id: TenantId(tenant_id),
        property_id: PropertyId(property_id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SortKey {
        SortKey {
            currency: Currency::Usd,
            price: 185_000,
            tenant_id: TenantId::new("demo"),
            property_id: PropertyId::new("P123"),
        }
    }

    #[test]
    fn parse_reverses_make() {
        let cursor = make_cursor(&key());
        assert_eq!(parse_cursor(&cursor), Some(key()));
    }

    #[test]
    fn cursor_is_url_safe() {
        let mut key = key();
        key.property_id = PropertyId::new("ñandú/?&=+");
        let cursor = make_cursor(&key);
        assert!(cursor
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(parse_cursor(&cursor), Some(key));
    }

    #[test]
    fn round_trips_ids_at_the_length_limit() {
        let widest = SortKey {
            currency: Currency::Pen,
            price: u64::MAX,
            tenant_id: TenantId::new("\u{1}".repeat(MAX_ID_LEN)),
            property_id: PropertyId::new("\"".repeat(MAX_ID_LEN)),
        };
        let cursor = make_cursor(&widest);
        assert!(cursor.len() <= MAX_CURSOR_LEN);
        assert_eq!(parse_cursor(&cursor), Some(widest));

        let mut plain = key();
        plain.property_id = PropertyId::new("P".repeat(MAX_ID_LEN));
        assert_eq!(parse_cursor(&make_cursor(&plain)), Some(plain));
    }

    #[test]
    fn oversized_input_yields_none() {
        assert_eq!(parse_cursor(&"A".repeat(MAX_CURSOR_LEN + 1)), None);
    }

    #[test]
    fn garbage_yields_none() {
        assert_eq!(parse_cursor("garbage"), None);
        assert_eq!(parse_cursor(""), None);
        assert_eq!(parse_cursor("%%%"), None);
    }

    #[test]
    fn well_formed_base64_with_wrong_shape_yields_none() {
        let cursor = general_purpose::URL_SAFE_NO_PAD.encode(br#"{"price":10}"#);
        assert_eq!(parse_cursor(&cursor), None);

        let blank_ids = general_purpose::URL_SAFE_NO_PAD.encode(br#"["USD",10,"",""]"#);
        assert_eq!(parse_cursor(&blank_ids), None);
    }
}
