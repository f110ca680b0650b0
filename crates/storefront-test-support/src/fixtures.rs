//! Canned API payloads shaped like the live service responses.

use serde_json::{Value, json};

/// Timestamp used by every fixture so assertions stay deterministic.
pub const FIXTURE_TIMESTAMP: &str = "2024-03-01T12:00:00Z";

/// Single order payload with the given identifier.
#[must_use]
pub fn order_json(id: &str) -> Value {
    json!({
        "id": id,
        "created_at": FIXTURE_TIMESTAMP,
        "modified_at": null,
        "amount": 2_500,
        "tax_amount": 500,
        "currency": "usd",
        "user_id": "user-1",
        "product_id": "product-1",
        "product_price_id": "price-1",
        "subscription_id": null
    })
}

/// Paginated order list. Optional fields are omitted to mirror sparse responses.
#[must_use]
pub fn order_list_json(ids: &[&str], total_count: u64) -> Value {
    let items: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "created_at": FIXTURE_TIMESTAMP,
                "amount": 1_000,
                "currency": "usd",
                "user_id": "user-1",
                "product_id": "product-1"
            })
        })
        .collect();
    json!({
        "items": items,
        "pagination": { "total_count": total_count, "max_page": 1 }
    })
}

/// Invoice payload pointing at the given URL.
#[must_use]
pub fn invoice_json(url: &str) -> Value {
    json!({ "url": url })
}

/// Two-period statistics payload totalling 3500 in earnings.
#[must_use]
pub fn statistics_json() -> Value {
    json!({
        "periods": [
            { "date": "2024-01-01", "orders": 2, "earnings": 1_500, "expected_orders": 0, "expected_earnings": 0 },
            { "date": "2024-02-01", "orders": 3, "earnings": 2_000, "expected_orders": 1, "expected_earnings": 700 }
        ]
    })
}

/// Authenticated user payload.
#[must_use]
pub fn user_json(id: &str) -> Value {
    json!({
        "id": id,
        "created_at": FIXTURE_TIMESTAMP,
        "username": "octo",
        "email": "octo@example.com",
        "avatar_url": null,
        "account_id": null
    })
}

/// 422 payload. Each entry is a dotted location plus message; numeric
/// segments are emitted as list indices.
#[must_use]
pub fn validation_error_json(issues: &[(&str, &str)]) -> Value {
    let detail: Vec<Value> = issues
        .iter()
        .map(|(location, message)| {
            let loc: Vec<Value> = location
                .split('.')
                .map(|segment| {
                    segment
                        .parse::<u64>()
                        .map_or_else(|_| Value::from(segment), Value::from)
                })
                .collect();
            json!({ "loc": loc, "msg": message, "type": "value_error" })
        })
        .collect();
    json!({ "detail": detail })
}

/// 404 payload with the given detail message.
#[must_use]
pub fn not_found_json(detail: &str) -> Value {
    json!({ "type": "ResourceNotFound", "detail": detail })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_fixture_splits_numeric_segments() {
        let body = validation_error_json(&[("body.items.3", "bad")]);
        assert_eq!(body["detail"][0]["loc"], json!(["body", "items", 3]));
        assert_eq!(body["detail"][0]["msg"], "bad");
    }

    #[test]
    fn order_list_fixture_preserves_order() {
        let body = order_list_json(&["first", "second"], 10);
        assert_eq!(body["items"][0]["id"], "first");
        assert_eq!(body["items"][1]["id"], "second");
        assert_eq!(body["pagination"]["total_count"], 10);
    }
}
