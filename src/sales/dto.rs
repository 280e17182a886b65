use serde::Deserialize;
use uuid::Uuid;

use crate::sales::repo_types::PaymentMethod;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineRequest {
    #[serde(alias = "product_id", alias = "id")]
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Body of `POST /sales`. Amounts are always computed server-side; a
/// client-sent `totalAmount` is not even read.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    #[serde(alias = "payment_method")]
    pub payment_method: PaymentMethod,
    #[serde(alias = "sale_products", alias = "products")]
    pub sale_products: Vec<SaleLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

impl Pagination {
    pub const MAX_LIMIT: i64 = 200;

    /// Clamped to sane bounds instead of rejecting.
    pub fn bounds(&self) -> (i64, i64) {
        (self.limit.clamp(1, Self::MAX_LIMIT), self.offset.max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_canonical_and_legacy_shapes() {
        let id = Uuid::new_v4();
        let canonical: CreateSaleRequest = serde_json::from_value(serde_json::json!({
            "paymentMethod": "card",
            "saleProducts": [{ "productId": id, "quantity": 2 }]
        }))
        .unwrap();
        assert_eq!(canonical.payment_method, PaymentMethod::Card);
        assert_eq!(canonical.sale_products[0].product_id, id);

        let legacy: CreateSaleRequest = serde_json::from_value(serde_json::json!({
            "paymentMethod": "CASH",
            "products": [{ "id": id, "quantity": 1 }],
            "totalAmount": 0.01
        }))
        .unwrap();
        assert_eq!(legacy.payment_method, PaymentMethod::Cash);
        assert_eq!(legacy.sale_products[0].quantity, 1);
    }

    #[test]
    fn rejects_unknown_payment_method() {
        let res: Result<CreateSaleRequest, _> = serde_json::from_value(serde_json::json!({
            "paymentMethod": "barter",
            "saleProducts": []
        }));
        assert!(res.is_err());
    }

    #[test]
    fn pagination_is_clamped() {
        let p = Pagination {
            limit: 10_000,
            offset: -3,
        };
        assert_eq!(p.bounds(), (Pagination::MAX_LIMIT, 0));
    }
}
