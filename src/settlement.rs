//! Pure settlement engine: receipt totals for one order and per-product
//! sales aggregates for a session. Everything here is deterministic —
//! inputs are already-persisted snapshots, no clock and no I/O.

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{Receipt, ReceiptLine, SummaryRow};
use crate::shipping::{FeeTier, ShippingMethod};

/// A session's shipping-fee configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipConfig {
    /// Goods total at or above this ships free.
    pub threshold: i64,
    pub fee_normal: i64,
    pub fee_jeju: i64,
}

/// Buyer-facing fields of the order being settled.
#[derive(Debug, Clone)]
pub struct ReceiptInput {
    pub session_id: Uuid,
    pub nickname: String,
    pub shipping: ShippingMethod,
    pub phone: Option<String>,
    pub postal_code: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub lines: Vec<ReceiptLine>,
}

/// Collapses duplicate product references into one line each, summing
/// qty and amount. Current orders are written one-line-per-product, but
/// legacy rows may still carry duplicates. First-seen order is kept.
pub fn coalesce_lines(entries: Vec<ReceiptLine>) -> Vec<ReceiptLine> {
    let mut by_product: HashMap<Uuid, usize> = HashMap::new();
    let mut out: Vec<ReceiptLine> = Vec::with_capacity(entries.len());
    for entry in entries {
        match by_product.get(&entry.product_id) {
            Some(&idx) => {
                out[idx].qty += entry.qty;
                out[idx].amount += entry.amount;
            }
            None => {
                by_product.insert(entry.product_id, out.len());
                out.push(entry);
            }
        }
    }
    out
}

/// Fee selection: an empty order ships nothing, a total at or above the
/// threshold ships free, otherwise the method's tier picks the amount.
pub fn shipping_fee(goods_total: i64, method: ShippingMethod, cfg: &ShipConfig) -> i64 {
    if goods_total == 0 || goods_total >= cfg.threshold {
        return 0;
    }
    match method.fee_tier() {
        FeeTier::Free => 0,
        FeeTier::Remote => cfg.fee_jeju,
        FeeTier::Normal => cfg.fee_normal,
    }
}

pub fn compute_receipt(input: ReceiptInput, cfg: &ShipConfig) -> Receipt {
    let lines = coalesce_lines(input.lines);
    let goods_total: i64 = lines.iter().map(|l| l.amount).sum();
    let fee = shipping_fee(goods_total, input.shipping, cfg);

    let postal = input
        .postal_code
        .filter(|p| !p.is_empty())
        .map(|p| format!("[{p}] "))
        .unwrap_or_default();
    let address1 = input.address1.unwrap_or_default();
    let address2 = input
        .address2
        .filter(|a| !a.is_empty())
        .map(|a| format!(" {a}"))
        .unwrap_or_default();
    let address = format!("{postal}{address1}{address2}").trim().to_string();

    Receipt {
        session_id: input.session_id,
        nickname: input.nickname,
        shipping: input.shipping,
        phone: input.phone.unwrap_or_default(),
        address,
        goods_total,
        shipping_fee: fee,
        final_total: goods_total + fee,
        lines,
    }
}

/// Catalog row fed into the session summary.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub product_id: Uuid,
    pub name: String,
    pub price: i64,
    pub sort_order: i32,
}

/// Aggregates sold qty and revenue per product over the given lines
/// (callers must pass only lines of non-deleted orders). Every catalog
/// entry appears, zero-sales included; rows sort by revenue descending,
/// ties by catalog sort order.
pub fn summarize(catalog: Vec<CatalogEntry>, sold_lines: &[(Uuid, i64, i64)]) -> Vec<SummaryRow> {
    let mut qty_by_product: HashMap<Uuid, i64> = HashMap::new();
    let mut revenue_by_product: HashMap<Uuid, i64> = HashMap::new();
    for (product_id, qty, amount) in sold_lines {
        *qty_by_product.entry(*product_id).or_insert(0) += qty;
        *revenue_by_product.entry(*product_id).or_insert(0) += amount;
    }

    let mut rows: Vec<(i32, SummaryRow)> = catalog
        .into_iter()
        .map(|entry| {
            let sold_qty = qty_by_product.get(&entry.product_id).copied().unwrap_or(0);
            let revenue = revenue_by_product
                .get(&entry.product_id)
                .copied()
                .unwrap_or(0);
            (
                entry.sort_order,
                SummaryRow {
                    product_id: entry.product_id,
                    name: entry.name,
                    price: entry.price,
                    sold_qty,
                    revenue,
                },
            )
        })
        .collect();

    rows.sort_by(|(sort_a, a), (sort_b, b)| b.revenue.cmp(&a.revenue).then(sort_a.cmp(sort_b)));
    rows.into_iter().map(|(_, row)| row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ShipConfig {
        ShipConfig {
            threshold: 100_000,
            fee_normal: 3_500,
            fee_jeju: 7_000,
        }
    }

    fn line(product_id: Uuid, qty: i64, amount: i64) -> ReceiptLine {
        ReceiptLine {
            product_id,
            name: "item".into(),
            qty,
            amount,
        }
    }

    fn input(shipping: ShippingMethod, lines: Vec<ReceiptLine>) -> ReceiptInput {
        ReceiptInput {
            session_id: Uuid::new_v4(),
            nickname: "buyer".into(),
            shipping,
            phone: Some("010-0000-0000".into()),
            postal_code: Some("06236".into()),
            address1: Some("Teheran-ro 1".into()),
            address2: Some("Apt 101".into()),
            lines,
        }
    }

    #[test]
    fn goods_total_is_exact_sum_of_line_amounts() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let receipt = compute_receipt(
            input(
                ShippingMethod::Standard,
                vec![line(a, 3, 29_997), line(b, 1, 50_000)],
            ),
            &cfg(),
        );
        assert_eq!(receipt.goods_total, 79_997);
        assert_eq!(
            receipt.lines.iter().map(|l| l.amount).sum::<i64>(),
            receipt.goods_total
        );
    }

    #[test]
    fn below_threshold_charges_normal_fee() {
        let receipt = compute_receipt(
            input(ShippingMethod::Standard, vec![line(Uuid::new_v4(), 1, 99_999)]),
            &cfg(),
        );
        assert_eq!(receipt.shipping_fee, 3_500);
        assert_eq!(receipt.final_total, 103_499);
    }

    #[test]
    fn threshold_exactly_met_ships_free() {
        let receipt = compute_receipt(
            input(ShippingMethod::Standard, vec![line(Uuid::new_v4(), 1, 100_000)]),
            &cfg(),
        );
        assert_eq!(receipt.shipping_fee, 0);
        assert_eq!(receipt.final_total, 100_000);
    }

    #[test]
    fn pickup_is_free_regardless_of_threshold() {
        let receipt = compute_receipt(
            input(ShippingMethod::Pickup, vec![line(Uuid::new_v4(), 1, 50_000)]),
            &cfg(),
        );
        assert_eq!(receipt.shipping_fee, 0);
        assert_eq!(receipt.final_total, 50_000);
    }

    #[test]
    fn island_method_charges_remote_fee() {
        let receipt = compute_receipt(
            input(ShippingMethod::Island, vec![line(Uuid::new_v4(), 1, 50_000)]),
            &cfg(),
        );
        assert_eq!(receipt.shipping_fee, 7_000);
    }

    #[test]
    fn empty_order_has_no_shipping_fee() {
        let receipt = compute_receipt(input(ShippingMethod::Standard, vec![]), &cfg());
        assert_eq!(receipt.goods_total, 0);
        assert_eq!(receipt.shipping_fee, 0);
        assert_eq!(receipt.final_total, 0);
    }

    #[test]
    fn legacy_duplicate_lines_are_summed_per_product() {
        let a = Uuid::new_v4();
        let receipt = compute_receipt(
            input(
                ShippingMethod::Pickup,
                vec![line(a, 2, 2_000), line(a, 3, 3_000)],
            ),
            &cfg(),
        );
        assert_eq!(receipt.lines.len(), 1);
        assert_eq!(receipt.lines[0].qty, 5);
        assert_eq!(receipt.lines[0].amount, 5_000);
    }

    #[test]
    fn receipt_is_deterministic_for_same_input() {
        let a = Uuid::new_v4();
        let make = || {
            compute_receipt(
                ReceiptInput {
                    session_id: Uuid::nil(),
                    nickname: "buyer".into(),
                    shipping: ShippingMethod::Island,
                    phone: None,
                    postal_code: None,
                    address1: Some("addr".into()),
                    address2: None,
                    lines: vec![line(a, 2, 40_000)],
                },
                &cfg(),
            )
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn address_formats_postal_and_parts() {
        let receipt = compute_receipt(input(ShippingMethod::Pickup, vec![]), &cfg());
        assert_eq!(receipt.address, "[06236] Teheran-ro 1 Apt 101");
    }

    #[test]
    fn summary_counts_only_provided_lines_and_keeps_zero_sales_rows() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let catalog = vec![
            CatalogEntry {
                product_id: a,
                name: "A".into(),
                price: 1_000,
                sort_order: 1,
            },
            CatalogEntry {
                product_id: b,
                name: "B".into(),
                price: 2_000,
                sort_order: 2,
            },
            CatalogEntry {
                product_id: c,
                name: "C".into(),
                price: 9_000,
                sort_order: 3,
            },
        ];
        // Two live orders each bought {A:2, B:1}; a deleted order bought
        // {A:5} and its lines are not passed in.
        let sold = vec![(a, 2, 2_000), (b, 1, 2_000), (a, 2, 2_000), (b, 1, 2_000)];
        let rows = summarize(catalog, &sold);

        let row_a = rows.iter().find(|r| r.product_id == a).unwrap();
        assert_eq!((row_a.sold_qty, row_a.revenue), (4, 4_000));
        let row_b = rows.iter().find(|r| r.product_id == b).unwrap();
        assert_eq!((row_b.sold_qty, row_b.revenue), (2, 4_000));
        let row_c = rows.iter().find(|r| r.product_id == c).unwrap();
        assert_eq!((row_c.sold_qty, row_c.revenue), (0, 0));

        // Revenue ties (A and B both 4000) resolve by catalog sort order,
        // zero-sales rows sink to the bottom.
        let ids: Vec<Uuid> = rows.iter().map(|r| r.product_id).collect();
        assert_eq!(ids, vec![a, b, c]);
    }
}
