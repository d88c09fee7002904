//! Monetary totals and VAT subtotal computation.
//!
//! All amounts round to 2 decimal places at every accumulation step,
//! using commercial (half-up) rounding. VAT is computed per group of
//! lines sharing a rate, never per line: summing N independently
//! rounded per-line VAT amounts can drift up to N half-cents from the
//! amount network-level compliance checks expect.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::types::{LineItem, TaxCategory};

/// Round to 2 decimal places, half-up.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Net amount of a single line after its percentage discount.
///
/// The allowance is computed from quantity × price, not by inverting the
/// net amount, so a 100% discount never divides by zero.
pub fn line_net(item: &LineItem) -> Decimal {
    let base = round2(item.quantity * item.price);
    if item.discount > Decimal::ZERO {
        let allowance = round2(base * item.discount / dec!(100));
        round2(base - allowance)
    } else {
        base
    }
}

/// Gross discount amount of a single line (0 when no discount applies).
pub fn line_allowance(item: &LineItem) -> Decimal {
    if item.discount > Decimal::ZERO {
        let base = round2(item.quantity * item.price);
        round2(base * item.discount / dec!(100))
    } else {
        Decimal::ZERO
    }
}

/// Document-level monetary totals.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTotals {
    /// Sum of line net amounts.
    pub subtotal: Decimal,
    /// Total VAT, computed over rate groups.
    pub vat: Decimal,
    /// subtotal + vat.
    pub grand_total: Decimal,
}

/// Compute subtotal, VAT, and grand total for a detail list.
pub fn document_totals(details: &[LineItem]) -> DocumentTotals {
    let subtotal = round2(details.iter().map(line_net).sum());

    // Group nets by identical VAT rate, in first-seen order.
    let mut groups: Vec<(Decimal, Decimal)> = Vec::new();
    for item in details {
        let net = line_net(item);
        match groups.iter_mut().find(|(rate, _)| *rate == item.vat) {
            Some((_, sum)) => *sum += net,
            None => groups.push((item.vat, net)),
        }
    }

    let vat: Decimal = groups
        .iter()
        .map(|(rate, net)| round2(round2(*net) * *rate / dec!(100)))
        .sum();

    DocumentTotals {
        subtotal,
        vat,
        grand_total: round2(subtotal + vat),
    }
}

/// One VAT breakdown group, keyed by (rate, category).
#[derive(Debug, Clone, PartialEq)]
pub struct TaxSubtotal {
    pub rate: Decimal,
    pub category: TaxCategory,
    pub taxable_amount: Decimal,
    pub tax_amount: Decimal,
    pub exemption_reason_code: Option<String>,
    pub exemption_reason: Option<String>,
}

/// Group lines by (VAT rate, effective tax category), in first-seen
/// order. Each group keeps the first exemption code/text any of its
/// lines carries.
pub fn tax_subtotals(details: &[LineItem]) -> Vec<TaxSubtotal> {
    struct Group {
        rate: Decimal,
        category: TaxCategory,
        net: Decimal,
        exemption_reason_code: Option<String>,
        exemption_reason: Option<String>,
    }

    let mut groups: Vec<Group> = Vec::new();
    for item in details {
        let category = item.effective_category();
        let net = line_net(item);
        match groups
            .iter_mut()
            .find(|g| g.rate == item.vat && g.category == category)
        {
            Some(group) => {
                group.net += net;
                if group.exemption_reason_code.is_none() {
                    group.exemption_reason_code = item.tax_exemption_reason_code.clone();
                }
                if group.exemption_reason.is_none() {
                    group.exemption_reason = item.tax_exemption_reason.clone();
                }
            }
            None => groups.push(Group {
                rate: item.vat,
                category,
                net,
                exemption_reason_code: item.tax_exemption_reason_code.clone(),
                exemption_reason: item.tax_exemption_reason.clone(),
            }),
        }
    }

    groups
        .into_iter()
        .map(|g| {
            let taxable_amount = round2(g.net);
            TaxSubtotal {
                rate: g.rate,
                category: g.category,
                taxable_amount,
                tax_amount: round2(taxable_amount * g.rate / dec!(100)),
                exemption_reason_code: g.exemption_reason_code,
                exemption_reason: g.exemption_reason,
            }
        })
        .collect()
}
