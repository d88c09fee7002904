//! Property-based tests for the monetary arithmetic and the codec
//! round-trip.

#![cfg(feature = "ubl")]

use factuur::core::totals::{document_totals, line_net, round2};
use factuur::{Document, Invoice, LineItem};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Lines with integer quantity/price/discount: discount reconstruction
/// is exact for these, so round-trips can assert equality.
fn arb_line() -> impl Strategy<Value = LineItem> {
    (
        1u32..20,
        1u32..500,
        prop_oneof![Just(0u32), Just(6u32), Just(9u32), Just(21u32)],
        0u32..=100,
    )
        .prop_map(|(quantity, price, vat, discount)| LineItem {
            name: "item".into(),
            quantity: Decimal::from(quantity),
            price: Decimal::from(price),
            vat: Decimal::from(vat),
            discount: Decimal::from(discount),
            ..LineItem::default()
        })
}

proptest! {
    #[test]
    fn grand_total_is_always_subtotal_plus_vat(details in prop::collection::vec(arb_line(), 1..8)) {
        let totals = document_totals(&details);
        prop_assert_eq!(totals.grand_total, round2(totals.subtotal + totals.vat));
    }

    #[test]
    fn subtotal_is_sum_of_line_nets(details in prop::collection::vec(arb_line(), 1..8)) {
        let totals = document_totals(&details);
        let sum: Decimal = details.iter().map(line_net).sum();
        prop_assert_eq!(totals.subtotal, round2(sum));
    }

    #[test]
    fn vat_matches_per_rate_reference(details in prop::collection::vec(arb_line(), 1..8)) {
        // Reference computation: one rounding per distinct rate over
        // the summed group net.
        let mut rates: Vec<Decimal> = Vec::new();
        for item in &details {
            if !rates.contains(&item.vat) {
                rates.push(item.vat);
            }
        }
        let reference: Decimal = rates
            .iter()
            .map(|rate| {
                let group: Decimal = details
                    .iter()
                    .filter(|item| item.vat == *rate)
                    .map(line_net)
                    .sum();
                round2(round2(group) * *rate / dec!(100))
            })
            .sum();
        let totals = document_totals(&details);
        prop_assert_eq!(totals.vat, reference);
    }

    #[test]
    fn line_net_never_exceeds_base_or_goes_negative(item in arb_line()) {
        let net = line_net(&item);
        prop_assert!(net >= Decimal::ZERO);
        prop_assert!(net <= round2(item.quantity * item.price));
    }

    #[test]
    fn line_items_roundtrip_exactly(details in prop::collection::vec(arb_line(), 1..6)) {
        let original = Invoice {
            number: Some("INV-PROP".into()),
            details,
            ..Invoice::default()
        };
        let xml = factuur::generate(&Document::Invoice(original.clone())).unwrap();
        let Document::Invoice(parsed) = factuur::parse(&xml).unwrap() else {
            panic!("expected an invoice");
        };
        prop_assert_eq!(parsed.details.len(), original.details.len());
        for (parsed_line, original_line) in parsed.details.iter().zip(&original.details) {
            prop_assert_eq!(&parsed_line.name, &original_line.name);
            prop_assert_eq!(parsed_line.quantity, original_line.quantity);
            prop_assert_eq!(parsed_line.price, original_line.price);
            prop_assert_eq!(parsed_line.vat, original_line.vat);
            prop_assert_eq!(parsed_line.discount, original_line.discount);
            prop_assert_eq!(parsed_line.tax_category, original_line.tax_category);
        }
    }
}
