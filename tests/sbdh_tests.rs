#![cfg(feature = "sbdh")]

use chrono::NaiveDate;
use factuur::{CreditNote, Document, Invoice, LineItem, Party};
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn invoice() -> Document {
    Document::Invoice(Invoice {
        number: Some("INV-2025-0100".into()),
        date: Some(date(2025, 5, 12)),
        supplier: Party {
            name: Some("Acme Facturen BV".into()),
            country: Some("NL".into()),
            endpoint_id: Some("87654321".into()),
            vat: Some("NL123456789B01".into()),
            ..Party::default()
        },
        customer: Party {
            name: Some("Client SPRL".into()),
            country: Some("BE".into()),
            vat: Some("BE0123456749".into()),
            ..Party::default()
        },
        details: vec![LineItem {
            name: "Subscription".into(),
            quantity: dec!(1),
            price: dec!(250),
            vat: dec!(21),
            ..LineItem::default()
        }],
        ..Invoice::default()
    })
}

// ---------------------------------------------------------------------------
// Envelope content
// ---------------------------------------------------------------------------

#[test]
fn envelope_contains_routing_metadata() {
    let xml = factuur::generate_with_sbdh(&invoice()).unwrap();
    assert!(xml.contains("<StandardBusinessDocument"));
    assert!(xml.contains("unece.org/cefact/namespaces/StandardBusinessDocumentHeader"));
    assert!(xml.contains("<HeaderVersion>1.0</HeaderVersion>"));
    assert!(xml.contains("<Type>Invoice</Type>"));
    assert!(xml.contains("<TypeVersion>2.1</TypeVersion>"));
    assert!(xml.contains("urn:fdc:peppol.eu:2017:poacc:billing:01:1.0"));
}

#[test]
fn envelope_sender_and_receiver_identifiers() {
    let xml = factuur::generate_with_sbdh(&invoice()).unwrap();
    // Sender: explicit endpoint under the Dutch scheme.
    assert!(xml.contains(">0106:87654321</Identifier>"));
    // Receiver: no endpoint, falls back to the VAT digits.
    assert!(xml.contains(">0208:0123456749</Identifier>"));
    assert!(xml.contains("Authority=\"iso6523-actorid-upis\""));
}

#[test]
fn envelope_nests_inner_document_without_prolog() {
    let xml = factuur::generate_with_sbdh(&invoice()).unwrap();
    // Exactly one prolog: the envelope's own.
    assert_eq!(xml.matches("<?xml").count(), 1);
    assert!(xml.contains("<cbc:ID>INV-2025-0100</cbc:ID>"));
}

#[test]
fn credit_note_envelope_type() {
    let credit = Document::CreditNote(CreditNote {
        number: Some("CN-1".into()),
        supplier: Party {
            country: Some("NL".into()),
            endpoint_id: Some("87654321".into()),
            ..Party::default()
        },
        customer: Party {
            country: Some("BE".into()),
            vat: Some("BE0123456749".into()),
            ..Party::default()
        },
        ..CreditNote::default()
    });
    let xml = factuur::generate_with_sbdh(&credit).unwrap();
    assert!(xml.contains("<Type>CreditNote</Type>"));
    assert!(xml.contains("CreditNote-2::CreditNote##"));
}

// ---------------------------------------------------------------------------
// Neutrality
// ---------------------------------------------------------------------------

#[test]
fn envelope_is_invisible_to_the_parser() {
    let doc = invoice();
    let bare = factuur::parse(&factuur::generate(&doc).unwrap()).unwrap();
    let wrapped = factuur::parse(&factuur::generate_with_sbdh(&doc).unwrap()).unwrap();
    assert_eq!(bare, wrapped);
}

#[test]
fn foreign_envelope_unwraps() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<sbd:StandardBusinessDocument xmlns:sbd="http://www.unece.org/cefact/namespaces/StandardBusinessDocumentHeader">
  <sbd:StandardBusinessDocumentHeader>
    <sbd:HeaderVersion>1.0</sbd:HeaderVersion>
    <sbd:Sender><sbd:Identifier Authority="iso6523-actorid-upis">0106:87654321</sbd:Identifier></sbd:Sender>
    <sbd:Receiver><sbd:Identifier Authority="iso6523-actorid-upis">0208:0123456749</sbd:Identifier></sbd:Receiver>
  </sbd:StandardBusinessDocumentHeader>
  <Invoice xmlns="urn:oasis:names:specification:ubl:schema:xsd:Invoice-2"
           xmlns:cbc="urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2">
    <cbc:ID>INV-77</cbc:ID>
    <cbc:IssueDate>2025-01-15</cbc:IssueDate>
  </Invoice>
</sbd:StandardBusinessDocument>"#;
    let Document::Invoice(parsed) = factuur::parse(xml).unwrap() else {
        panic!("expected an invoice");
    };
    assert_eq!(parsed.number.as_deref(), Some("INV-77"));
    assert_eq!(parsed.date, NaiveDate::from_ymd_opt(2025, 1, 15));
}
