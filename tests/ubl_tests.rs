#![cfg(feature = "ubl")]

use chrono::NaiveDate;
use factuur::{
    ApplicationResponse, Attachment, CreditNote, Document, Invoice, LineItem, Party, TaxCategory,
};
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn supplier() -> Party {
    Party {
        name: Some("Acme Facturen BV".into()),
        country: Some("NL".into()),
        endpoint_id: Some("87654321".into()),
        street: Some("Stationsplein 10".into()),
        city: Some("Utrecht".into()),
        zipcode: Some("3511 ED".into()),
        vat: Some("NL123456789B01".into()),
        email: Some("billing@acme.nl".into()),
        iban: Some("NL91ABNA0417164300".into()),
        ..Party::default()
    }
}

fn customer() -> Party {
    Party {
        name: Some("Kunde GmbH".into()),
        country: Some("DE".into()),
        endpoint_id: Some("123456789".into()),
        street: Some("Unter den Linden".into()),
        housenumber: Some("5".into()),
        city: Some("Berlin".into()),
        zipcode: Some("10117".into()),
        vat: Some("DE123456789".into()),
        ..Party::default()
    }
}

fn invoice() -> Invoice {
    Invoice {
        number: Some("INV-2025-0042".into()),
        date: Some(date(2025, 3, 1)),
        expires: Some(date(2025, 3, 31)),
        order_reference: Some("PO-7001".into()),
        payment_id: Some("INV-2025-0042".into()),
        payment_means_code: Some("30".into()),
        supplier: supplier(),
        customer: customer(),
        details: vec![
            LineItem {
                name: "Consulting".into(),
                quantity: dec!(10),
                price: dec!(95),
                vat: dec!(21),
                ..LineItem::default()
            },
            LineItem {
                name: "Hosting".into(),
                quantity: dec!(1),
                price: dec!(49.90),
                vat: dec!(21),
                discount: dec!(10),
                ..LineItem::default()
            },
        ],
        attachments: vec![Attachment {
            filename: "timesheet.pdf".into(),
            mime_type: "application/pdf".into(),
            data: "SGVsbG8=".into(),
        }],
        note: Some("March engagement".into()),
        payment_terms: Some("Payable within 30 days".into()),
        ..Invoice::default()
    }
}

fn credit_note() -> CreditNote {
    CreditNote {
        number: Some("CN-2025-0007".into()),
        date: Some(date(2025, 4, 2)),
        billing_references: vec!["INV-2025-0042".into(), "INV-2025-0051".into()],
        payment_id: Some("CN-2025-0007".into()),
        payment_means_code: Some("30".into()),
        supplier: supplier(),
        customer: customer(),
        details: vec![LineItem {
            name: "Hosting refund".into(),
            quantity: dec!(1),
            price: dec!(49.90),
            vat: dec!(21),
            ..LineItem::default()
        }],
        ..CreditNote::default()
    }
}

fn application_response() -> ApplicationResponse {
    ApplicationResponse {
        id: Some("MLR-2025-0003".into()),
        date: Some(date(2025, 3, 2)),
        response_code: Some("AP".into()),
        document_reference: Some("INV-2025-0042".into()),
        status_reason: Some("Document accepted".into()),
        sender: Party {
            name: Some("Kunde GmbH".into()),
            country: Some("DE".into()),
            endpoint_id: Some("123456789".into()),
            ..Party::default()
        },
        receiver: Party {
            name: Some("Acme Facturen BV".into()),
            country: Some("NL".into()),
            endpoint_id: Some("87654321".into()),
            ..Party::default()
        },
        ..ApplicationResponse::default()
    }
}

// ---------------------------------------------------------------------------
// Invoice generation
// ---------------------------------------------------------------------------

#[test]
fn invoice_generation_produces_valid_xml() {
    let xml = factuur::generate(&Document::Invoice(invoice())).unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains("urn:oasis:names:specification:ubl:schema:xsd:Invoice-2"));
    assert!(xml.contains("urn:fdc:peppol.eu:2017:poacc:billing:3.0"));
}

#[test]
fn invoice_contains_metadata() {
    let xml = factuur::generate(&Document::Invoice(invoice())).unwrap();
    assert!(xml.contains("<cbc:ID>INV-2025-0042</cbc:ID>"));
    assert!(xml.contains("<cbc:IssueDate>2025-03-01</cbc:IssueDate>"));
    assert!(xml.contains("<cbc:DueDate>2025-03-31</cbc:DueDate>"));
    assert!(xml.contains("<cbc:InvoiceTypeCode>380</cbc:InvoiceTypeCode>"));
    assert!(xml.contains("<cbc:DocumentCurrencyCode>EUR</cbc:DocumentCurrencyCode>"));
    assert!(xml.contains("<cbc:ID>PO-7001</cbc:ID>"));
}

#[test]
fn invoice_contains_party_details() {
    let xml = factuur::generate(&Document::Invoice(invoice())).unwrap();
    assert!(xml.contains("<cbc:RegistrationName>Acme Facturen BV</cbc:RegistrationName>"));
    assert!(xml.contains("<cbc:CompanyID>NL123456789B01</cbc:CompanyID>"));
    // Customer street and house number combine into one element.
    assert!(xml.contains("<cbc:StreetName>Unter den Linden 5</cbc:StreetName>"));
    // Endpoint schemes inferred from country: NL → 0106, DE → 0204.
    assert!(xml.contains("<cbc:EndpointID schemeID=\"0106\">87654321</cbc:EndpointID>"));
    assert!(xml.contains("<cbc:EndpointID schemeID=\"0204\">123456789</cbc:EndpointID>"));
}

#[test]
fn invoice_contains_payment_details() {
    let xml = factuur::generate(&Document::Invoice(invoice())).unwrap();
    assert!(xml.contains("<cbc:PaymentMeansCode>30</cbc:PaymentMeansCode>"));
    assert!(xml.contains("<cbc:PaymentID>INV-2025-0042</cbc:PaymentID>"));
    assert!(xml.contains("<cbc:ID>NL91ABNA0417164300</cbc:ID>"));
    assert!(xml.contains("<cbc:Note>Payable within 30 days</cbc:Note>"));
}

#[test]
fn invoice_defaults_order_reference_to_na() {
    let mut inv = invoice();
    inv.order_reference = None;
    let xml = factuur::generate(&Document::Invoice(inv)).unwrap();
    assert!(xml.contains("<cbc:ID>NA</cbc:ID>"));
}

#[test]
fn invoice_emits_attachment_block() {
    let xml = factuur::generate(&Document::Invoice(invoice())).unwrap();
    assert!(xml.contains("mimeCode=\"application/pdf\""));
    assert!(xml.contains("filename=\"timesheet.pdf\""));
    assert!(xml.contains(">SGVsbG8=</cbc:EmbeddedDocumentBinaryObject>"));
}

#[test]
fn empty_attachment_list_emits_no_reference_block() {
    let mut inv = invoice();
    inv.attachments.clear();
    let xml = factuur::generate(&Document::Invoice(inv)).unwrap();
    assert!(!xml.contains("AdditionalDocumentReference"));
}

#[test]
fn discounted_line_emits_allowance() {
    let xml = factuur::generate(&Document::Invoice(invoice())).unwrap();
    // 49.90 at 10% discount: allowance 4.99, net 44.91.
    assert!(xml.contains("<cbc:Amount currencyID=\"EUR\">4.99</cbc:Amount>"));
    assert!(xml.contains("<cbc:LineExtensionAmount currencyID=\"EUR\">44.91</cbc:LineExtensionAmount>"));
}

// ---------------------------------------------------------------------------
// Round-trips
// ---------------------------------------------------------------------------

#[test]
fn invoice_roundtrip() {
    let original = invoice();
    let xml = factuur::generate(&Document::Invoice(original.clone())).unwrap();
    let Document::Invoice(parsed) = factuur::parse(&xml).unwrap() else {
        panic!("expected an invoice");
    };

    assert_eq!(parsed.number, original.number);
    assert_eq!(parsed.date, original.date);
    assert_eq!(parsed.expires, original.expires);
    assert_eq!(parsed.order_reference, original.order_reference);
    assert_eq!(parsed.payment_id, original.payment_id);
    assert_eq!(parsed.payment_means_code, original.payment_means_code);
    assert_eq!(parsed.note, original.note);
    assert_eq!(parsed.payment_terms, original.payment_terms);

    assert_eq!(parsed.supplier.name, original.supplier.name);
    assert_eq!(parsed.supplier.vat, original.supplier.vat);
    assert_eq!(parsed.supplier.iban, original.supplier.iban);
    assert_eq!(parsed.supplier.street, original.supplier.street);
    assert_eq!(parsed.customer.name, original.customer.name);
    assert_eq!(parsed.customer.street, original.customer.street);
    assert_eq!(parsed.customer.housenumber, original.customer.housenumber);
    assert_eq!(parsed.customer.vat, original.customer.vat);

    assert_eq!(parsed.details.len(), original.details.len());
    for (parsed_line, original_line) in parsed.details.iter().zip(&original.details) {
        assert_eq!(parsed_line.name, original_line.name);
        assert_eq!(parsed_line.quantity, original_line.quantity);
        assert_eq!(parsed_line.price, original_line.price);
        assert_eq!(parsed_line.vat, original_line.vat);
        assert_eq!(parsed_line.discount, original_line.discount);
        assert_eq!(parsed_line.tax_category, original_line.tax_category);
    }

    assert_eq!(parsed.attachments, original.attachments);
    // Totals are computed on generation and read back on parse.
    let totals = parsed.totals.expect("parsed totals");
    assert_eq!(totals.line_extension_amount, Some(dec!(994.91)));
    assert_eq!(totals.tax_amount, Some(dec!(208.93)));
    assert_eq!(totals.tax_inclusive_amount, Some(dec!(1203.84)));
}

#[test]
fn credit_note_roundtrip() {
    let original = credit_note();
    let xml = factuur::generate(&Document::CreditNote(original.clone())).unwrap();
    assert!(xml.contains("<cbc:CreditNoteTypeCode>381</cbc:CreditNoteTypeCode>"));
    assert!(!xml.contains("DueDate"));

    let Document::CreditNote(parsed) = factuur::parse(&xml).unwrap() else {
        panic!("expected a credit note");
    };
    assert_eq!(parsed.number, original.number);
    assert_eq!(parsed.billing_references, original.billing_references);
    assert_eq!(parsed.details.len(), 1);
    assert_eq!(parsed.details[0].price, dec!(49.90));
}

#[test]
fn application_response_roundtrip() {
    let original = application_response();
    let xml = factuur::generate(&Document::ApplicationResponse(original.clone())).unwrap();
    assert!(xml.contains("urn:fdc:peppol.eu:poacc:trns:invoice_response:3"));

    let Document::ApplicationResponse(parsed) = factuur::parse(&xml).unwrap() else {
        panic!("expected an application response");
    };
    assert_eq!(parsed.id, original.id);
    assert_eq!(parsed.date, original.date);
    assert_eq!(parsed.response_code, original.response_code);
    assert_eq!(parsed.document_reference, original.document_reference);
    assert_eq!(parsed.status_reason, original.status_reason);
    assert_eq!(parsed.sender.name, original.sender.name);
    assert_eq!(parsed.receiver.name, original.receiver.name);
}

#[test]
fn generated_xml_reparses_identically() {
    // A second generate→parse cycle is a fixed point: the first parse
    // already normalized every field.
    let xml = factuur::generate(&Document::Invoice(invoice())).unwrap();
    let first = factuur::parse(&xml).unwrap();
    let xml2 = factuur::generate(&first).unwrap();
    let second = factuur::parse(&xml2).unwrap();
    assert_eq!(first, second);
}

// ---------------------------------------------------------------------------
// Identifier handling
// ---------------------------------------------------------------------------

#[test]
fn vat_is_never_rebuilt_from_country() {
    // A Swiss customer holding a Belgian VAT number keeps "BE…".
    let mut inv = invoice();
    inv.customer.vat = Some("BE0123456749".into());
    inv.customer.country = Some("CH".into());
    inv.customer.endpoint_id = None;

    let xml = factuur::generate(&Document::Invoice(inv)).unwrap();
    assert!(xml.contains("<cbc:CompanyID>BE0123456749</cbc:CompanyID>"));
    // The endpoint falls back to the VAT digits under the Swiss scheme.
    assert!(xml.contains("<cbc:EndpointID schemeID=\"9927\">0123456749</cbc:EndpointID>"));

    let Document::Invoice(parsed) = factuur::parse(&xml).unwrap() else {
        panic!("expected an invoice");
    };
    assert_eq!(parsed.customer.vat.as_deref(), Some("BE0123456749"));
    assert_eq!(parsed.customer.country.as_deref(), Some("CH"));
}

#[test]
fn explicit_scheme_overrides_country_inference() {
    let mut inv = invoice();
    inv.supplier.scheme = Some("9944".into());
    let xml = factuur::generate(&Document::Invoice(inv)).unwrap();
    assert!(xml.contains("<cbc:EndpointID schemeID=\"9944\">87654321</cbc:EndpointID>"));
}

#[test]
fn document_identifier_keeps_final_slash_token() {
    let xml = r#"<?xml version="1.0"?>
<Invoice xmlns="urn:oasis:names:specification:ubl:schema:xsd:Invoice-2"
         xmlns:cbc="urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2">
  <cbc:ID>2025/Q1/INV-9</cbc:ID>
  <cbc:IssueDate>2025-02-01</cbc:IssueDate>
</Invoice>"#;
    let Document::Invoice(parsed) = factuur::parse(xml).unwrap() else {
        panic!("expected an invoice");
    };
    assert_eq!(parsed.number.as_deref(), Some("INV-9"));
}

#[test]
fn billing_references_are_stripped_and_ordered() {
    let xml = r#"<?xml version="1.0"?>
<CreditNote xmlns="urn:oasis:names:specification:ubl:schema:xsd:CreditNote-2"
            xmlns:cac="urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2"
            xmlns:cbc="urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2">
  <cbc:ID>CN-1</cbc:ID>
  <cac:BillingReference>
    <cac:InvoiceDocumentReference><cbc:ID>archive/INV-1</cbc:ID></cac:InvoiceDocumentReference>
  </cac:BillingReference>
  <cac:BillingReference>
    <cac:InvoiceDocumentReference><cbc:ID>INV-2</cbc:ID></cac:InvoiceDocumentReference>
  </cac:BillingReference>
</CreditNote>"#;
    let Document::CreditNote(parsed) = factuur::parse(xml).unwrap() else {
        panic!("expected a credit note");
    };
    assert_eq!(parsed.billing_references, vec!["INV-1", "INV-2"]);
}

// ---------------------------------------------------------------------------
// Tax categories
// ---------------------------------------------------------------------------

#[test]
fn default_category_is_omitted_through_roundtrip() {
    // vat 21 with no explicit category generates "S" and reparses to
    // no category at all — the defaulting itself round-trips.
    let xml = factuur::generate(&Document::Invoice(invoice())).unwrap();
    assert!(xml.contains("<cbc:ID>S</cbc:ID>"));
    let Document::Invoice(parsed) = factuur::parse(&xml).unwrap() else {
        panic!("expected an invoice");
    };
    assert!(parsed.details.iter().all(|line| line.tax_category.is_none()));
}

#[test]
fn explicit_category_and_exemption_roundtrip() {
    let mut inv = invoice();
    inv.details = vec![LineItem {
        name: "Cross-border supply".into(),
        quantity: dec!(1),
        price: dec!(500),
        vat: dec!(0),
        tax_category: Some(TaxCategory::IntraCommunity),
        tax_exemption_reason_code: Some("VATEX-EU-IC".into()),
        tax_exemption_reason: Some("Intra-Community supply".into()),
        ..LineItem::default()
    }];
    let xml = factuur::generate(&Document::Invoice(inv)).unwrap();
    assert!(xml.contains("<cbc:ID>K</cbc:ID>"));
    assert!(xml.contains("<cbc:TaxExemptionReasonCode>VATEX-EU-IC</cbc:TaxExemptionReasonCode>"));
    assert!(xml.contains("<cbc:TaxExemptionReason>Intra-Community supply</cbc:TaxExemptionReason>"));

    // Exemption data lives at the subtotal level on the wire and comes
    // back attached to the matching line.
    let Document::Invoice(parsed) = factuur::parse(&xml).unwrap() else {
        panic!("expected an invoice");
    };
    let line = &parsed.details[0];
    assert_eq!(line.tax_category, Some(TaxCategory::IntraCommunity));
    assert_eq!(line.tax_exemption_reason_code.as_deref(), Some("VATEX-EU-IC"));
    assert_eq!(line.tax_exemption_reason.as_deref(), Some("Intra-Community supply"));
}
