//! UBL 2.1 parsing and generation for Peppol BIS Billing 3.0.
//!
//! # Supported documents
//!
//! - **Invoice** (`InvoiceTypeCode` 380)
//! - **CreditNote** (`CreditNoteTypeCode` 381)
//! - **ApplicationResponse** (invoice response acknowledgments)
//!
//! Parsing auto-detects the document type and unwraps SBDH envelopes;
//! generation routes on the [`Document`] variant.

mod generate;
mod parse;
pub(crate) mod xml;

pub use generate::{application_response_xml, credit_note_xml, invoice_xml};
pub use parse::parse;

use crate::core::{Document, FactuurError};

/// Peppol BIS Billing 3.0 customization identifier (BT-24).
pub const BILLING_CUSTOMIZATION_ID: &str =
    "urn:cen.eu:en16931:2017#compliant#urn:fdc:peppol.eu:2017:poacc:billing:3.0";

/// Peppol BIS Billing 3.0 profile identifier (BT-23).
pub const BILLING_PROFILE_ID: &str = "urn:fdc:peppol.eu:2017:poacc:billing:01:1.0";

/// Peppol invoice response customization identifier.
pub const RESPONSE_CUSTOMIZATION_ID: &str = "urn:fdc:peppol.eu:poacc:trns:invoice_response:3";

/// Peppol invoice response profile identifier.
pub const RESPONSE_PROFILE_ID: &str = "urn:fdc:peppol.eu:poacc:bis:invoice_response:3";

/// All amounts are emitted in euro; the record carries no currency.
pub const DOCUMENT_CURRENCY: &str = "EUR";

/// UBL 2.1 namespace URIs.
pub mod ns {
    pub const INVOICE: &str = "urn:oasis:names:specification:ubl:schema:xsd:Invoice-2";
    pub const CREDIT_NOTE: &str = "urn:oasis:names:specification:ubl:schema:xsd:CreditNote-2";
    pub const APPLICATION_RESPONSE: &str =
        "urn:oasis:names:specification:ubl:schema:xsd:ApplicationResponse-2";
    pub const CAC: &str =
        "urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2";
    pub const CBC: &str = "urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2";
}

/// Generate UBL XML for a document record, routing on its variant.
pub fn generate(document: &Document) -> Result<String, FactuurError> {
    match document {
        Document::Invoice(invoice) => invoice_xml(invoice),
        Document::CreditNote(credit) => credit_note_xml(credit),
        Document::ApplicationResponse(response) => application_response_xml(response),
    }
}

/// Generate UBL XML and wrap it in an SBDH transport envelope.
#[cfg(feature = "sbdh")]
pub fn generate_with_sbdh(document: &Document) -> Result<String, FactuurError> {
    let xml = generate(document)?;
    crate::sbdh::wrap(&xml, document)
}
