//! Standard Business Document Header (SBDH) transport envelope.
//!
//! The envelope carries routing metadata — sender/receiver participant
//! identifiers, the document type, and the Peppol process — around an
//! already generated UBL document. It is transport-only: the parser
//! discards it on read, so round-trip fidelity is defined at the inner
//! document level.

use chrono::Utc;
use uuid::Uuid;

use crate::core::{Document, FactuurError, Party, schemes};
use crate::ubl::xml::XmlWriter;
use crate::ubl::{BILLING_PROFILE_ID, RESPONSE_PROFILE_ID, ns};

/// SBDH namespace URI.
pub const SBDH_NS: &str =
    "http://www.unece.org/cefact/namespaces/StandardBusinessDocumentHeader";

/// ISO 6523 participant identifier authority used on the Peppol network.
pub const PARTICIPANT_AUTHORITY: &str = "iso6523-actorid-upis";

/// Peppol document type identifier for invoices (SMP routing).
pub const INVOICE_DOCTYPE_ID: &str = "urn:oasis:names:specification:ubl:schema:xsd:Invoice-2::Invoice##urn:cen.eu:en16931:2017#compliant#urn:fdc:peppol.eu:2017:poacc:billing:3.0::2.1";

/// Peppol document type identifier for credit notes (SMP routing).
pub const CREDIT_NOTE_DOCTYPE_ID: &str = "urn:oasis:names:specification:ubl:schema:xsd:CreditNote-2::CreditNote##urn:cen.eu:en16931:2017#compliant#urn:fdc:peppol.eu:2017:poacc:billing:3.0::2.1";

/// Peppol document type identifier for invoice responses (SMP routing).
pub const RESPONSE_DOCTYPE_ID: &str = "urn:oasis:names:specification:ubl:schema:xsd:ApplicationResponse-2::ApplicationResponse##urn:fdc:peppol.eu:poacc:trns:invoice_response:3::2.1";

/// Per-type routing metadata stamped into the header.
struct Routing {
    standard: &'static str,
    type_name: &'static str,
    document_type_id: &'static str,
    process_id: &'static str,
}

fn routing_for(document: &Document) -> Routing {
    match document {
        Document::Invoice(_) => Routing {
            standard: ns::INVOICE,
            type_name: "Invoice",
            document_type_id: INVOICE_DOCTYPE_ID,
            process_id: BILLING_PROFILE_ID,
        },
        Document::CreditNote(_) => Routing {
            standard: ns::CREDIT_NOTE,
            type_name: "CreditNote",
            document_type_id: CREDIT_NOTE_DOCTYPE_ID,
            // Credit notes travel in the same billing process as invoices.
            process_id: BILLING_PROFILE_ID,
        },
        Document::ApplicationResponse(_) => Routing {
            standard: ns::APPLICATION_RESPONSE,
            type_name: "ApplicationResponse",
            document_type_id: RESPONSE_DOCTYPE_ID,
            process_id: RESPONSE_PROFILE_ID,
        },
    }
}

/// `{scheme}:{endpoint}` participant identifier. The receiver side
/// falls back to the numeric portion of the VAT identifier when no
/// explicit endpoint is present.
fn participant_id(party: &Party, with_vat_fallback: bool) -> String {
    let endpoint = if with_vat_fallback {
        schemes::endpoint_or_vat_digits(party)
    } else {
        party.endpoint_id.clone()
    };
    format!(
        "{}:{}",
        schemes::party_scheme(party),
        endpoint.unwrap_or_default()
    )
}

fn strip_prolog(xml: &str) -> &str {
    let trimmed = xml.trim_start();
    if trimmed.starts_with("<?xml") {
        match trimmed.find("?>") {
            Some(pos) => trimmed[pos + 2..].trim_start(),
            None => trimmed,
        }
    } else {
        trimmed
    }
}

/// Wrap a generated document in an SBDH envelope.
///
/// Routing metadata is derived from the record: supplier/sender becomes
/// the SBDH sender, customer/receiver the SBDH receiver. The inner
/// document is nested unchanged apart from its XML prolog.
pub fn wrap(document_xml: &str, document: &Document) -> Result<String, FactuurError> {
    let (sender, receiver) = match document {
        Document::Invoice(invoice) => (&invoice.supplier, &invoice.customer),
        Document::CreditNote(credit) => (&credit.supplier, &credit.customer),
        Document::ApplicationResponse(response) => (&response.sender, &response.receiver),
    };
    let routing = routing_for(document);
    let created = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let instance = Uuid::new_v4().to_string();

    let mut w = XmlWriter::new()?;
    w.start_element_with_attrs("StandardBusinessDocument", &[("xmlns", SBDH_NS)])?;
    w.start_element("StandardBusinessDocumentHeader")?;
    w.text_element("HeaderVersion", "1.0")?;

    w.start_element("Sender")?;
    w.text_element_with_attrs(
        "Identifier",
        &participant_id(sender, false),
        &[("Authority", PARTICIPANT_AUTHORITY)],
    )?;
    w.end_element("Sender")?;

    w.start_element("Receiver")?;
    w.text_element_with_attrs(
        "Identifier",
        &participant_id(receiver, true),
        &[("Authority", PARTICIPANT_AUTHORITY)],
    )?;
    w.end_element("Receiver")?;

    w.start_element("DocumentIdentification")?;
    w.text_element("Standard", routing.standard)?;
    w.text_element("TypeVersion", "2.1")?;
    w.text_element("InstanceIdentifier", &instance)?;
    w.text_element("Type", routing.type_name)?;
    w.text_element("CreationDateAndTime", &created)?;
    w.end_element("DocumentIdentification")?;

    w.start_element("BusinessScope")?;
    w.start_element("Scope")?;
    w.text_element("Type", "DOCUMENTID")?;
    w.text_element("InstanceIdentifier", routing.document_type_id)?;
    w.text_element("Identifier", "busdox-docid-qns")?;
    w.end_element("Scope")?;
    w.start_element("Scope")?;
    w.text_element("Type", "PROCESSID")?;
    w.text_element("InstanceIdentifier", routing.process_id)?;
    w.text_element("Identifier", "cenbii-procid-ubl")?;
    w.end_element("Scope")?;
    w.end_element("BusinessScope")?;

    w.end_element("StandardBusinessDocumentHeader")?;
    w.raw_xml(strip_prolog(document_xml))?;
    w.end_element("StandardBusinessDocument")?;
    w.into_string()
}
