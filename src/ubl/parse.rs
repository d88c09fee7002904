use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::NaiveDate;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::str::FromStr;

use crate::core::totals::round2;
use crate::core::*;

/// Parse a UBL document into a [`Document`] record.
///
/// Matching is namespace-agnostic: only element local names are
/// compared, so any prefix (or none) is accepted. The parser scans for
/// the first recognized root — `Invoice`, `CreditNote`, or
/// `ApplicationResponse` — anywhere in the stream, which also unwraps
/// SBDH envelopes: everything outside that subtree is transport
/// metadata and is discarded.
pub fn parse(xml: &str) -> Result<Document, FactuurError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut doc = DocBuf::default();
    let mut stack: Vec<String> = Vec::new();
    let mut kind: Option<DocKind> = None;
    let mut root_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e);
                match kind {
                    None => {
                        if let Some(k) = DocKind::from_root(&name) {
                            kind = Some(k);
                            root_depth = stack.len();
                        }
                    }
                    Some(_) => doc.capture_attrs(&stack, &name, e),
                }
                stack.push(name);
            }
            Ok(Event::Empty(ref e)) => {
                // A self-closing recognized root is a degenerate but
                // well-formed document.
                if kind.is_none() {
                    if let Some(k) = DocKind::from_root(&local_name(e)) {
                        return DocBuf::default().finish(k);
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if kind.is_some() {
                    let text = e.unescape().unwrap_or_default();
                    if !text.is_empty() {
                        doc.handle_text(&stack, &text);
                    }
                }
            }
            Ok(Event::End(_)) => {
                let ended = stack.pop().unwrap_or_default();
                if let Some(k) = kind {
                    if stack.len() == root_depth && ended == k.root_name() {
                        return doc.finish(k);
                    }
                    doc.handle_end(&stack, &ended);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FactuurError::Tokenization(e.to_string())),
            _ => {}
        }
    }

    Err(FactuurError::UnrecognizedDocument)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocKind {
    Invoice,
    CreditNote,
    ApplicationResponse,
}

impl DocKind {
    fn from_root(name: &str) -> Option<Self> {
        match name {
            "Invoice" => Some(Self::Invoice),
            "CreditNote" => Some(Self::CreditNote),
            "ApplicationResponse" => Some(Self::ApplicationResponse),
            _ => None,
        }
    }

    fn root_name(self) -> &'static str {
        match self {
            Self::Invoice => "Invoice",
            Self::CreditNote => "CreditNote",
            Self::ApplicationResponse => "ApplicationResponse",
        }
    }
}

fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned()
}

fn is_root(name: &str) -> bool {
    DocKind::from_root(name).is_some()
}

// Ancestor-membership context tests. Matching on the nearest meaningful
// ancestor keeps recurring element names like `ID` unambiguous without
// full-path comparison.

fn in_supplier(stack: &[String]) -> bool {
    stack
        .iter()
        .any(|s| s == "AccountingSupplierParty" || s == "SenderParty")
}

fn in_customer(stack: &[String]) -> bool {
    stack
        .iter()
        .any(|s| s == "AccountingCustomerParty" || s == "ReceiverParty")
}

fn in_line(stack: &[String]) -> bool {
    stack
        .iter()
        .any(|s| s == "InvoiceLine" || s == "CreditNoteLine")
}

fn has_ancestor(stack: &[String], name: &str) -> bool {
    stack.iter().any(|s| s == name)
}

/// Keep only the final `/`-delimited token of an identifier, dropping
/// any `<prefix>/` segments some producers prepend.
fn strip_reference(text: &str) -> String {
    text.rsplit('/').next().unwrap_or(text).to_string()
}

/// Split combined street text into street and house number: the street
/// is the longest leading run without a digit, the house number starts
/// at the first digit. Without any digit the whole text is the street.
fn split_street(text: &str) -> (Option<String>, Option<String>) {
    let non_empty = |s: &str| {
        let s = s.trim();
        if s.is_empty() { None } else { Some(s.to_string()) }
    };
    match text.find(|c: char| c.is_ascii_digit()) {
        Some(pos) => (non_empty(&text[..pos]), non_empty(&text[pos..])),
        None => (non_empty(text), None),
    }
}

fn lenient_decimal(value: Option<&str>) -> Decimal {
    value
        .and_then(|v| Decimal::from_str(v.trim()).ok())
        .unwrap_or(Decimal::ZERO)
}

fn opt_decimal(value: &Option<String>) -> Option<Decimal> {
    value
        .as_deref()
        .and_then(|v| Decimal::from_str(v.trim()).ok())
}

fn opt_date(value: &Option<String>) -> Option<NaiveDate> {
    value
        .as_deref()
        .and_then(|v| NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").ok())
}

#[derive(Default)]
struct PartyBuf {
    name: Option<String>,
    country: Option<String>,
    endpoint_id: Option<String>,
    scheme: Option<String>,
    street: Option<String>,
    city: Option<String>,
    zipcode: Option<String>,
    vat: Option<String>,
    email: Option<String>,
    iban: Option<String>,
}

impl PartyBuf {
    fn handle_text(&mut self, leaf: &str, parent: &str, text: &str) {
        match leaf {
            "EndpointID" => self.endpoint_id = Some(text.to_string()),
            "RegistrationName" if parent == "PartyLegalEntity" => {
                self.name = Some(text.to_string());
            }
            "Name" if parent == "PartyName" => {
                if self.name.is_none() {
                    self.name = Some(text.to_string());
                }
            }
            "CompanyID" if parent == "PartyTaxScheme" => self.vat = Some(text.to_string()),
            "StreetName" => self.street = Some(text.to_string()),
            "CityName" => self.city = Some(text.to_string()),
            "PostalZone" => self.zipcode = Some(text.to_string()),
            "IdentificationCode" if parent == "Country" => {
                self.country = Some(text.to_string());
            }
            "ElectronicMail" => self.email = Some(text.to_string()),
            _ => {}
        }
    }

    fn into_party(self, split_house_number: bool) -> Party {
        let (street, housenumber) = match (&self.street, split_house_number) {
            (Some(text), true) => split_street(text),
            (Some(text), false) => (Some(text.clone()), None),
            (None, _) => (None, None),
        };
        Party {
            name: self.name,
            country: self.country,
            endpoint_id: self.endpoint_id,
            scheme: self.scheme,
            street,
            housenumber,
            city: self.city,
            zipcode: self.zipcode,
            vat: self.vat,
            email: self.email,
            iban: self.iban,
        }
    }
}

#[derive(Default)]
struct LineBuf {
    name: Option<String>,
    quantity: Option<String>,
    price: Option<String>,
    vat: Option<String>,
    line_net: Option<String>,
    tax_category: Option<String>,
}

#[derive(Default)]
struct AttachmentBuf {
    id: Option<String>,
    filename: Option<String>,
    mime_type: Option<String>,
    data: Option<String>,
}

#[derive(Default)]
struct SubtotalBuf {
    percent: Option<String>,
    category: Option<String>,
    exemption_reason_code: Option<String>,
    exemption_reason: Option<String>,
}

#[derive(Default)]
struct DocBuf {
    number: Option<String>,
    date: Option<String>,
    expires: Option<String>,
    order_reference: Option<String>,
    payment_id: Option<String>,
    payment_means_code: Option<String>,
    note: Option<String>,
    payment_terms: Option<String>,
    billing_references: Vec<String>,

    supplier: PartyBuf,
    customer: PartyBuf,

    details: Vec<LineItem>,
    current_line: Option<LineBuf>,

    attachments: Vec<Attachment>,
    current_attachment: Option<AttachmentBuf>,

    // (rate, category) → exemption code/text, from document-level
    // tax subtotals. Applied onto matching lines after the root closes.
    exemptions: Vec<((Decimal, TaxCategory), (Option<String>, Option<String>))>,
    current_subtotal: Option<SubtotalBuf>,

    tax_amount: Option<String>,
    line_extension_amount: Option<String>,
    tax_exclusive_amount: Option<String>,
    tax_inclusive_amount: Option<String>,
    payable_amount: Option<String>,
    allowance_total: Option<String>,
    charge_total: Option<String>,
    prepaid_amount: Option<String>,

    response_code: Option<String>,
    document_reference: Option<String>,
    status_reason: Option<String>,
}

impl DocBuf {
    /// Capture attributes that carry data on their own: the EndpointID
    /// scheme and the attachment binary-object metadata. `stack` holds
    /// the ancestors of the element being opened.
    fn capture_attrs(&mut self, stack: &[String], name: &str, e: &BytesStart) {
        match name {
            "EndpointID" => {
                for attr in e.attributes().flatten() {
                    if attr.key.local_name().as_ref() == b"schemeID" {
                        let value = String::from_utf8_lossy(&attr.value).into_owned();
                        if in_supplier(stack) {
                            self.supplier.scheme = Some(value);
                        } else if in_customer(stack) {
                            self.customer.scheme = Some(value);
                        }
                        break;
                    }
                }
            }
            "EmbeddedDocumentBinaryObject"
                if has_ancestor(stack, "AdditionalDocumentReference") =>
            {
                let att = self.current_attachment.get_or_insert_with(Default::default);
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).into_owned();
                    match attr.key.local_name().as_ref() {
                        b"mimeCode" => att.mime_type = Some(value),
                        b"filename" => att.filename = Some(value),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_text(&mut self, stack: &[String], text: &str) {
        let leaf = stack.last().map(String::as_str).unwrap_or("");
        let parent = if stack.len() >= 2 {
            stack[stack.len() - 2].as_str()
        } else {
            ""
        };

        if in_line(stack) {
            let line = self.current_line.get_or_insert_with(Default::default);
            match leaf {
                "InvoicedQuantity" | "CreditedQuantity" => {
                    line.quantity = Some(text.to_string());
                }
                "LineExtensionAmount" if parent == "InvoiceLine" || parent == "CreditNoteLine" => {
                    line.line_net = Some(text.to_string());
                }
                "Name" if parent == "Item" => line.name = Some(text.to_string()),
                "PriceAmount" if parent == "Price" => line.price = Some(text.to_string()),
                "ID" if parent == "ClassifiedTaxCategory" => {
                    line.tax_category = Some(text.to_string());
                }
                "Percent" if parent == "ClassifiedTaxCategory" => {
                    line.vat = Some(text.to_string());
                }
                _ => {}
            }
            return;
        }

        if has_ancestor(stack, "TaxSubtotal") {
            let subtotal = self.current_subtotal.get_or_insert_with(Default::default);
            match leaf {
                "Percent" if parent == "TaxCategory" => {
                    subtotal.percent = Some(text.to_string());
                }
                "ID" if parent == "TaxCategory" => subtotal.category = Some(text.to_string()),
                "TaxExemptionReasonCode" => {
                    subtotal.exemption_reason_code = Some(text.to_string());
                }
                "TaxExemptionReason" => subtotal.exemption_reason = Some(text.to_string()),
                _ => {}
            }
            return;
        }

        if has_ancestor(stack, "TaxTotal") {
            if leaf == "TaxAmount" && parent == "TaxTotal" {
                self.tax_amount = Some(text.to_string());
            }
            return;
        }

        if has_ancestor(stack, "PaymentMeans") {
            match leaf {
                "PaymentMeansCode" => self.payment_means_code = Some(text.to_string()),
                "PaymentID" => self.payment_id = Some(text.to_string()),
                "ID" if parent == "PayeeFinancialAccount" => {
                    self.supplier.iban = Some(text.to_string());
                }
                _ => {}
            }
            return;
        }

        if has_ancestor(stack, "BillingReference") {
            if leaf == "ID" && parent == "InvoiceDocumentReference" {
                self.billing_references.push(strip_reference(text));
            }
            return;
        }

        if has_ancestor(stack, "AdditionalDocumentReference") {
            let att = self.current_attachment.get_or_insert_with(Default::default);
            match leaf {
                "ID" if parent == "AdditionalDocumentReference" => {
                    att.id = Some(text.to_string());
                }
                "EmbeddedDocumentBinaryObject" => att.data = Some(text.to_string()),
                _ => {}
            }
            return;
        }

        if has_ancestor(stack, "DocumentResponse") {
            match leaf {
                "ResponseCode" => self.response_code = Some(text.to_string()),
                "ID" if parent == "DocumentReference" => {
                    self.document_reference = Some(text.to_string());
                }
                "StatusReason" => self.status_reason = Some(text.to_string()),
                _ => {}
            }
            return;
        }

        if in_supplier(stack) {
            self.supplier.handle_text(leaf, parent, text);
            return;
        }

        if in_customer(stack) {
            self.customer.handle_text(leaf, parent, text);
            return;
        }

        match leaf {
            "ID" if is_root(parent) => self.number = Some(strip_reference(text)),
            "IssueDate" if is_root(parent) => self.date = Some(text.to_string()),
            "DueDate" => self.expires = Some(text.to_string()),
            "ID" if parent == "OrderReference" => {
                self.order_reference = Some(text.to_string());
            }
            "Note" if is_root(parent) => self.note = Some(text.to_string()),
            "Note" if parent == "PaymentTerms" => {
                self.payment_terms = Some(text.to_string());
            }
            "LineExtensionAmount" if parent == "LegalMonetaryTotal" => {
                self.line_extension_amount = Some(text.to_string());
            }
            "TaxExclusiveAmount" if parent == "LegalMonetaryTotal" => {
                self.tax_exclusive_amount = Some(text.to_string());
            }
            "TaxInclusiveAmount" if parent == "LegalMonetaryTotal" => {
                self.tax_inclusive_amount = Some(text.to_string());
            }
            "PayableAmount" if parent == "LegalMonetaryTotal" => {
                self.payable_amount = Some(text.to_string());
            }
            "AllowanceTotalAmount" if parent == "LegalMonetaryTotal" => {
                self.allowance_total = Some(text.to_string());
            }
            "ChargeTotalAmount" if parent == "LegalMonetaryTotal" => {
                self.charge_total = Some(text.to_string());
            }
            "PrepaidAmount" if parent == "LegalMonetaryTotal" => {
                self.prepaid_amount = Some(text.to_string());
            }
            _ => {}
        }
    }

    /// Entity-close dispatch. `stack` no longer contains `ended`.
    fn handle_end(&mut self, stack: &[String], ended: &str) {
        match ended {
            "InvoiceLine" | "CreditNoteLine" => self.close_line(),
            "TaxSubtotal" if !in_line(stack) => self.close_subtotal(),
            "AdditionalDocumentReference" => self.close_attachment(),
            _ => {}
        }
    }

    fn close_line(&mut self) {
        let Some(buf) = self.current_line.take() else {
            return;
        };
        let quantity = lenient_decimal(buf.quantity.as_deref());
        let price = lenient_decimal(buf.price.as_deref());
        let vat = lenient_decimal(buf.vat.as_deref());
        let net = lenient_decimal(buf.line_net.as_deref());

        // The discount is not read from the wire: it is reconstructed
        // from its effect on the emitted net total.
        let base = round2(quantity * price);
        let discount = if base > net && base > Decimal::ZERO {
            round2((base - net) / base * dec!(100))
        } else {
            Decimal::ZERO
        };

        let tax_category = buf
            .tax_category
            .as_deref()
            .map(|code| TaxCategory::from_code(code).unwrap_or(TaxCategory::Standard))
            .filter(|category| *category != TaxCategory::default_for_rate(vat));

        self.details.push(LineItem {
            name: buf.name.unwrap_or_default(),
            quantity,
            price,
            vat,
            discount,
            tax_category,
            tax_exemption_reason_code: None,
            tax_exemption_reason: None,
        });
    }

    fn close_subtotal(&mut self) {
        let Some(buf) = self.current_subtotal.take() else {
            return;
        };
        let rate = lenient_decimal(buf.percent.as_deref());
        let category = buf
            .category
            .as_deref()
            .and_then(TaxCategory::from_code)
            .unwrap_or(TaxCategory::Standard);
        self.exemptions.push((
            (rate, category),
            (buf.exemption_reason_code, buf.exemption_reason),
        ));
    }

    fn close_attachment(&mut self) {
        let Some(buf) = self.current_attachment.take() else {
            return;
        };
        // An attachment without decodable content is dropped.
        let Some(data) = buf.data else { return };
        let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        if BASE64.decode(compact.as_bytes()).is_err() {
            return;
        }
        self.attachments.push(Attachment {
            filename: buf.filename.or(buf.id).unwrap_or_default(),
            mime_type: buf.mime_type.unwrap_or_default(),
            data: compact,
        });
    }

    fn finish(mut self, kind: DocKind) -> Result<Document, FactuurError> {
        // Exemption justification is carried at the subtotal level on
        // the wire but exposed per line in the record.
        for line in &mut self.details {
            let key = (line.vat, line.effective_category());
            if let Some((_, (code, reason))) =
                self.exemptions.iter().find(|(k, _)| *k == key)
            {
                line.tax_exemption_reason_code = code.clone();
                line.tax_exemption_reason = reason.clone();
            }
        }

        let totals = ParsedTotals {
            tax_amount: opt_decimal(&self.tax_amount),
            line_extension_amount: opt_decimal(&self.line_extension_amount),
            tax_exclusive_amount: opt_decimal(&self.tax_exclusive_amount),
            tax_inclusive_amount: opt_decimal(&self.tax_inclusive_amount),
            payable_amount: opt_decimal(&self.payable_amount),
            allowance_total: opt_decimal(&self.allowance_total),
            charge_total: opt_decimal(&self.charge_total),
            prepaid_amount: opt_decimal(&self.prepaid_amount),
        };
        let totals = if totals.is_empty() { None } else { Some(totals) };

        let date = opt_date(&self.date);

        Ok(match kind {
            DocKind::Invoice => Document::Invoice(Invoice {
                number: self.number,
                date,
                expires: opt_date(&self.expires),
                order_reference: self.order_reference,
                payment_id: self.payment_id,
                payment_means_code: self.payment_means_code,
                supplier: self.supplier.into_party(false),
                customer: self.customer.into_party(true),
                details: self.details,
                attachments: self.attachments,
                note: self.note,
                payment_terms: self.payment_terms,
                totals,
            }),
            DocKind::CreditNote => Document::CreditNote(CreditNote {
                number: self.number,
                date,
                billing_references: self.billing_references,
                order_reference: self.order_reference,
                payment_id: self.payment_id,
                payment_means_code: self.payment_means_code,
                supplier: self.supplier.into_party(false),
                customer: self.customer.into_party(true),
                details: self.details,
                attachments: self.attachments,
                note: self.note,
                payment_terms: self.payment_terms,
                totals,
            }),
            DocKind::ApplicationResponse => {
                Document::ApplicationResponse(ApplicationResponse {
                    id: self.number,
                    date,
                    response_code: self.response_code,
                    document_reference: self.document_reference,
                    status_reason: self.status_reason,
                    note: self.note,
                    sender: self.supplier.into_party(false),
                    receiver: self.customer.into_party(false),
                })
            }
        })
    }
}
