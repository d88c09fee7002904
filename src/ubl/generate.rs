use rust_decimal::Decimal;

use super::xml::{XmlWriter, format_decimal};
use super::{
    BILLING_CUSTOMIZATION_ID, BILLING_PROFILE_ID, DOCUMENT_CURRENCY, RESPONSE_CUSTOMIZATION_ID,
    RESPONSE_PROFILE_ID, ns,
};
use crate::core::totals::{self, DocumentTotals, TaxSubtotal};
use crate::core::{
    ApplicationResponse, Attachment, CreditNote, FactuurError, Invoice, LineItem, Party, schemes,
};

/// Generate a Peppol BIS Billing 3.0 UBL Invoice.
pub fn invoice_xml(invoice: &Invoice) -> Result<String, FactuurError> {
    let totals = totals::document_totals(&invoice.details);
    let subtotals = totals::tax_subtotals(&invoice.details);

    let mut w = XmlWriter::new()?;
    w.start_element_with_attrs(
        "Invoice",
        &[
            ("xmlns", ns::INVOICE),
            ("xmlns:cac", ns::CAC),
            ("xmlns:cbc", ns::CBC),
        ],
    )?;

    w.text_element("cbc:CustomizationID", BILLING_CUSTOMIZATION_ID)?;
    w.text_element("cbc:ProfileID", BILLING_PROFILE_ID)?;
    w.opt_element("cbc:ID", invoice.number.as_deref())?;
    if let Some(date) = &invoice.date {
        w.text_element("cbc:IssueDate", &date.to_string())?;
    }
    // BT-9: due date, invoice only.
    if let Some(expires) = &invoice.expires {
        w.text_element("cbc:DueDate", &expires.to_string())?;
    }
    w.text_element("cbc:InvoiceTypeCode", "380")?;
    w.opt_element("cbc:Note", invoice.note.as_deref())?;
    w.text_element("cbc:DocumentCurrencyCode", DOCUMENT_CURRENCY)?;

    // BT-13 is required by the billing profile, "NA" when not supplied.
    w.start_element("cac:OrderReference")?;
    w.text_element("cbc:ID", invoice.order_reference.as_deref().unwrap_or("NA"))?;
    w.end_element("cac:OrderReference")?;

    write_attachments(&mut w, &invoice.attachments)?;
    write_party(&mut w, "cac:AccountingSupplierParty", &invoice.supplier, PartyRole::Supplier)?;
    write_party(&mut w, "cac:AccountingCustomerParty", &invoice.customer, PartyRole::Customer)?;
    write_payment_means(
        &mut w,
        invoice.payment_means_code.as_deref(),
        invoice.payment_id.as_deref(),
        invoice.supplier.iban.as_deref(),
    )?;
    write_payment_terms(&mut w, invoice.payment_terms.as_deref())?;
    write_tax_total(&mut w, &totals, &subtotals)?;
    write_monetary_total(&mut w, &totals)?;
    for (index, item) in invoice.details.iter().enumerate() {
        write_line(&mut w, index, item, LineKind::Invoice)?;
    }

    w.end_element("Invoice")?;
    w.into_string()
}

/// Generate a Peppol BIS Billing 3.0 UBL CreditNote.
pub fn credit_note_xml(credit: &CreditNote) -> Result<String, FactuurError> {
    let totals = totals::document_totals(&credit.details);
    let subtotals = totals::tax_subtotals(&credit.details);

    let mut w = XmlWriter::new()?;
    w.start_element_with_attrs(
        "CreditNote",
        &[
            ("xmlns", ns::CREDIT_NOTE),
            ("xmlns:cac", ns::CAC),
            ("xmlns:cbc", ns::CBC),
        ],
    )?;

    w.text_element("cbc:CustomizationID", BILLING_CUSTOMIZATION_ID)?;
    w.text_element("cbc:ProfileID", BILLING_PROFILE_ID)?;
    w.opt_element("cbc:ID", credit.number.as_deref())?;
    if let Some(date) = &credit.date {
        w.text_element("cbc:IssueDate", &date.to_string())?;
    }
    w.text_element("cbc:CreditNoteTypeCode", "381")?;
    w.opt_element("cbc:Note", credit.note.as_deref())?;
    w.text_element("cbc:DocumentCurrencyCode", DOCUMENT_CURRENCY)?;

    if let Some(order_reference) = &credit.order_reference {
        w.start_element("cac:OrderReference")?;
        w.text_element("cbc:ID", order_reference)?;
        w.end_element("cac:OrderReference")?;
    }

    // BG-3: one billing reference block per credited invoice, in order.
    for reference in &credit.billing_references {
        w.start_element("cac:BillingReference")?;
        w.start_element("cac:InvoiceDocumentReference")?;
        w.text_element("cbc:ID", reference)?;
        w.end_element("cac:InvoiceDocumentReference")?;
        w.end_element("cac:BillingReference")?;
    }

    write_attachments(&mut w, &credit.attachments)?;
    write_party(&mut w, "cac:AccountingSupplierParty", &credit.supplier, PartyRole::Supplier)?;
    write_party(&mut w, "cac:AccountingCustomerParty", &credit.customer, PartyRole::Customer)?;
    write_payment_means(
        &mut w,
        credit.payment_means_code.as_deref(),
        credit.payment_id.as_deref(),
        credit.supplier.iban.as_deref(),
    )?;
    write_payment_terms(&mut w, credit.payment_terms.as_deref())?;
    write_tax_total(&mut w, &totals, &subtotals)?;
    write_monetary_total(&mut w, &totals)?;
    for (index, item) in credit.details.iter().enumerate() {
        write_line(&mut w, index, item, LineKind::CreditNote)?;
    }

    w.end_element("CreditNote")?;
    w.into_string()
}

/// Generate a UBL ApplicationResponse acknowledging a received document.
pub fn application_response_xml(
    response: &ApplicationResponse,
) -> Result<String, FactuurError> {
    let mut w = XmlWriter::new()?;
    w.start_element_with_attrs(
        "ApplicationResponse",
        &[
            ("xmlns", ns::APPLICATION_RESPONSE),
            ("xmlns:cac", ns::CAC),
            ("xmlns:cbc", ns::CBC),
        ],
    )?;

    w.text_element("cbc:CustomizationID", RESPONSE_CUSTOMIZATION_ID)?;
    w.text_element("cbc:ProfileID", RESPONSE_PROFILE_ID)?;
    w.opt_element("cbc:ID", response.id.as_deref())?;
    if let Some(date) = &response.date {
        w.text_element("cbc:IssueDate", &date.to_string())?;
    }
    w.opt_element("cbc:Note", response.note.as_deref())?;

    write_response_party(&mut w, "cac:SenderParty", &response.sender, PartyRole::Supplier)?;
    write_response_party(&mut w, "cac:ReceiverParty", &response.receiver, PartyRole::Customer)?;

    w.start_element("cac:DocumentResponse")?;
    w.start_element("cac:Response")?;
    w.opt_element("cbc:ResponseCode", response.response_code.as_deref())?;
    if let Some(reason) = &response.status_reason {
        w.start_element("cac:Status")?;
        w.text_element("cbc:StatusReason", reason)?;
        w.end_element("cac:Status")?;
    }
    w.end_element("cac:Response")?;
    if let Some(reference) = &response.document_reference {
        w.start_element("cac:DocumentReference")?;
        w.text_element("cbc:ID", reference)?;
        w.end_element("cac:DocumentReference")?;
    }
    w.end_element("cac:DocumentResponse")?;

    w.end_element("ApplicationResponse")?;
    w.into_string()
}

#[derive(Clone, Copy, PartialEq)]
enum PartyRole {
    Supplier,
    Customer,
}

enum LineKind {
    Invoice,
    CreditNote,
}

/// Endpoint identifier for a party. The customer side falls back to the
/// numeric portion of the VAT identifier; this fallback never touches
/// the CompanyID element, which always carries the VAT verbatim.
fn endpoint_for(party: &Party, role: PartyRole) -> Option<String> {
    match role {
        PartyRole::Supplier => party.endpoint_id.clone(),
        PartyRole::Customer => schemes::endpoint_or_vat_digits(party),
    }
}

fn write_party(
    w: &mut XmlWriter,
    wrapper: &str,
    party: &Party,
    role: PartyRole,
) -> Result<(), FactuurError> {
    w.start_element(wrapper)?;
    w.start_element("cac:Party")?;

    if let Some(endpoint) = endpoint_for(party, role) {
        w.text_element_with_attrs(
            "cbc:EndpointID",
            &endpoint,
            &[("schemeID", schemes::party_scheme(party))],
        )?;
    }

    let street_line = combined_street(party);
    if street_line.is_some()
        || party.city.is_some()
        || party.zipcode.is_some()
        || party.country.is_some()
    {
        w.start_element("cac:PostalAddress")?;
        w.opt_element("cbc:StreetName", street_line.as_deref())?;
        w.opt_element("cbc:CityName", party.city.as_deref())?;
        w.opt_element("cbc:PostalZone", party.zipcode.as_deref())?;
        if let Some(country) = &party.country {
            w.start_element("cac:Country")?;
            w.text_element("cbc:IdentificationCode", country)?;
            w.end_element("cac:Country")?;
        }
        w.end_element("cac:PostalAddress")?;
    }

    // BT-31/BT-48: the VAT identifier, verbatim.
    if let Some(vat) = &party.vat {
        w.start_element("cac:PartyTaxScheme")?;
        w.text_element("cbc:CompanyID", vat)?;
        w.start_element("cac:TaxScheme")?;
        w.text_element("cbc:ID", "VAT")?;
        w.end_element("cac:TaxScheme")?;
        w.end_element("cac:PartyTaxScheme")?;
    }

    if let Some(name) = &party.name {
        w.start_element("cac:PartyLegalEntity")?;
        w.text_element("cbc:RegistrationName", name)?;
        w.end_element("cac:PartyLegalEntity")?;
    }

    if let Some(email) = &party.email {
        w.start_element("cac:Contact")?;
        w.text_element("cbc:ElectronicMail", email)?;
        w.end_element("cac:Contact")?;
    }

    w.end_element("cac:Party")?;
    w.end_element(wrapper)?;
    Ok(())
}

/// ApplicationResponse sender/receiver are party types directly, with
/// no nested Party element and no postal details.
fn write_response_party(
    w: &mut XmlWriter,
    wrapper: &str,
    party: &Party,
    role: PartyRole,
) -> Result<(), FactuurError> {
    w.start_element(wrapper)?;
    if let Some(endpoint) = endpoint_for(party, role) {
        w.text_element_with_attrs(
            "cbc:EndpointID",
            &endpoint,
            &[("schemeID", schemes::party_scheme(party))],
        )?;
    }
    if let Some(name) = &party.name {
        w.start_element("cac:PartyLegalEntity")?;
        w.text_element("cbc:RegistrationName", name)?;
        w.end_element("cac:PartyLegalEntity")?;
    }
    w.end_element(wrapper)?;
    Ok(())
}

fn combined_street(party: &Party) -> Option<String> {
    match (&party.street, &party.housenumber) {
        (Some(street), Some(number)) => Some(format!("{street} {number}")),
        (Some(street), None) => Some(street.clone()),
        (None, Some(number)) => Some(number.clone()),
        (None, None) => None,
    }
}

fn write_payment_means(
    w: &mut XmlWriter,
    means_code: Option<&str>,
    payment_id: Option<&str>,
    iban: Option<&str>,
) -> Result<(), FactuurError> {
    if means_code.is_none() && payment_id.is_none() && iban.is_none() {
        return Ok(());
    }
    w.start_element("cac:PaymentMeans")?;
    // BT-81: UNTDID 4461, 30 is credit transfer.
    w.text_element("cbc:PaymentMeansCode", means_code.unwrap_or("30"))?;
    w.opt_element("cbc:PaymentID", payment_id)?;
    if let Some(iban) = iban {
        w.start_element("cac:PayeeFinancialAccount")?;
        w.text_element("cbc:ID", iban)?;
        w.end_element("cac:PayeeFinancialAccount")?;
    }
    w.end_element("cac:PaymentMeans")?;
    Ok(())
}

fn write_payment_terms(w: &mut XmlWriter, terms: Option<&str>) -> Result<(), FactuurError> {
    if let Some(terms) = terms {
        w.start_element("cac:PaymentTerms")?;
        w.text_element("cbc:Note", terms)?;
        w.end_element("cac:PaymentTerms")?;
    }
    Ok(())
}

fn write_attachments(w: &mut XmlWriter, attachments: &[Attachment]) -> Result<(), FactuurError> {
    for attachment in attachments {
        w.start_element("cac:AdditionalDocumentReference")?;
        w.text_element("cbc:ID", &attachment.filename)?;
        w.start_element("cac:Attachment")?;
        w.text_element_with_attrs(
            "cbc:EmbeddedDocumentBinaryObject",
            &attachment.data,
            &[
                ("mimeCode", attachment.mime_type.as_str()),
                ("filename", attachment.filename.as_str()),
            ],
        )?;
        w.end_element("cac:Attachment")?;
        w.end_element("cac:AdditionalDocumentReference")?;
    }
    Ok(())
}

fn write_tax_total(
    w: &mut XmlWriter,
    totals: &DocumentTotals,
    subtotals: &[TaxSubtotal],
) -> Result<(), FactuurError> {
    w.start_element("cac:TaxTotal")?;
    w.amount_element("cbc:TaxAmount", totals.vat)?;
    for subtotal in subtotals {
        w.start_element("cac:TaxSubtotal")?;
        w.amount_element("cbc:TaxableAmount", subtotal.taxable_amount)?;
        w.amount_element("cbc:TaxAmount", subtotal.tax_amount)?;
        w.start_element("cac:TaxCategory")?;
        w.text_element("cbc:ID", subtotal.category.code())?;
        w.text_element("cbc:Percent", &format_decimal(subtotal.rate))?;
        w.opt_element(
            "cbc:TaxExemptionReasonCode",
            subtotal.exemption_reason_code.as_deref(),
        )?;
        w.opt_element("cbc:TaxExemptionReason", subtotal.exemption_reason.as_deref())?;
        w.start_element("cac:TaxScheme")?;
        w.text_element("cbc:ID", "VAT")?;
        w.end_element("cac:TaxScheme")?;
        w.end_element("cac:TaxCategory")?;
        w.end_element("cac:TaxSubtotal")?;
    }
    w.end_element("cac:TaxTotal")?;
    Ok(())
}

fn write_monetary_total(w: &mut XmlWriter, totals: &DocumentTotals) -> Result<(), FactuurError> {
    w.start_element("cac:LegalMonetaryTotal")?;
    w.amount_element("cbc:LineExtensionAmount", totals.subtotal)?;
    w.amount_element("cbc:TaxExclusiveAmount", totals.subtotal)?;
    w.amount_element("cbc:TaxInclusiveAmount", totals.grand_total)?;
    w.amount_element("cbc:PayableAmount", totals.grand_total)?;
    w.end_element("cac:LegalMonetaryTotal")?;
    Ok(())
}

fn write_line(
    w: &mut XmlWriter,
    index: usize,
    item: &LineItem,
    kind: LineKind,
) -> Result<(), FactuurError> {
    let (root, quantity_element) = match kind {
        LineKind::Invoice => ("cac:InvoiceLine", "cbc:InvoicedQuantity"),
        LineKind::CreditNote => ("cac:CreditNoteLine", "cbc:CreditedQuantity"),
    };
    let net = totals::line_net(item);

    w.start_element(root)?;
    w.text_element("cbc:ID", &(index + 1).to_string())?;
    w.quantity_element(quantity_element, item.quantity)?;
    w.amount_element("cbc:LineExtensionAmount", net)?;

    if item.discount > Decimal::ZERO {
        let base = totals::round2(item.quantity * item.price);
        let allowance = totals::line_allowance(item);
        w.start_element("cac:AllowanceCharge")?;
        w.text_element("cbc:ChargeIndicator", "false")?;
        // UNTDID 5189 code 95: discount.
        w.text_element("cbc:AllowanceChargeReasonCode", "95")?;
        w.text_element("cbc:MultiplierFactorNumeric", &format_decimal(item.discount))?;
        w.amount_element("cbc:Amount", allowance)?;
        w.amount_element("cbc:BaseAmount", base)?;
        w.end_element("cac:AllowanceCharge")?;
    }

    w.start_element("cac:Item")?;
    w.text_element("cbc:Name", &item.name)?;
    w.start_element("cac:ClassifiedTaxCategory")?;
    w.text_element("cbc:ID", item.effective_category().code())?;
    w.text_element("cbc:Percent", &format_decimal(item.vat))?;
    w.start_element("cac:TaxScheme")?;
    w.text_element("cbc:ID", "VAT")?;
    w.end_element("cac:TaxScheme")?;
    w.end_element("cac:ClassifiedTaxCategory")?;
    w.end_element("cac:Item")?;

    w.start_element("cac:Price")?;
    w.amount_element("cbc:PriceAmount", item.price)?;
    w.end_element("cac:Price")?;

    w.end_element(root)?;
    Ok(())
}
