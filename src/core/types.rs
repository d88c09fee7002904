use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A parsed or to-be-generated business document.
///
/// Produced whole by one [`parse`](crate::parse) call and consumed whole
/// by one [`generate`](crate::generate) call; the library never mutates
/// a record incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Document {
    #[serde(rename = "invoice")]
    Invoice(Invoice),
    #[serde(rename = "credit")]
    CreditNote(CreditNote),
    #[serde(rename = "application_response")]
    ApplicationResponse(ApplicationResponse),
}

impl Document {
    /// UBL root element local name for this variant.
    pub fn root_name(&self) -> &'static str {
        match self {
            Self::Invoice(_) => "Invoice",
            Self::CreditNote(_) => "CreditNote",
            Self::ApplicationResponse(_) => "ApplicationResponse",
        }
    }
}

/// BG-0: Invoice document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// BT-1: Invoice number.
    pub number: Option<String>,
    /// BT-2: Issue date.
    pub date: Option<NaiveDate>,
    /// BT-9: Payment due date.
    pub expires: Option<NaiveDate>,
    /// BT-13: Purchase order reference. Generated as "NA" when absent.
    pub order_reference: Option<String>,
    /// BT-83: Remittance information.
    pub payment_id: Option<String>,
    /// BT-81: Payment means type code (UNTDID 4461), kept verbatim.
    pub payment_means_code: Option<String>,
    /// BG-4: Seller.
    pub supplier: Party,
    /// BG-7: Buyer.
    pub customer: Party,
    /// BG-25: Invoice lines, in document order.
    pub details: Vec<LineItem>,
    /// BG-24: Embedded attachments, in document order.
    pub attachments: Vec<Attachment>,
    /// BT-22: Free-text note.
    pub note: Option<String>,
    /// BT-20: Payment terms free text.
    pub payment_terms: Option<String>,
    /// Monetary totals as found on the wire. Populated by the parser,
    /// ignored by the generator, which recomputes all amounts.
    pub totals: Option<ParsedTotals>,
}

/// Credit note document. Mirrors [`Invoice`] but carries billing
/// references to the invoices it credits and has no due date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreditNote {
    /// BT-1: Credit note number.
    pub number: Option<String>,
    /// BT-2: Issue date.
    pub date: Option<NaiveDate>,
    /// BG-3: Referenced invoice numbers, in document order.
    pub billing_references: Vec<String>,
    /// BT-13: Purchase order reference.
    pub order_reference: Option<String>,
    /// BT-83: Remittance information.
    pub payment_id: Option<String>,
    /// BT-81: Payment means type code, kept verbatim.
    pub payment_means_code: Option<String>,
    /// BG-4: Seller.
    pub supplier: Party,
    /// BG-7: Buyer.
    pub customer: Party,
    /// BG-25: Credit note lines, in document order.
    pub details: Vec<LineItem>,
    /// BG-24: Embedded attachments, in document order.
    pub attachments: Vec<Attachment>,
    /// BT-22: Free-text note.
    pub note: Option<String>,
    /// BT-20: Payment terms free text.
    pub payment_terms: Option<String>,
    /// Wire totals; parser-only, see [`Invoice::totals`].
    pub totals: Option<ParsedTotals>,
}

/// Application response — a network-level acknowledgment referring back
/// to a previously exchanged document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationResponse {
    pub id: Option<String>,
    pub date: Option<NaiveDate>,
    /// UNCL4343 status code (e.g. "AP" accepted, "RE" rejected).
    pub response_code: Option<String>,
    /// Identifier of the document being acknowledged.
    pub document_reference: Option<String>,
    /// Clarification text for the response status.
    pub status_reason: Option<String>,
    pub note: Option<String>,
    pub sender: Party,
    pub receiver: Party,
}

/// A transaction party (seller, buyer, response sender/receiver).
///
/// Every field is optional; `None` means the element is omitted from
/// generated XML entirely — nothing is ever emitted empty, so a
/// generate→parse cycle is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub name: Option<String>,
    /// ISO 3166-1 alpha-2 country code.
    pub country: Option<String>,
    /// Peppol participant identifier value (without scheme).
    pub endpoint_id: Option<String>,
    /// EAS scheme for the endpoint identifier. When absent it is
    /// inferred from `country`, see [`schemes`](super::schemes).
    pub scheme: Option<String>,
    pub street: Option<String>,
    /// House number, split from the combined street text at parse time.
    /// Only ever populated for the customer.
    pub housenumber: Option<String>,
    pub city: Option<String>,
    pub zipcode: Option<String>,
    /// BT-31/BT-48: VAT identifier, kept verbatim. Never reconstructed
    /// from the postal country: a Swiss customer holding a Belgian VAT
    /// number keeps its "BE…" identifier.
    pub vat: Option<String>,
    pub email: Option<String>,
    /// Bank account for credit transfer. Only ever populated for the
    /// supplier.
    pub iban: Option<String>,
}

/// BG-25: A document line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// BT-153: Item name.
    pub name: String,
    /// BT-129: Invoiced quantity.
    pub quantity: Decimal,
    /// BT-146: Item net unit price.
    pub price: Decimal,
    /// BT-152: VAT rate percentage.
    pub vat: Decimal,
    /// Line discount percentage in [0, 100]; 0 means none.
    pub discount: Decimal,
    /// BT-151: Tax category. `None` means the rate-derived default
    /// (zero-rated for a 0% rate, standard otherwise), which keeps the
    /// defaulting behavior itself round-trip stable.
    pub tax_category: Option<TaxCategory>,
    /// BT-121: VATEX exemption reason code, carried per line.
    pub tax_exemption_reason_code: Option<String>,
    /// BT-120: Exemption reason text, carried per line.
    pub tax_exemption_reason: Option<String>,
}

impl LineItem {
    /// The tax category that applies to this line: the explicit one, or
    /// the default derived from the VAT rate.
    pub fn effective_category(&self) -> TaxCategory {
        self.tax_category
            .unwrap_or_else(|| TaxCategory::default_for_rate(self.vat))
    }
}

/// BG-24: An embedded document attachment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub mime_type: String,
    /// Base64-encoded content, kept opaque.
    pub data: String,
}

/// Monetary totals as read from the wire. The generator never consumes
/// these — it recomputes everything from the line items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedTotals {
    /// BT-110: Total VAT amount.
    pub tax_amount: Option<Decimal>,
    /// BT-106: Sum of line net amounts.
    pub line_extension_amount: Option<Decimal>,
    /// BT-109: Total without VAT.
    pub tax_exclusive_amount: Option<Decimal>,
    /// BT-112: Total with VAT.
    pub tax_inclusive_amount: Option<Decimal>,
    /// BT-115: Amount due for payment.
    pub payable_amount: Option<Decimal>,
    /// BT-107: Document-level allowance total.
    pub allowance_total: Option<Decimal>,
    /// BT-108: Document-level charge total.
    pub charge_total: Option<Decimal>,
    /// BT-113: Prepaid amount.
    pub prepaid_amount: Option<Decimal>,
}

impl ParsedTotals {
    /// True when no amount was found on the wire at all.
    pub fn is_empty(&self) -> bool {
        self.tax_amount.is_none()
            && self.line_extension_amount.is_none()
            && self.tax_exclusive_amount.is_none()
            && self.tax_inclusive_amount.is_none()
            && self.payable_amount.is_none()
            && self.allowance_total.is_none()
            && self.charge_total.is_none()
            && self.prepaid_amount.is_none()
    }
}

/// UNTDID 5305 — Tax category codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxCategory {
    /// S — Standard rate.
    Standard,
    /// Z — Zero rated.
    ZeroRated,
    /// E — Exempt from tax.
    Exempt,
    /// AE — Reverse charge.
    ReverseCharge,
    /// K — Intra-community supply.
    IntraCommunity,
    /// G — Export outside the EU.
    Export,
    /// O — Outside scope of VAT.
    OutsideScope,
}

impl TaxCategory {
    /// UNTDID 5305 code letter.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Standard => "S",
            Self::ZeroRated => "Z",
            Self::Exempt => "E",
            Self::ReverseCharge => "AE",
            Self::IntraCommunity => "K",
            Self::Export => "G",
            Self::OutsideScope => "O",
        }
    }

    /// Parse from a UNTDID 5305 code string.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "S" => Some(Self::Standard),
            "Z" => Some(Self::ZeroRated),
            "E" => Some(Self::Exempt),
            "AE" => Some(Self::ReverseCharge),
            "K" => Some(Self::IntraCommunity),
            "G" => Some(Self::Export),
            "O" => Some(Self::OutsideScope),
            _ => None,
        }
    }

    /// Default category for a VAT rate: zero-rated at 0%, standard
    /// otherwise.
    pub fn default_for_rate(rate: Decimal) -> Self {
        if rate.is_zero() {
            Self::ZeroRated
        } else {
            Self::Standard
        }
    }
}
