//! Electronic Address Scheme (EAS) inference for Peppol EndpointID.

use super::types::Party;

/// Scheme used when the country has no dedicated entry: GS1 GLN.
pub const FALLBACK_SCHEME: &str = "0088";

/// Return the default EAS scheme code for a given ISO 3166-1 alpha-2
/// country code.
///
/// The table carries the customary national registry for each of the 26
/// countries commonly reachable over the network; everything else falls
/// back to [`FALLBACK_SCHEME`].
pub fn scheme_for_country(country_code: &str) -> &'static str {
    match country_code.to_ascii_uppercase().as_str() {
        "AT" => "9914",
        "BE" => "0208",
        "BG" => "9926",
        "CH" => "9927",
        "CY" => "9928",
        "CZ" => "9929",
        "DE" => "0204",
        "DK" => "0184",
        "EE" => "9931",
        "ES" => "9920",
        "FI" => "0037",
        "FR" => "0009",
        "GB" => "9932",
        "GR" => "9933",
        "HR" => "9934",
        "HU" => "9910",
        "IE" => "9935",
        "IT" => "0211",
        "LT" => "9937",
        "LU" => "9938",
        "LV" => "9939",
        "MT" => "9941",
        "NL" => "0106",
        "NO" => "0192",
        "PL" => "9945",
        "SE" => "0007",
        _ => FALLBACK_SCHEME,
    }
}

/// Resolve the scheme for a party: an explicit scheme always wins over
/// country inference.
pub fn party_scheme(party: &Party) -> &str {
    match &party.scheme {
        Some(scheme) => scheme,
        None => scheme_for_country(party.country.as_deref().unwrap_or("")),
    }
}

/// Numeric portion of a VAT identifier: a leading two-letter country
/// prefix is stripped, then everything that is not an ASCII digit.
/// Returns `None` when no digits remain.
pub fn vat_numeric_part(vat: &str) -> Option<String> {
    let rest = match vat.as_bytes() {
        [a, b, ..] if a.is_ascii_alphabetic() && b.is_ascii_alphabetic() => &vat[2..],
        _ => vat,
    };
    let digits: String = rest.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() { None } else { Some(digits) }
}

/// Endpoint identifier for a party that may lack an explicit one: falls
/// back to the numeric portion of its VAT identifier. Used for customer
/// endpoints and SBDH receivers only — the VAT element itself always
/// emits the identifier verbatim.
pub fn endpoint_or_vat_digits(party: &Party) -> Option<String> {
    party
        .endpoint_id
        .clone()
        .or_else(|| party.vat.as_deref().and_then(vat_numeric_part))
}
