//! XML writing support shared by the UBL generators and the SBDH
//! envelope builder.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use rust_decimal::Decimal;
use std::io::Cursor;

use crate::core::FactuurError;

fn write_failed(e: std::io::Error) -> FactuurError {
    FactuurError::InvalidRecord(format!("XML write error: {e}"))
}

/// Indented UTF-8 XML writer with the prolog already in place.
///
/// Elements holding an absent value are omitted entirely — nothing is
/// ever emitted empty, which keeps a generate→parse cycle stable.
pub struct XmlWriter {
    inner: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    pub fn new() -> Result<Self, FactuurError> {
        let mut inner = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        inner
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_failed)?;
        Ok(Self { inner })
    }

    pub fn into_string(self) -> Result<String, FactuurError> {
        String::from_utf8(self.inner.into_inner().into_inner())
            .map_err(|e| FactuurError::InvalidRecord(format!("XML UTF-8 error: {e}")))
    }

    pub fn start_element(&mut self, name: &str) -> Result<&mut Self, FactuurError> {
        self.start_element_with_attrs(name, &[])
    }

    pub fn start_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, FactuurError> {
        let mut start = BytesStart::new(name);
        start.extend_attributes(attrs.iter().copied());
        self.inner
            .write_event(Event::Start(start))
            .map_err(write_failed)?;
        Ok(self)
    }

    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, FactuurError> {
        self.inner
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(write_failed)?;
        Ok(self)
    }

    pub fn text_element(&mut self, name: &str, text: &str) -> Result<&mut Self, FactuurError> {
        self.text_element_with_attrs(name, text, &[])
    }

    pub fn text_element_with_attrs(
        &mut self,
        name: &str,
        text: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, FactuurError> {
        self.start_element_with_attrs(name, attrs)?;
        self.inner
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(write_failed)?;
        self.end_element(name)
    }

    /// Write the element only when a value is present.
    pub fn opt_element(
        &mut self,
        name: &str,
        value: Option<&str>,
    ) -> Result<&mut Self, FactuurError> {
        match value {
            Some(text) => self.text_element(name, text),
            None => Ok(self),
        }
    }

    /// Monetary amount in the document currency.
    pub fn amount_element(
        &mut self,
        name: &str,
        amount: Decimal,
    ) -> Result<&mut Self, FactuurError> {
        self.text_element_with_attrs(
            name,
            &format_decimal(amount),
            &[("currencyID", super::DOCUMENT_CURRENCY)],
        )
    }

    /// Quantity with the UN/ECE generic unit code.
    pub fn quantity_element(&mut self, name: &str, qty: Decimal) -> Result<&mut Self, FactuurError> {
        self.text_element_with_attrs(name, &format_decimal(qty), &[("unitCode", "C62")])
    }

    /// Splice pre-serialized XML into the output without re-escaping.
    pub fn raw_xml(&mut self, xml: &str) -> Result<&mut Self, FactuurError> {
        self.inner
            .write_event(Event::Text(BytesText::from_escaped(xml)))
            .map_err(write_failed)?;
        Ok(self)
    }
}

/// Format a Decimal for XML output: at least 2 decimal places, trailing
/// zeros beyond that stripped.
pub fn format_decimal(d: Decimal) -> String {
    let n = d.normalize();
    if n.scale() < 2 {
        format!("{n:.2}")
    } else {
        n.to_string()
    }
}
