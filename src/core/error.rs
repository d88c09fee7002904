use thiserror::Error;

/// Errors that can occur while parsing or generating documents.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FactuurError {
    /// The input byte stream is not well-formed XML.
    #[error("XML tokenization error: {0}")]
    Tokenization(String),

    /// The input is well-formed XML but contains no recognized document
    /// root (Invoice, CreditNote, ApplicationResponse), not even inside
    /// an SBDH envelope.
    #[error("no recognized document root in input")]
    UnrecognizedDocument,

    /// A document record cannot be turned into XML.
    #[error("invalid document record: {0}")]
    InvalidRecord(String),
}
