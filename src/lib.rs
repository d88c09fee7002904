//! # factuur
//!
//! UBL 2.1 / Peppol BIS Billing 3.0 document codec: lossless round-trip
//! between the XML wire format and a canonical [`Document`] record for
//! invoices, credit notes, and application responses, with optional
//! SBDH transport envelopes.
//!
//! All monetary values use [`rust_decimal::Decimal`] — never floating
//! point. Totals and per-category tax subtotals are recomputed on
//! generation under the 2-decimal rounding discipline that network
//! compliance checks expect.
//!
//! ## Quick Start
//!
//! ```rust
//! use factuur::{Document, Invoice, LineItem, Party};
//! use rust_decimal_macros::dec;
//!
//! let invoice = Invoice {
//!     number: Some("INV-2025-001".into()),
//!     date: chrono::NaiveDate::from_ymd_opt(2025, 3, 1),
//!     supplier: Party {
//!         name: Some("Acme BV".into()),
//!         country: Some("NL".into()),
//!         vat: Some("NL123456789B01".into()),
//!         ..Party::default()
//!     },
//!     customer: Party {
//!         name: Some("Kunde GmbH".into()),
//!         country: Some("DE".into()),
//!         ..Party::default()
//!     },
//!     details: vec![LineItem {
//!         name: "Consulting".into(),
//!         quantity: dec!(10),
//!         price: dec!(95),
//!         vat: dec!(21),
//!         ..LineItem::default()
//!     }],
//!     ..Invoice::default()
//! };
//!
//! let xml = factuur::generate(&Document::Invoice(invoice)).unwrap();
//! assert!(xml.contains("<cbc:ID>INV-2025-001</cbc:ID>"));
//!
//! let parsed = factuur::parse(&xml).unwrap();
//! assert!(matches!(parsed, Document::Invoice(_)));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ubl` (default) | UBL 2.1 parsing & generation |
//! | `sbdh` (default) | SBDH envelope wrap/unwrap |
//! | `validate` | Async client for a remote validation service |
//! | `all` | Everything |

pub mod core;

#[cfg(feature = "ubl")]
pub mod ubl;

#[cfg(feature = "sbdh")]
pub mod sbdh;

#[cfg(feature = "validate")]
pub mod validator;

// Re-export the model and entry points at crate root for convenience
pub use crate::core::*;

#[cfg(feature = "ubl")]
pub use crate::ubl::{generate, parse};

#[cfg(feature = "sbdh")]
pub use crate::ubl::generate_with_sbdh;
