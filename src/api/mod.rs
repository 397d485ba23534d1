//! Document registration API: payload types, submission and the
//! rate-limited client that ties them together.

mod client;
mod document;
mod submitter;

pub use client::CrptApi;
pub use document::{Description, Document, Product};
pub use submitter::{DocumentSubmitter, HttpDocumentSubmitter, SIGNATURE_HEADER};
