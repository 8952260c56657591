//! Text processing for lead qualification conversations
//!
//! This crate provides:
//! - **Extraction**: Narrow rule-based extractors that pull customer details
//!   (contact, company, budget, timeline, challenges) out of a user message
//! - **Signals**: Utterance classifiers used by the readiness gate
//!   (substantive turn, sign-off, specific challenge)
//!
//! # Example
//!
//! ```ignore
//! use lead_agent_text_processing::CustomerInfoExtractor;
//!
//! let extractor = CustomerInfoExtractor::new();
//! let patch = extractor.extract("I'm Dana Lee, reach me at dana@northwind.io");
//! assert_eq!(patch.email.as_deref(), Some("dana@northwind.io"));
//! ```

pub mod extraction;
pub mod signals;

pub use extraction::CustomerInfoExtractor;
pub use signals::{is_generic_challenge, is_signoff, is_specific_challenge, is_substantive, word_count};
