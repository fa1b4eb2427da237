//! # bizmatch Extract
//!
//! Structured transaction fields from transcribed speech.
//!
//! The language model is consumed through the [`LanguageModel`] capability;
//! [`OpenAiClient`] is the production implementation. [`Extractor`] runs the
//! three independent groups:
//!
//! - main fields (description, amount, currency)
//! - datetime, resolved against a reference time
//! - business mention, resolved to catalog candidates through
//!   [`bizmatch_core::BusinessMatcher`]

pub mod business;
pub mod datetime;
pub mod error;
pub mod extractor;
pub mod llm;
pub mod openai;
pub mod prompts;
pub mod schema;

pub use business::{resolve_business, search_terms, BusinessExtraction};
pub use datetime::{format_timestamp, parse_reference, resolve_datetime};
pub use error::{ExtractError, Result};
pub use extractor::{Extractor, TransactionDraft, DEFAULT_CURRENCY};
pub use llm::LanguageModel;
pub use openai::{OpenAiClient, OpenAiConfig, DEFAULT_JUDGE_MODEL, DEFAULT_TEXT_MODEL};
pub use prompts::PromptSet;
pub use schema::{BusinessFields, DatetimeFields, MainFields};
