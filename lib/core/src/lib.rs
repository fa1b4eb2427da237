//! # bizmatch Core
//!
//! Core library for matching spoken business names against a catalog.
//!
//! This crate provides the fundamental data structures and algorithms:
//!
//! - [`BusinessRecord`] - A catalog entry with localized name variants
//! - [`CatalogIndex`] - In-memory fuzzy index (n-gram, phrase and edit-distance clauses)
//! - [`FieldIndex`] - BM25 field index with positional postings
//! - [`KeywordIndex`] - Whole-name keyword field with edit-distance lookup
//! - [`BusinessMatcher`] - Multi-term search merged into a deduplicated [`MatchSet`]
//!
//! ## Example
//!
//! ```rust
//! use bizmatch_core::{BusinessRecord, CatalogIndex};
//!
//! let index = CatalogIndex::default();
//! index.index(BusinessRecord::new(1u64, "Starbucks")).unwrap();
//! index.index(BusinessRecord::new(2u64, "Costa Coffee")).unwrap();
//!
//! let hits = index.search("Starbaks");
//! assert_eq!(hits[0].name, "Starbucks");
//! ```

pub mod analysis;
pub mod bm25;
pub mod error;
pub mod fuzzy;
pub mod index;
pub mod matcher;
pub mod normalize;
pub mod record;

pub use bm25::FieldIndex;
pub use error::{Error, Result};
pub use fuzzy::KeywordIndex;
pub use index::{CatalogConfig, CatalogIndex};
pub use matcher::{BusinessMatcher, CatalogSearch};
pub use record::{BusinessId, BusinessRecord, MatchCandidate, MatchSet};
