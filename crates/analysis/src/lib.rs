//! Text analysis for the vintry catalog-search engine
//!
//! This crate provides the shared, pure text primitives:
//! - `tokenizer`: UAX#29 tokenization with stopword removal and stemming
//! - `stemmer`: Porter stemming algorithm
//! - `shingle`: trigram shingles and Jaccard similarity
//!
//! Everything here is deterministic and free of I/O; the indexing and
//! suggestion layers build on these primitives.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod shingle;
pub mod stemmer;
pub mod tokenizer;

pub use shingle::{shingles, similarity};
pub use stemmer::stem;
pub use tokenizer::{tokenize, tokenize_tokens, tokenize_unique, Token};
