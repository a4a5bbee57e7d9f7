//! Algebraic properties of the analysis primitives
//!
//! - tokenization is deterministic and pure
//! - trigram similarity is symmetric and bounded

use proptest::prelude::*;
use vintry_analysis::{shingle, tokenizer};

proptest! {
    /// Tokenizing the same text twice yields identical sequences.
    #[test]
    fn tokenize_is_deterministic(text in ".{0,200}") {
        let a = tokenizer::tokenize(&text);
        let b = tokenizer::tokenize(&text);
        prop_assert_eq!(a, b);
    }

    /// Token byte ranges always slice the input cleanly.
    #[test]
    fn token_offsets_are_valid(text in "[a-zA-Z0-9 ,.'-]{0,200}") {
        for token in tokenizer::tokenize_tokens(&text) {
            prop_assert!(token.start < token.end);
            prop_assert!(token.end <= text.len());
            prop_assert!(text.is_char_boundary(token.start));
            prop_assert!(text.is_char_boundary(token.end));
        }
    }

    /// similarity(a, b) == similarity(b, a) for all term pairs.
    #[test]
    fn similarity_is_symmetric(a in "[a-z]{0,16}", b in "[a-z]{0,16}") {
        let ab = shingle::similarity(&a, &b);
        let ba = shingle::similarity(&b, &a);
        prop_assert_eq!(ab.to_bits(), ba.to_bits());
    }

    /// Similarity is bounded in [0, 1] and 1.0 exactly on self-comparison
    /// of a non-empty term.
    #[test]
    fn similarity_is_bounded(a in "[a-z]{1,16}", b in "[a-z]{0,16}") {
        let sim = shingle::similarity(&a, &b);
        prop_assert!((0.0..=1.0).contains(&sim));
        prop_assert_eq!(shingle::similarity(&a, &a), 1.0);
    }
}
