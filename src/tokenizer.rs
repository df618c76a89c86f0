//! Reference tokenizer.
//!
//! The real XML parser/tokenizer this system runs against production
//! corpora is out of scope for this crate: it is an external collaborator
//! whose interface the ingestion façade consumes. This module ships a
//! minimal, pluggable stand-in, grounded directly on `index/text_types.rs`'s
//! `Tokenizer` trait and `WhitespaceTokenizer`, so the CLI binary can
//! exercise the pipeline end to end without pulling in a full
//! natural-language toolkit.

/// Pluggable tokenizer trait, generalized from
/// `index/text_types.rs::Tokenizer`; position tracking is dropped since
/// nothing downstream of the accumulator needs it.
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Case-folds, splits on anything that isn't alphanumeric or `_`, and
/// filters by length. Tokens are assumed pre-normalized by whatever real
/// tokenizer sits upstream in production; this reference implementation
/// performs the same case-folding a `WhitespaceTokenizer` conventionally
/// does so the reference pipeline's output is deterministic and testable.
#[derive(Debug, Clone)]
pub struct WhitespaceTokenizer {
    pub case_sensitive: bool,
    pub min_len: usize,
    pub max_len: usize,
}

impl Default for WhitespaceTokenizer {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            min_len: 1,
            max_len: 30,
        }
    }
}

impl WhitespaceTokenizer {
    /// Build a tokenizer whose `max_len` agrees with a `BuildConfig`'s
    /// `max_word_cap`, so nothing tokenized here can trip
    /// `model::check_token_len`'s ingestion-time rejection. Two independent
    /// defaults (one here, one on `BuildConfig`) would otherwise be free to
    /// drift apart; this keeps the reference tokenizer honest against
    /// whatever cap the build is actually configured with.
    pub fn with_max_word_cap(max_word_cap: usize) -> Self {
        Self {
            max_len: max_word_cap,
            ..Self::default()
        }
    }
}

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = if self.case_sensitive {
            text.to_string()
        } else {
            text.to_lowercase()
        };

        normalized
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|s| {
                let len = s.chars().count();
                len >= self.min_len && len <= self.max_len
            })
            .map(|s| s.to_string())
            .collect()
    }
}
