//! Canonical tokenizer shared process-wide by the chunker and by
//! `token_count` bookkeeping (§4.2 step 4, §5 singleton policy).

use std::sync::LazyLock;
use tiktoken_rs::CoreBPE;

static ENCODER: LazyLock<CoreBPE> =
    LazyLock::new(|| tiktoken_rs::cl100k_base().expect("cl100k_base vocabulary is built in"));

/// Counts tokens under the system-wide canonical tokenizer.
#[must_use]
pub fn count(text: &str) -> u32 {
    u32::try_from(ENCODER.encode_ordinary(text).len()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_zero_tokens() {
        assert_eq!(count(""), 0);
    }

    #[test]
    fn longer_text_has_more_tokens() {
        assert!(count("hello world, this is a longer sentence") > count("hello"));
    }
}
