//! Redaction of plain-text documents.

use crate::redact::Counters;
use crate::rules::RuleSet;
use crate::util::decode_text;

/// Substitute rules over a whole text document.
///
/// Input is read as UTF-8, falling back to Windows-1252; output is always UTF-8.
pub fn redact_text(bytes: &[u8], rules: &RuleSet) -> (Vec<u8>, Counters) {
    let source = decode_text(bytes, None);
    let substitution = rules.apply(&source);
    let counters = Counters {
        text_replacements: substitution.count,
        ..Counters::default()
    };
    (substitution.text.into_bytes(), counters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ReplacementRule;

    #[test]
    fn test_windows_1252_input_becomes_utf8() {
        let rules = RuleSet::new(&[ReplacementRule::new("secret", "[REDACTED]")]).unwrap();
        let (bytes, counters) = redact_text(b"caf\xe9 SECRET\n\nsecret", &rules);
        assert_eq!(String::from_utf8(bytes).unwrap(), "café [REDACTED]\n\n[REDACTED]");
        assert_eq!(counters.text_replacements, 2);
    }

    #[test]
    fn test_no_rules_is_identity() {
        let (bytes, counters) = redact_text("plain text".as_bytes(), &RuleSet::default());
        assert_eq!(bytes, b"plain text");
        assert!(counters.is_empty());
    }
}
