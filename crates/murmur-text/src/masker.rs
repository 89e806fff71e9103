//! Reversible masking of substrings.
//!
//! Sentence splitting must not cut inside URLs, e-mail addresses, or
//! acronyms, and token splitting must not cut inside smileys or the
//! reserved placeholders. A [`Masker`] swaps every match of its pattern for
//! a unique opaque key before a pass, and swaps them back afterward.

use regex::Regex;

/// Replaces pattern matches with unique keys, and restores them later.
#[derive(Debug)]
pub struct Masker {
    pattern: &'static Regex,
    name: &'static str,
    substitutions: Vec<(String, String)>,
}

impl Masker {
    pub fn new(pattern: &'static Regex, name: &'static str) -> Self {
        Self {
            pattern,
            name,
            substitutions: Vec::new(),
        }
    }

    /// Replace each match with a `azaza<name><n>azaza` key, remembering the
    /// original text. Keys use only word characters, so later passes treat
    /// them as ordinary words.
    pub fn mask(&mut self, input: &str) -> String {
        let mut result = input.to_string();
        for (index, found) in self.pattern.find_iter(input).enumerate() {
            let key = format!("azaza{}{}azaza", self.name, index + 1);
            result = result.replacen(found.as_str(), &key, 1);
            self.substitutions.push((key, found.as_str().to_string()));
        }
        result
    }

    /// Swap every remembered key back for its original substring.
    pub fn unmask(&self, masked: &str) -> String {
        let mut result = masked.to_string();
        for (key, original) in &self.substitutions {
            result = result.replace(key, original);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;

    static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

    #[test]
    fn test_mask_then_unmask_round_trips() {
        let mut masker = Masker::new(&DIGITS, "num");
        let masked = masker.mask("call 555 or 911 now");
        assert_eq!(masked, "call azazanum1azaza or azazanum2azaza now");
        assert_eq!(masker.unmask(&masked), "call 555 or 911 now");
    }

    #[test]
    fn test_no_matches_is_a_no_op() {
        let mut masker = Masker::new(&DIGITS, "num");
        assert_eq!(masker.mask("no digits here"), "no digits here");
    }
}
