//! One line of input, segmented into sentences and tokens.
//!
//! An [`Entry`] substitutes the bot's and the utterer's names with the
//! reserved placeholders, splits the line into sentences without cutting
//! inside URLs, e-mails, or acronyms, and tokenizes each sentence into
//! words, punctuation runs, smileys, and placeholders.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::TextResult;
use crate::masker::Masker;

/// Reserved token standing in for the bot's name.
pub const BOT_PLACEHOLDER: &str = "@bot@";
/// Reserved token standing in for the current utterer's name.
pub const USER_PLACEHOLDER: &str = "@user@";

static SENTENCE_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[?!.]+\s*").unwrap());
static MAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+(?:[a-z]{2}|com|org|net|gov|mil|biz|info|mobi|name|aero|jobs|museum)",
    )
    .unwrap()
});
static ACRONYMS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:[A-Z]\.)+").unwrap());
static URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:http|ftp|file)://(?:[a-z0-9]+\.){1,3}[a-z0-9]+").unwrap());
static SMILEYS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[<=>]?[X:B8][-o]?[)(ODPp\]\[]").unwrap());
static WORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").unwrap());
static WORD_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.,;!?+=\-()\[\]"':/]+"#).unwrap());
static BOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"@bot@").unwrap());
static USER: Lazy<Regex> = Lazy::new(|| Regex::new(r"@user@").unwrap());

/// A line of input from one utterer.
#[derive(Debug)]
pub struct Entry {
    line: String,
    sentences: Option<Vec<String>>,
}

impl Entry {
    /// Build an entry from a raw line, substituting the bot name and the
    /// username (whole words, any case) with the reserved placeholders so
    /// the rest of the pipeline treats them as ordinary tokens.
    pub fn new(line: &str, username: &str, botname: &str) -> TextResult<Self> {
        let bot_pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(botname)))?;
        let user_pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(username)))?;
        let line = bot_pattern.replace_all(line, BOT_PLACEHOLDER);
        let line = user_pattern.replace_all(&line, USER_PLACEHOLDER);
        Ok(Self {
            line: line.into_owned(),
            sentences: None,
        })
    }

    /// The entry's sentences, split on `?`/`!`/`.` runs. Acronyms, e-mail
    /// addresses, and URLs are masked during the split so their dots never
    /// end a sentence.
    pub fn sentences(&mut self) -> &[String] {
        if self.sentences.is_none() {
            let mut acronyms = Masker::new(&ACRONYMS, "acronym");
            let mut mails = Masker::new(&MAIL, "mail");
            let mut urls = Masker::new(&URL, "url");

            let masked = acronyms.mask(&self.line);
            let masked = mails.mask(&masked);
            let masked = urls.mask(&masked);

            let mut sentences = Vec::new();
            let mut start = 0;
            for separator in SENTENCE_SEPARATORS.find_iter(&masked) {
                sentences.push(clean_sentence(&masked[start..separator.end()]));
                start = separator.end();
            }
            if start < masked.len() {
                sentences.push(clean_sentence(&masked[start..]));
            }

            let sentences = sentences
                .into_iter()
                .map(|sentence| urls.unmask(&mails.unmask(&acronyms.unmask(&sentence))))
                .collect();
            self.sentences = Some(sentences);
        }
        self.sentences.as_deref().unwrap_or_default()
    }

    /// Tokenize one sentence into words, punctuation runs, smileys, and the
    /// reserved placeholders, in their original order.
    pub fn tokens(sentence: &str) -> Vec<String> {
        let mut smileys = Masker::new(&SMILEYS, "smiley");
        let mut bots = Masker::new(&BOT, "bot");
        let mut users = Masker::new(&USER, "user");

        let masked = smileys.mask(sentence);
        let masked = bots.mask(&masked);
        let masked = users.mask(&masked);

        // Word spans and separator spans, merged back into reading order.
        let mut spans: Vec<(usize, usize)> = WORDS
            .find_iter(&masked)
            .chain(WORD_SEPARATORS.find_iter(&masked))
            .map(|found| (found.start(), found.end()))
            .collect();
        spans.sort_unstable();

        let tokens: Vec<String> = spans
            .iter()
            .map(|&(start, end)| masked[start..end].trim().to_string())
            .filter(|token| !token.is_empty())
            .collect();

        split_smileys(&tokens)
            .iter()
            .map(|token| users.unmask(&bots.unmask(&smileys.unmask(token))))
            .collect()
    }

    pub fn line(&self) -> &str {
        &self.line
    }
}

fn clean_sentence(raw: &str) -> String {
    raw.replace('\n', " ").trim().to_string()
}

/// Separate smileys glued into punctuation tokens, e.g. `:).` into `:)`
/// and `.`.
fn split_smileys(tokens: &[String]) -> Vec<String> {
    let mut result = Vec::with_capacity(tokens.len());
    for token in tokens {
        let mut cursor = 0;
        for found in SMILEYS.find_iter(token) {
            if found.start() > cursor {
                result.push(token[cursor..found.start()].to_string());
            }
            result.push(found.as_str().to_string());
            cursor = found.end();
        }
        if cursor < token.len() {
            result.push(token[cursor..].to_string());
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(line: &str) -> Entry {
        Entry::new(line, "Alice", "Murmur").unwrap()
    }

    #[test]
    fn test_sentences_split_on_separators() {
        let mut e = entry("Un. Deux? Trois!! Quatre.");
        assert_eq!(e.sentences(), ["Un.", "Deux?", "Trois!!", "Quatre."]);
    }

    #[test]
    fn test_trailing_text_without_separator_is_kept() {
        let mut e = entry("One. and two");
        assert_eq!(e.sentences(), ["One.", "and two"]);
    }

    #[test]
    fn test_urls_do_not_end_sentences() {
        let mut e = entry("Look at http://example.org please. Thanks.");
        assert_eq!(
            e.sentences(),
            ["Look at http://example.org please.", "Thanks."]
        );
    }

    #[test]
    fn test_mail_addresses_do_not_end_sentences() {
        let mut e = entry("Write to someone@example.com now. Bye.");
        assert_eq!(e.sentences(), ["Write to someone@example.com now.", "Bye."]);
    }

    #[test]
    fn test_acronyms_do_not_end_sentences() {
        let mut e = entry("He lives in the U.S.A. in a city.");
        assert_eq!(e.sentences(), ["He lives in the U.S.A. in a city."]);
    }

    #[test]
    fn test_bot_and_user_names_become_placeholders() {
        let e = entry("Murmur, meet Alice.");
        assert_eq!(e.line(), "@bot@, meet @user@.");
    }

    #[test]
    fn test_name_substitution_respects_word_boundaries() {
        let e = entry("The murmuring continued.");
        assert_eq!(e.line(), "The murmuring continued.");
    }

    #[test]
    fn test_tokens_of_a_plain_sentence() {
        assert_eq!(Entry::tokens("How are you?"), ["How", "are", "you", "?"]);
    }

    #[test]
    fn test_tokens_keep_punctuation_runs_whole() {
        assert_eq!(Entry::tokens("Wait... what?!"), ["Wait", "...", "what", "?!"]);
    }

    #[test]
    fn test_tokens_keep_smileys_whole() {
        assert_eq!(
            Entry::tokens("This should work too :)."),
            ["This", "should", "work", "too", ":)", "."]
        );
    }

    #[test]
    fn test_tokens_keep_placeholders_whole() {
        assert_eq!(
            Entry::tokens("@bot@ says hi to @user@ !"),
            ["@bot@", "says", "hi", "to", "@user@", "!"]
        );
    }

    #[test]
    fn test_split_smileys_on_glued_punctuation() {
        let tokens = vec![":).".to_string()];
        assert_eq!(split_smileys(&tokens), [":)", "."]);
    }
}
