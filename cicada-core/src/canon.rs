//! Transcript token canonicalization (§4.5): the sole authority both signer
//! and verifier must agree on for signature binding to close.
//!
//! Grounded in the Python original's `regularize_transcript`
//! (`imprint/speech.py`): split on whitespace, lowercase, map English number
//! words to digits, strip non-alphanumeric characters, drop anything that
//! becomes empty, and keep the character offset of each surviving token's
//! first character in the source text.

use crate::frame::Token;

/// Replace a single lowercase word with its digit string if it names a
/// number zero through the common large-magnitude words; anything else is
/// returned unchanged. Mirrors `number_parser`'s per-token behavior: no
/// multi-word compounding (`"twenty three"` canonicalizes to `"20"` then
/// `"3"`, two tokens, not `"23"`).
fn number_word_to_digits(word: &str) -> Option<&'static str> {
    Some(match word {
        "zero" => "0",
        "one" => "1",
        "two" => "2",
        "three" => "3",
        "four" => "4",
        "five" => "5",
        "six" => "6",
        "seven" => "7",
        "eight" => "8",
        "nine" => "9",
        "ten" => "10",
        "eleven" => "11",
        "twelve" => "12",
        "thirteen" => "13",
        "fourteen" => "14",
        "fifteen" => "15",
        "sixteen" => "16",
        "seventeen" => "17",
        "eighteen" => "18",
        "nineteen" => "19",
        "twenty" => "20",
        "thirty" => "30",
        "forty" => "40",
        "fifty" => "50",
        "sixty" => "60",
        "seventy" => "70",
        "eighty" => "80",
        "ninety" => "90",
        "hundred" => "100",
        "thousand" => "1000",
        "million" => "1000000",
        "billion" => "1000000000",
        "trillion" => "1000000000000",
        _ => return None,
    })
}

/// Canonicalize a transcript into the bound-token sequence. Dashes (hyphen,
/// en dash, em dash) are treated as whitespace before splitting, matching the
/// Python original's dash handling ahead of its whitespace split.
pub fn canonicalize(text: &str) -> Vec<Token> {
    let normalized: String = text
        .chars()
        .map(|c| if c == '-' || c == '\u{2013}' || c == '\u{2014}' { ' ' } else { c })
        .collect();

    let mut tokens = Vec::new();
    for (start, raw) in normalized.split_whitespace_with_indices() {
        let lower = raw.to_lowercase();
        let mapped = number_word_to_digits(&lower).map(str::to_string).unwrap_or(lower);
        let cleaned: String = mapped.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        if !cleaned.is_empty() {
            tokens.push(Token { text: cleaned, char_offset: start });
        }
    }
    tokens
}

/// Split on any run of whitespace, yielding `(char_offset, word)` pairs for
/// each non-whitespace run — the `str` equivalent of `re.finditer(r'\S+', s)`.
trait SplitWhitespaceWithIndices {
    fn split_whitespace_with_indices(&self) -> Vec<(usize, &str)>;
}

impl SplitWhitespaceWithIndices for str {
    fn split_whitespace_with_indices(&self) -> Vec<(usize, &str)> {
        let mut runs = Vec::new();
        let mut chars = self.char_indices().peekable();
        while let Some(&(start, c)) = chars.peek() {
            if c.is_whitespace() {
                chars.next();
                continue;
            }
            let mut end = start;
            while let Some(&(idx, c)) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                end = idx + c.len_utf8();
                chars.next();
            }
            let char_start = self[..start].chars().count();
            runs.push((char_start, &self[start..end]));
        }
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_strips_punctuation() {
        let tokens = canonicalize("Hello, World!");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["hello", "world"]);
    }

    #[test]
    fn maps_number_words_per_token() {
        let tokens = canonicalize("twenty three apples");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["20", "3", "apples"]);
    }

    #[test]
    fn dashes_split_into_separate_tokens() {
        let tokens = canonicalize("well-known fact");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["well", "known", "fact"]);
    }

    #[test]
    fn preserves_char_offset_of_first_character() {
        let tokens = canonicalize("  hello world");
        assert_eq!(tokens[0].char_offset, 2);
        assert_eq!(tokens[1].char_offset, 8);
    }

    #[test]
    fn punctuation_only_token_is_dropped() {
        let tokens = canonicalize("hello --- world");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["hello", "world"]);
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let text = "The Quick-Brown fox jumps 12 times.";
        let once: Vec<String> = canonicalize(text).into_iter().map(|t| t.text).collect();
        let joined = once.join(" ");
        let twice: Vec<String> = canonicalize(&joined).into_iter().map(|t| t.text).collect();
        assert_eq!(once, twice);
    }
}
