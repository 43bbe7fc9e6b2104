//! Per-character tokenizer.

use std::str::Chars;

/// Iterator yielding each character of a string as its own token.
///
/// This is what splitting on the empty separator produces.
#[derive(Clone, Debug)]
pub struct CharTokens<'a> {
    chars: Chars<'a>,
}

impl<'a> CharTokens<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars(),
        }
    }
}

impl Iterator for CharTokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.chars.next().map(String::from)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chars.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_each_character() {
        let tokens: Vec<_> = CharTokens::new("abc").collect();
        assert_eq!(tokens, vec!["a", "b", "c"]);
    }

    #[test]
    fn multibyte_characters_stay_whole() {
        let tokens: Vec<_> = CharTokens::new("héλ").collect();
        assert_eq!(tokens, vec!["h", "é", "λ"]);
    }

    #[test]
    fn empty_input() {
        assert_eq!(CharTokens::new("").next(), None);
    }
}
