use std::collections::{BTreeSet, HashMap};

use crate::error::{Error, Result};
use crate::taxonomy::SkillVocabulary;

#[derive(Debug, Clone)]
struct PhrasePattern {
    tokens: Vec<String>,
    skill: usize,
}

/// Whole-token phrase matcher over a fixed vocabulary.
///
/// Built once at startup and shared by reference with every extraction call.
/// Phrases and text go through the same tokenizer, so a phrase only matches
/// as a complete token sequence: `r` matches `"r, sql"` but never `"rust"`.
#[derive(Debug, Clone)]
pub struct SkillMatcher {
    vocabulary: SkillVocabulary,
    by_first_token: HashMap<String, Vec<PhrasePattern>>,
}

impl SkillMatcher {
    pub fn new(vocabulary: SkillVocabulary) -> Result<Self> {
        let mut by_first_token: HashMap<String, Vec<PhrasePattern>> = HashMap::new();
        let mut spans = Vec::new();

        for (index, skill) in vocabulary.iter().enumerate() {
            let lowered = skill.to_lowercase();
            token_spans(&lowered, &mut spans);
            let tokens: Vec<String> = spans
                .iter()
                .map(|&(start, end)| lowered[start..end].to_string())
                .collect();

            let Some(first) = tokens.first().cloned() else {
                return Err(Error::Config(format!("skill {:?} has no tokens", skill)));
            };

            by_first_token.entry(first).or_default().push(PhrasePattern {
                tokens,
                skill: index,
            });
        }

        Ok(Self {
            vocabulary,
            by_first_token,
        })
    }

    pub fn vocabulary(&self) -> &SkillVocabulary {
        &self.vocabulary
    }

    /// Returns the canonical skills found in `text`, each at most once.
    pub fn find(&self, text: &str) -> BTreeSet<String> {
        let mut spans = Vec::new();
        self.find_with_buffer(text, &mut spans)
    }

    /// Same as [`find`](Self::find), reusing `spans` as token scratch space.
    pub fn find_with_buffer(&self, text: &str, spans: &mut Vec<(usize, usize)>) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        if text.is_empty() {
            return found;
        }

        let lowered = text.to_lowercase();
        token_spans(&lowered, spans);

        for i in 0..spans.len() {
            let (start, end) = spans[i];
            let Some(patterns) = self.by_first_token.get(&lowered[start..end]) else {
                continue;
            };

            for pattern in patterns {
                let len = pattern.tokens.len();
                if i + len > spans.len() {
                    continue;
                }

                let matched = pattern
                    .tokens
                    .iter()
                    .zip(&spans[i..i + len])
                    .all(|(token, &(s, e))| token == &lowered[s..e]);

                if matched {
                    if let Some(skill) = self.vocabulary.get(pattern.skill) {
                        found.insert(skill.to_string());
                    }
                }
            }
        }

        found
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Characters that split a word when they sit between two word characters.
/// A comma only splits between letters, so `1,000` stays whole.
fn is_infix(prev: char, c: char, next: char) -> bool {
    match c {
        '-' | '/' | ':' | '<' | '>' | '=' => is_word_char(prev) && is_word_char(next),
        ',' => prev.is_alphabetic() && next.is_alphabetic(),
        _ => false,
    }
}

/// Splits `text` into byte spans.
///
/// Whitespace separates chunks. Each chunk sheds its leading and trailing
/// punctuation one character at a time, plus a possessive `'s`, and what is
/// left is split only at infixes. Other punctuation stays inside the word,
/// so `r&d`, `java.lang` and `node.js` are single tokens.
fn token_spans(text: &str, spans: &mut Vec<(usize, usize)>) {
    spans.clear();
    let mut chunk_start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        if !c.is_whitespace() {
            chunk_start.get_or_insert(i);
            continue;
        }
        if let Some(start) = chunk_start.take() {
            chunk_spans(text, start, i, spans);
        }
    }

    if let Some(start) = chunk_start {
        chunk_spans(text, start, text.len(), spans);
    }
}

fn chunk_spans(text: &str, mut start: usize, mut end: usize, spans: &mut Vec<(usize, usize)>) {
    while let Some(c) = text[start..end].chars().next() {
        if is_word_char(c) {
            break;
        }
        spans.push((start, start + c.len_utf8()));
        start += c.len_utf8();
    }

    let mut suffixes = Vec::new();
    while let Some(c) = text[start..end].chars().next_back() {
        if is_word_char(c) {
            break;
        }
        end -= c.len_utf8();
        suffixes.push((end, end + c.len_utf8()));
    }
    if let Some(marker) = ["'s", "\u{2019}s"]
        .into_iter()
        .find(|m| end - start > m.len() && text[start..end].ends_with(m))
    {
        end -= marker.len();
        suffixes.push((end, end + marker.len()));
    }

    let word = &text[start..end];
    let mut token_start = start;
    let mut chars = word.char_indices().peekable();
    let mut prev: Option<char> = None;

    while let Some((i, c)) = chars.next() {
        let next = chars.peek().map(|&(_, n)| n);
        if let (Some(p), Some(n)) = (prev, next) {
            if is_infix(p, c, n) {
                let at = start + i;
                spans.push((token_start, at));
                spans.push((at, at + c.len_utf8()));
                token_start = at + c.len_utf8();
            }
        }
        prev = Some(c);
    }

    if token_start < end {
        spans.push((token_start, end));
    }
    spans.extend(suffixes.into_iter().rev());
}
