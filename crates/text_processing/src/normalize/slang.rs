//! Informal spelling substitution
//!
//! Works token by token on text that is already lowercased and collapsed to
//! single spaces. Only the alphanumeric core of a token is looked up, so
//! surrounding punctuation survives: `q?` becomes `que?`.

use std::collections::HashMap;

use order_nlu_config::constants::normalizer::MAX_SLANG_TOKEN_CHARS;
use order_nlu_config::SlangDef;

use super::{to_pieces, to_text, Piece};

/// Compiled substitution table
#[derive(Debug, Clone, Default)]
pub struct SlangTable {
    single: HashMap<String, String>,
    /// Multi-token keys, longest first
    multi: Vec<(Vec<String>, String)>,
}

/// A space-delimited token split around its alphanumeric core
#[derive(Debug, Clone)]
struct Token<'a> {
    raw: &'a [Piece],
    prefix: &'a [Piece],
    core: &'a [Piece],
    suffix: &'a [Piece],
    word: String,
}

impl<'a> Token<'a> {
    fn parse(raw: &'a [Piece]) -> Self {
        let start = raw.iter().position(|p| p.ch.is_alphanumeric());
        let end = raw.iter().rposition(|p| p.ch.is_alphanumeric()).map(|i| i + 1);

        match (start, end) {
            (Some(start), Some(end)) => Self {
                raw,
                prefix: &raw[..start],
                core: &raw[start..end],
                suffix: &raw[end..],
                word: to_text(&raw[start..end]),
            },
            _ => Self {
                raw,
                prefix: raw,
                core: &[],
                suffix: &[],
                word: String::new(),
            },
        }
    }

    fn eligible(&self) -> bool {
        !self.core.is_empty() && self.raw.len() <= MAX_SLANG_TOKEN_CHARS
    }
}

impl SlangTable {
    pub fn from_defs(defs: &[SlangDef]) -> Self {
        let mut single = HashMap::new();
        let mut multi = Vec::new();

        for def in defs {
            let words: Vec<String> = def.from.split_whitespace().map(str::to_string).collect();
            match words.len() {
                0 => continue,
                1 => {
                    single.insert(words[0].clone(), def.to.clone());
                }
                _ => multi.push((words, def.to.clone())),
            }
        }

        multi.sort_by_key(|(words, _): &(Vec<String>, String)| std::cmp::Reverse(words.len()));

        Self { single, multi }
    }

    pub fn len(&self) -> usize {
        self.single.len() + self.multi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rewrite every eligible token; multi-token keys are tried first
    pub fn apply(&self, text: &str) -> String {
        to_text(&self.apply_pieces(to_pieces(text)))
    }

    /// Rewrite tokens, keeping track of where each char came from
    ///
    /// A replacement maps to the whole spelling it replaced.
    pub(super) fn apply_pieces(&self, pieces: Vec<Piece>) -> Vec<Piece> {
        if self.is_empty() || pieces.is_empty() {
            return pieces;
        }

        let tokens: Vec<Token<'_>> = pieces.split(|p| p.ch == ' ').map(Token::parse).collect();
        let mut out: Vec<Piece> = Vec::with_capacity(pieces.len());
        let mut i = 0;

        while i < tokens.len() {
            if i > 0 {
                push_separator(&mut out, &pieces);
            }

            let token = &tokens[i];
            if !token.eligible() {
                out.extend_from_slice(token.raw);
                i += 1;
                continue;
            }

            if let Some((consumed, replacement)) = self.match_multi(&tokens[i..]) {
                push_replacement(&mut out, token, &tokens[i + consumed - 1], replacement);
                i += consumed;
                continue;
            }

            match self.single.get(token.word.as_str()) {
                Some(replacement) => push_replacement(&mut out, token, token, replacement),
                None => out.extend_from_slice(token.raw),
            }
            i += 1;
        }

        out
    }

    /// Longest multi-token key starting at `tokens[0]`
    ///
    /// Inner boundaries must be bare: `x q` matches, `x, q` does not.
    fn match_multi<'t>(&'t self, tokens: &[Token<'_>]) -> Option<(usize, &'t str)> {
        self.multi.iter().find_map(|(words, replacement)| {
            if words.len() > tokens.len() {
                return None;
            }
            let last = words.len() - 1;
            let matched = words.iter().zip(tokens).enumerate().all(|(j, (word, token))| {
                token.eligible()
                    && token.word == *word
                    && (j == 0 || token.prefix.is_empty())
                    && (j == last || token.suffix.is_empty())
            });
            matched.then_some((words.len(), replacement.as_str()))
        })
    }
}

/// The space between two tokens, placed where the previous token ended
fn push_separator(out: &mut Vec<Piece>, pieces: &[Piece]) {
    let at = out.last().or(pieces.first()).map_or(0, |p| p.end);
    out.push(Piece {
        ch: ' ',
        start: at,
        end: at,
    });
}

fn push_replacement(out: &mut Vec<Piece>, first: &Token<'_>, last: &Token<'_>, replacement: &str) {
    let start = first.core.first().map_or(0, |p| p.start);
    let end = last.core.last().map_or(start, |p| p.end);

    out.extend_from_slice(first.prefix);
    out.extend(replacement.chars().map(|ch| Piece { ch, start, end }));
    out.extend_from_slice(last.suffix);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SlangTable {
        SlangTable::from_defs(&[
            SlangDef { from: "x q".into(), to: "porque".into() },
            SlangDef { from: "q".into(), to: "que".into() },
            SlangDef { from: "x".into(), to: "por".into() },
            SlangDef { from: "xq".into(), to: "porque".into() },
            SlangDef { from: "m".into(), to: "me".into() },
        ])
    }

    #[test]
    fn test_single_token_substitution() {
        let slang = table();
        assert_eq!(slang.apply("xq no llega"), "porque no llega");
        assert_eq!(slang.apply("m podes decir?"), "me podes decir?");
        assert_eq!(slang.apply("¿q tal?"), "¿que tal?");
    }

    #[test]
    fn test_multi_token_wins() {
        let slang = table();
        assert_eq!(slang.apply("x q no"), "porque no");
        assert_eq!(slang.apply("x, q no"), "por, que no");
        assert_eq!(slang.apply("solo x"), "solo por");
    }

    #[test]
    fn test_long_tokens_and_substrings_untouched() {
        let slang = table();
        assert_eq!(slang.apply("xqxqxqxqxqxqxq"), "xqxqxqxqxqxqxq");
        assert_eq!(slang.apply("quiero"), "quiero");
        assert_eq!(slang.apply("12345"), "12345");
        assert_eq!(slang.apply("..."), "...");
    }

    #[test]
    fn test_empty_table() {
        let slang = SlangTable::default();
        assert!(slang.is_empty());
        assert_eq!(slang.apply("q"), "q");
    }
}
