//! Text normalization
//!
//! Turns a raw customer message into the canonical form every matcher runs
//! against. Steps, in order:
//!
//! 1. Zero-width space becomes a space, other format characters (zero-width
//!    joiners, bidi overrides, BOM) are dropped
//! 2. Lowercase, canonical decomposition, combining marks removed
//!    (`Está` becomes `esta`)
//! 3. Whitespace and control runs collapse to one space, repeated identical
//!    punctuation collapses to one mark, ends are trimmed
//! 4. Letter runs of three or more collapse to one letter (`holaaaa`), then
//!    informal spellings are rewritten from the slang table
//! 5. The result is capped at `max_chars` chars, cutting at a token boundary
//!    when one exists
//!
//! Normalizing is total and idempotent: `normalize(normalize(x)) == normalize(x)`.
//!
//! Every normalized char remembers the input bytes it came from, so a span of
//! normalized text can be traced back to the customer's own spelling with
//! [`NormalizedText::source_range`].

mod slang;

pub use slang::SlangTable;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Range;
use std::sync::Arc;

use order_nlu_config::constants::normalizer::{DEFAULT_MAX_CHARS, PRESCAN_FACTOR};
use serde::{Serialize, Serializer};
use unicode_categories::UnicodeCategories;
use unicode_normalization::char::{decompose_canonical, is_combining_mark};
use unicode_segmentation::UnicodeSegmentation;

const ZERO_WIDTH_SPACE: char = '\u{200B}';

/// One output char and the input bytes that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Piece {
    ch: char,
    start: usize,
    end: usize,
}

impl Piece {
    fn with_char(self, ch: char) -> Self {
        Self { ch, ..self }
    }
}

fn to_pieces(text: &str) -> Vec<Piece> {
    text.char_indices()
        .map(|(start, ch)| Piece {
            ch,
            start,
            end: start + ch.len_utf8(),
        })
        .collect()
}

fn to_text(pieces: &[Piece]) -> String {
    pieces.iter().map(|p| p.ch).collect()
}

/// Input byte range of the normalized char starting at byte `at`
#[derive(Debug, Clone, Copy)]
struct Origin {
    at: usize,
    start: usize,
    end: usize,
}

/// Text produced by [`Normalizer::normalize`]
///
/// Matchers only accept this type so un-normalized text cannot reach them.
/// Equality, hashing and serialization only look at the text.
#[derive(Debug, Clone)]
pub struct NormalizedText {
    text: String,
    origin: Vec<Origin>,
}

impl NormalizedText {
    fn from_pieces(pieces: &[Piece]) -> Self {
        let mut text = String::with_capacity(pieces.len());
        let mut origin = Vec::with_capacity(pieces.len());
        for piece in pieces {
            origin.push(Origin {
                at: text.len(),
                start: piece.start,
                end: piece.end,
            });
            text.push(piece.ch);
        }
        Self { text, origin }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn char_count(&self) -> usize {
        self.origin.len()
    }

    /// Byte range of the normalizer input that produced `start..end`
    ///
    /// `start` must be a char boundary of the normalized text. Chars the
    /// normalizer dropped inside the span are covered; squeezed runs and
    /// rewritten tokens map to their whole input spelling.
    pub fn source_range(&self, start: usize, end: usize) -> Option<Range<usize>> {
        if start >= end || end > self.text.len() {
            return None;
        }
        let first = self.origin.binary_search_by_key(&start, |o| o.at).ok()?;
        let last = self.origin.partition_point(|o| o.at < end).checked_sub(1)?;
        let (from, to) = (self.origin[first].start, self.origin[last].end);
        (from < to).then_some(from..to)
    }
}

impl PartialEq for NormalizedText {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for NormalizedText {}

impl Hash for NormalizedText {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl Serialize for NormalizedText {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl AsRef<str> for NormalizedText {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl PartialEq<str> for NormalizedText {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

impl PartialEq<&str> for NormalizedText {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

/// Message normalizer
#[derive(Debug, Clone)]
pub struct Normalizer {
    slang: Arc<SlangTable>,
    max_chars: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::without_slang(DEFAULT_MAX_CHARS)
    }
}

impl Normalizer {
    pub fn new(slang: Arc<SlangTable>, max_chars: usize) -> Self {
        Self { slang, max_chars }
    }

    /// Normalizer with an empty slang table
    pub fn without_slang(max_chars: usize) -> Self {
        Self::new(Arc::new(SlangTable::default()), max_chars)
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn normalize(&self, text: &str) -> NormalizedText {
        let input = to_pieces(self.prescan(text));

        let visible = neutralize_invisible(input);
        let folded = fold_case_and_accents(visible);
        let collapsed = collapse_runs(folded);
        let squeezed = squeeze_letter_runs(collapsed);
        let rewritten = self.slang.apply_pieces(squeezed);

        NormalizedText::from_pieces(&cap_chars(rewritten, self.max_chars))
    }

    /// Steps 1 and 3 only: original case and accents kept
    ///
    /// For echoing user text back in logs and replies.
    pub fn display_safe(&self, text: &str) -> String {
        to_text(&collapse_runs(neutralize_invisible(to_pieces(self.prescan(text)))))
    }

    /// Bound the work done on pathological input
    fn prescan<'a>(&self, text: &'a str) -> &'a str {
        let budget = self.max_chars.saturating_mul(PRESCAN_FACTOR);
        match text.char_indices().nth(budget) {
            Some((idx, _)) => &text[..idx],
            None => text,
        }
    }
}

fn neutralize_invisible(pieces: Vec<Piece>) -> Vec<Piece> {
    pieces
        .into_iter()
        .filter_map(|p| match p.ch {
            ZERO_WIDTH_SPACE => Some(p.with_char(' ')),
            c if c.is_other_format() => None,
            _ => Some(p),
        })
        .collect()
}

fn fold_case_and_accents(pieces: Vec<Piece>) -> Vec<Piece> {
    let mut out = Vec::with_capacity(pieces.len());
    for piece in pieces {
        for lower in piece.ch.to_lowercase() {
            decompose_canonical(lower, |c| {
                if !is_combining_mark(c) {
                    out.push(piece.with_char(c));
                }
            });
        }
    }
    out
}

fn is_punct(c: char) -> bool {
    c.is_ascii_punctuation() || c.is_punctuation()
}

fn collapse_runs(pieces: Vec<Piece>) -> Vec<Piece> {
    let mut out: Vec<Piece> = Vec::with_capacity(pieces.len());
    let mut pending_space: Option<Piece> = None;

    for piece in pieces {
        if piece.ch.is_whitespace() || piece.ch.is_control() {
            pending_space.get_or_insert(piece);
            continue;
        }
        if let Some(space) = pending_space.take() {
            if !out.is_empty() {
                out.push(space.with_char(' '));
            }
        }
        if is_punct(piece.ch) && out.last().map(|p| p.ch) == Some(piece.ch) {
            continue;
        }
        out.push(piece);
    }

    out
}

fn squeeze_letter_runs(pieces: Vec<Piece>) -> Vec<Piece> {
    let mut out = Vec::with_capacity(pieces.len());
    let mut i = 0;

    while i < pieces.len() {
        let c = pieces[i].ch;
        let run = pieces[i..].iter().take_while(|p| p.ch == c).count();
        if run >= 3 && c.is_alphabetic() {
            out.push(Piece {
                ch: c,
                start: pieces[i].start,
                end: pieces[i + run - 1].end,
            });
        } else {
            out.extend_from_slice(&pieces[i..i + run]);
        }
        i += run;
    }

    out
}

/// Cap at `max_chars`, preferring the last token boundary
///
/// A single oversized token is hard-cut at a grapheme boundary, or at a char
/// boundary when the grapheme cut would lose more than half the budget.
fn cap_chars(mut pieces: Vec<Piece>, max_chars: usize) -> Vec<Piece> {
    if pieces.len() <= max_chars {
        return pieces;
    }
    let text = to_text(&pieces);
    let end = cap_end(&text, max_chars);
    pieces.truncate(text[..end].chars().count());
    pieces
}

/// Byte length of `text` once capped
fn cap_end(text: &str, max_chars: usize) -> usize {
    let Some((limit, _)) = text.char_indices().nth(max_chars) else {
        return text.len();
    };

    if text[limit..].starts_with(' ') {
        return limit;
    }
    if let Some(space) = text[..limit].rfind(' ') {
        return space;
    }

    let by_grapheme = text
        .grapheme_indices(true)
        .map(|(idx, g)| idx + g.len())
        .take_while(|end| *end <= limit)
        .last()
        .unwrap_or(0);
    if text[..by_grapheme].chars().count() >= max_chars / 2 {
        by_grapheme
    } else {
        limit
    }
}
