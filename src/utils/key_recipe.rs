//! Carves the AES passphrase out of a MegaCloud-style "encrypted" payload.
//!
//! A key recipe is `[N, inc_1, start_1, .., inc_N, start_N]`. Segment `i` of the
//! passphrase lives at `start_i + Σ inc_<i` in the payload, `inc_i` characters long.

use serde::Deserialize;

use super::text;
use crate::error::{ExtractError, Result};

pub const MAX_SEGMENTS: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecipe(Vec<i64>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub inc: i64,
    pub start: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredSecret {
    /// AES passphrase.
    pub secret: String,
    /// Payload with the passphrase segments taken out.
    pub cleaned: String,
}

impl KeyRecipe {
    pub fn new(values: Vec<i64>) -> Result<Self> {
        let count = values
            .first()
            .and_then(|&n| usize::try_from(n).ok())
            .filter(|&n| n <= MAX_SEGMENTS)
            .ok_or_else(|| {
                ExtractError::ScriptPatternNotFound(format!("bad segment count in {values:?}"))
            })?;

        if values.len() < 1 + 2 * count {
            return Err(ExtractError::ScriptPatternNotFound(format!(
                "{count} segments expected in {values:?}"
            )));
        }

        Ok(Self(values))
    }

    /// Builds a recipe from `(start, inc)` pairs.
    pub fn from_pairs(pairs: &[(i64, i64)]) -> Result<Self> {
        let mut values = Vec::with_capacity(1 + 2 * pairs.len());
        values.push(pairs.len() as i64);

        for &(start, inc) in pairs {
            values.push(inc);
            values.push(start);
        }

        Self::new(values)
    }

    /// Parses a key document: a JSON `[[start, inc], ..]` list, either raw or
    /// wrapped in a GitHub blob page.
    pub fn from_key_document(document: &str) -> Result<Self> {
        let raw = text::substring_between(
            document,
            r#""blob-code blob-code-inner js-file-line">"#,
            "</td>",
        )
        .unwrap_or(document);

        #[derive(Deserialize)]
        struct Pair(i64, i64);

        let pairs: Vec<Pair> = serde_json::from_str(raw.trim()).map_err(|err| {
            ExtractError::ScriptPatternNotFound(format!("key document is not a pair list: {err}"))
        })?;

        let pairs: Vec<_> = pairs.into_iter().map(|Pair(a, b)| (a, b)).collect();
        Self::from_pairs(&pairs)
    }

    pub fn values(&self) -> &[i64] {
        &self.0
    }

    pub fn segment_count(&self) -> usize {
        self.0[0] as usize
    }

    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        (0..self.segment_count()).map(|i| Segment {
            inc: self.0[2 * i + 1],
            start: self.0[2 * i + 2],
        })
    }
}

/// Splits `ciphertext` into passphrase and payload.
///
/// Each carved slice is removed from `cleaned` at its first textual occurrence,
/// not at the offset it was read from. Recipes are tuned against that, keep it.
pub fn recover_secret(ciphertext: &str, recipe: &KeyRecipe) -> Result<RecoveredSecret> {
    let mut secret = String::new();
    let mut cleaned = ciphertext.to_owned();
    let mut total_inc: usize = 0;

    for Segment { inc, start } in recipe.segments() {
        let (start, inc) = match (usize::try_from(start), usize::try_from(inc)) {
            (Ok(start), Ok(inc)) => (start, inc),
            _ => {
                return Err(ExtractError::Decrypt(format!(
                    "negative key recipe operand (start: {start}, inc: {inc})"
                )));
            }
        };

        let part = start
            .checked_add(total_inc)
            .and_then(|from| Some(from..from.checked_add(inc)?))
            .and_then(|range| ciphertext.get(range))
            .ok_or_else(|| {
                ExtractError::Decrypt(format!(
                    "key segment at {start}+{total_inc}, {inc} long, outside of {} byte payload",
                    ciphertext.len()
                ))
            })?;

        secret.push_str(part);
        cleaned = cleaned.replacen(part, "", 1);
        total_inc += inc;
    }

    Ok(RecoveredSecret { secret, cleaned })
}
