//! Reads key recipe operands out of a minified player script. Nothing here runs the script.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use super::key_recipe::KeyRecipe;
use crate::error::{ExtractError, Result};

/// Where in the script the operands are declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptPattern {
    /// Last chain of 7+ short assignments.
    #[default]
    Last,
    /// First chain of 7+ short assignments after the `URLSearchParams` statement.
    AfterUrlSearchParams,
    /// `case 0x..: a = X, b = Y;` switch arms, operands resolved through `,X=0x..`.
    CaseOperands,
}

pub fn extract_key_recipe(script: &str, pattern: ScriptPattern) -> Result<KeyRecipe> {
    let values = extract_variables(script, pattern)?;
    debug!("[script_vars] {pattern:?} operands: {values:?}");
    KeyRecipe::new(values)
}

pub fn extract_variables(script: &str, pattern: ScriptPattern) -> Result<Vec<i64>> {
    match pattern {
        ScriptPattern::Last => {
            let statement = statement_regex()
                .find_iter(script)
                .last()
                .ok_or_else(|| not_found("no assignment chain"))?;

            Ok(parse_statement(statement.as_str()))
        }
        ScriptPattern::AfterUrlSearchParams => {
            let anchor = script
                .find("URLSearchParams")
                .ok_or_else(|| not_found("no URLSearchParams declaration"))?;
            let statement_end = script[anchor..]
                .find(';')
                .map(|idx| anchor + idx + 1)
                .ok_or_else(|| not_found("unterminated URLSearchParams declaration"))?;

            let statement = statement_regex()
                .find_at(script, statement_end)
                .ok_or_else(|| not_found("no assignment chain after URLSearchParams"))?;

            Ok(parse_statement(statement.as_str()))
        }
        ScriptPattern::CaseOperands => extract_case_operands(script),
    }
}

fn not_found(what: &str) -> ExtractError {
    ExtractError::ScriptPatternNotFound(what.into())
}

fn statement_regex() -> &'static Regex {
    static STATEMENT_RE: OnceLock<Regex> = OnceLock::new();
    STATEMENT_RE.get_or_init(|| {
        const NAME: &str = r"[A-Za-z_$][\w$]?";
        let value = format!(
            r#"(?:'[^'\n]{{0,50}}'|"[^"\n]{{0,50}}"|{NAME}\([^()\n]{{0,20}}\)|0[xX][0-9a-fA-F]+|\d+)"#
        );
        Regex::new(&format!(r"\b{NAME}={value}(?:,{NAME}={value}){{6,}}[^;]*;")).unwrap()
    })
}

/// `a='x',b=0x1f,c=4;` -> `[31, 4]`
fn parse_statement(statement: &str) -> Vec<i64> {
    statement
        .trim_end_matches(';')
        .split('=')
        .skip(1)
        .filter_map(|term| coerce_number(term.split(',').next().unwrap_or(term)))
        .collect()
}

fn coerce_number(term: &str) -> Option<i64> {
    let term = term.trim();

    if let Some(hex) = term.strip_prefix("0x").or_else(|| term.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }

    term.parse().ok()
}

fn extract_case_operands(script: &str) -> Result<Vec<i64>> {
    static CASE_RE: OnceLock<Regex> = OnceLock::new();
    let case_re = CASE_RE.get_or_init(|| {
        Regex::new(r#"case\s*0x[0-9a-f]+:\s*\w+\s*=\s*(\w+)\s*,\s*\w+\s*=\s*(\w+);"#).unwrap()
    });

    fn resolve(name: &str, script: &str) -> Option<i64> {
        if let Some(value) = coerce_number(name) {
            return Some(value);
        }

        let re = Regex::new(&format!(
            r",{}=((?:0x)?[0-9a-fA-F]+)\b",
            regex::escape(name)
        ))
        .ok()?;

        re.captures(script)
            .and_then(|m| coerce_number(m.get(1)?.as_str()))
    }

    let pairs: Vec<_> = case_re
        .captures_iter(script)
        .filter_map(|m| Some((m.get(1)?.as_str(), m.get(2)?.as_str())))
        .filter(|(_, inc)| !inc.starts_with("partKey"))
        .filter_map(|(start, inc)| Some((resolve(start, script)?, resolve(inc, script)?)))
        .collect();

    if pairs.is_empty() {
        return Err(not_found("no case operands"));
    }

    Ok(KeyRecipe::from_pairs(&pairs)?.values().to_vec())
}
