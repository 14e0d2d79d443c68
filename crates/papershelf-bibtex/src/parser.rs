//! BibTeX parser implementation using nom
//!
//! Handles:
//! - `@string` macro definitions (expanded in later field values)
//! - `@comment` and `@preamble` blocks (skipped)
//! - braced, quoted, numeric and macro-reference field values
//! - `#` concatenation and nested braces
//!
//! A malformed entry is recorded as a [`ParseIssue`] and parsing resumes at the next `@`.

use std::collections::HashMap;

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::map,
    sequence::{delimited, preceded},
    IResult,
};

use crate::entry::{Entry, EntryType};

/// Error type for single-entry parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("no BibTeX entry found")]
    NoEntry,
    #[error("malformed BibTeX entry near line {line}")]
    Malformed { line: u32 },
}

/// A recoverable problem found while parsing a bibliography
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    pub line: u32,
    pub message: String,
}

/// Everything recovered from a BibTeX document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bibliography {
    pub entries: Vec<Entry>,
    /// `@string` macros, keyed by lowercase name
    pub strings: HashMap<String, String>,
    pub issues: Vec<ParseIssue>,
}

/// Parse every block in `input`. Never fails; problems end up in `issues`.
pub fn parse_bibliography(input: &str) -> Bibliography {
    let mut result = Bibliography::default();
    let mut remaining = input;

    while let Some(at) = remaining.find('@') {
        let candidate = &remaining[at..];
        match parse_block(candidate, &result.strings) {
            Ok((rest, Block::Entry(mut entry))) => {
                let consumed = &candidate[..candidate.len() - rest.len()];
                entry.raw = Some(consumed.trim().to_string());
                result.entries.push(entry);
                remaining = rest;
            }
            Ok((rest, Block::Macro(name, value))) => {
                result.strings.insert(name.to_ascii_lowercase(), value);
                remaining = rest;
            }
            Ok((rest, Block::Skipped)) => remaining = rest,
            Err(_) => {
                result.issues.push(ParseIssue {
                    line: line_of(input, candidate),
                    message: "failed to parse entry".to_string(),
                });
                remaining = &candidate[1..];
            }
        }
    }

    result
}

/// Parse the first entry in `input`.
pub fn parse_entry(input: &str) -> Result<Entry, ParseError> {
    let parsed = parse_bibliography(input);
    if let Some(entry) = parsed.entries.into_iter().next() {
        return Ok(entry);
    }
    match parsed.issues.first() {
        Some(issue) => Err(ParseError::Malformed { line: issue.line }),
        None => Err(ParseError::NoEntry),
    }
}

enum Block {
    Entry(Entry),
    Macro(String, String),
    Skipped,
}

/// 1-based line number of `at`, which must be a suffix of `input`
fn line_of(input: &str, at: &str) -> u32 {
    let offset = input.len() - at.len();
    input[..offset].matches('\n').count() as u32 + 1
}

fn parse_block<'a>(input: &'a str, strings: &HashMap<String, String>) -> IResult<&'a str, Block> {
    let (rest, kind) = preceded(char('@'), preceded(multispace0, identifier))(input)?;

    match kind.to_ascii_lowercase().as_str() {
        "string" => {
            let (rest, _) = delimited(multispace0, char('{'), multispace0)(rest)?;
            let (rest, (name, value)) = parse_field(rest, strings)?;
            let (rest, _) = preceded(multispace0, char('}'))(rest)?;
            Ok((rest, Block::Macro(name, value)))
        }
        "comment" | "preamble" => {
            let (rest, _) = skip_block(rest)?;
            Ok((rest, Block::Skipped))
        }
        _ => {
            let (rest, entry) = parse_entry_body(rest, EntryType::from_name(kind), strings)?;
            Ok((rest, Block::Entry(entry)))
        }
    }
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-')(input)
}

fn cite_key(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || "_-:./+".contains(c))(input)
}

fn skip_block(input: &str) -> IResult<&str, ()> {
    let (rest, _) = multispace0(input)?;
    if rest.starts_with('{') {
        let (rest, _) = balanced(rest)?;
        Ok((rest, ()))
    } else {
        let end = rest.find('\n').unwrap_or(rest.len());
        Ok((&rest[end..], ()))
    }
}

fn parse_entry_body<'a>(
    input: &'a str,
    entry_type: EntryType,
    strings: &HashMap<String, String>,
) -> IResult<&'a str, Entry> {
    let (rest, _) = delimited(multispace0, char('{'), multispace0)(input)?;
    let (rest, key) = cite_key(rest)?;
    let (rest, _) = multispace0(rest)?;
    let mut remaining = rest.strip_prefix(',').unwrap_or(rest);

    let mut entry = Entry::new(key, entry_type);
    loop {
        let (rest, _) = multispace0(remaining)?;
        if let Some(rest) = rest.strip_prefix('}') {
            return Ok((rest, entry));
        }

        let (rest, (name, value)) = parse_field(rest, strings)?;
        entry.push(name, value);

        let (rest, _) = multispace0(rest)?;
        remaining = rest.strip_prefix(',').unwrap_or(rest);
    }
}

/// `name = value`
fn parse_field<'a>(
    input: &'a str,
    strings: &HashMap<String, String>,
) -> IResult<&'a str, (String, String)> {
    let (rest, name) = preceded(multispace0, identifier)(input)?;
    let (rest, _) = delimited(multispace0, char('='), multispace0)(rest)?;
    let (rest, value) = parse_value(rest, strings)?;
    Ok((rest, (name.to_ascii_lowercase(), value)))
}

/// One or more `#`-joined value pieces
fn parse_value<'a>(input: &'a str, strings: &HashMap<String, String>) -> IResult<&'a str, String> {
    let mut value = String::new();
    let mut remaining = input;

    loop {
        let (rest, piece) = alt((
            map(balanced, |block: &str| block[1..block.len() - 1].to_string()),
            quoted,
            map(take_while1(|c: char| c.is_ascii_digit()), str::to_string),
            map(identifier, |name: &str| {
                strings
                    .get(&name.to_ascii_lowercase())
                    .cloned()
                    .unwrap_or_else(|| name.to_string())
            }),
        ))(remaining)?;
        value.push_str(&piece);

        let (rest, _) = multispace0(rest)?;
        match rest.strip_prefix('#') {
            Some(after) => {
                let (after, _) = multispace0(after)?;
                remaining = after;
            }
            None => return Ok((rest, value)),
        }
    }
}

fn no_match(input: &str) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char))
}

/// A `{...}` block with balanced nesting, outer braces included
fn balanced(input: &str) -> IResult<&str, &str> {
    if !input.starts_with('{') {
        return Err(no_match(input));
    }

    let mut depth = 0usize;
    let mut escaped = false;
    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&input[i + 1..], &input[..=i]));
                }
            }
            _ => {}
        }
    }

    Err(no_match(input))
}

/// A `"..."` value; quotes inside braces do not terminate it
fn quoted(input: &str) -> IResult<&str, String> {
    let Some(body) = input.strip_prefix('"') else {
        return Err(no_match(input));
    };

    let mut depth = 0usize;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '"' if depth == 0 => return Ok((&body[i + 1..], body[..i].to_string())),
            _ => {}
        }
    }

    Err(no_match(input))
}
