//! Tokenizer for the bracketed comment block
//!
//! The block is a sequence of categories, `[Name],key=value,key="value",...`,
//! separated by line breaks. The last record of a category may run straight
//! into the next `[Name],` without a separator, quoted values may contain
//! commas and line breaks, and unquoted values may contain spaces.

use indexmap::IndexMap;
use winnow::{
    Parser,
    combinator::{alt, delimited, preceded, terminated},
    error::ContextError,
    token::{take_till, take_while},
};

use crate::error::{Result, StreakError};
use crate::types::parameters::{ParameterTree, normalize_name};

type PResult<O> = std::result::Result<O, ContextError>;

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == ' ' || c == '_' || c == '.'
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || c == ' ' || c == '.'
}

fn is_separator(c: char) -> bool {
    matches!(c, ',' | '\r' | '\n')
}

/// `[Name],`
pub(crate) fn category_header<'i>(input: &mut &'i str) -> PResult<&'i str> {
    terminated(delimited('[', take_while(1.., is_name_char), ']'), ',').parse_next(input)
}

fn key<'i>(input: &mut &'i str) -> PResult<&'i str> {
    take_while(1.., is_key_char).parse_next(input)
}

fn quoted_value<'i>(input: &mut &'i str) -> PResult<&'i str> {
    delimited('"', take_till(0.., '"'), '"').parse_next(input)
}

fn unquoted_value<'i>(input: &mut &'i str) -> PResult<&'i str> {
    take_till(0.., |c: char| is_separator(c) || c == '"' || c == '[').parse_next(input)
}

/// `key=value` where the value is quoted or a bare run up to the next separator.
pub(crate) fn key_value<'i>(input: &mut &'i str) -> PResult<(&'i str, &'i str)> {
    (key, preceded('=', alt((quoted_value, unquoted_value)))).parse_next(input)
}

/// A record ends at a separator, at the next category, or at the end of the block.
fn at_record_end(input: &str) -> bool {
    input.is_empty() || input.starts_with(|c: char| is_separator(c) || c == '[')
}

fn clean_value(value: &str) -> String {
    value
        .trim_matches(|c: char| c == ' ' || c == '\r' || c == '\n')
        .to_string()
}

/// First line of the offending block, for error reporting.
fn comment_error(block: &str) -> StreakError {
    let category = block.lines().next().unwrap_or_default().to_string();
    StreakError::CommentParse { category }
}

/// Parses the comment block into a [`ParameterTree`].
///
/// A field without `=` is an error rather than being skipped.
pub fn parse_comment(comment: &str) -> Result<ParameterTree> {
    let mut input = comment.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    let mut tree = ParameterTree::new();

    while !input.is_empty() {
        let block = input;
        let name = category_header
            .parse_next(&mut input)
            .map_err(|_| comment_error(block))?;

        let mut fields = IndexMap::new();
        loop {
            let _: &str = take_while(0.., is_separator)
                .parse_next(&mut input)
                .map_err(|_: ContextError| comment_error(block))?;
            if input.is_empty() || input.starts_with('[') {
                break;
            }
            let (key, value) = key_value
                .parse_next(&mut input)
                .map_err(|_| comment_error(block))?;
            input = input.trim_start_matches(' ');
            if !at_record_end(input) {
                return Err(comment_error(block));
            }
            fields.insert(normalize_name(key), clean_value(value));
        }
        tree.insert_category(name, fields);

        input = input.trim_start_matches(|c: char| c == '\0' || c.is_whitespace());
    }

    Ok(tree)
}
