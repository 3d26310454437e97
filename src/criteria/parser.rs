//! nom parser compiling raw criteria text into a [`Predicate`].
//!
//! The grammar is deliberately permissive about whitespace and case, and
//! parsing is total: text that fits no structured pattern becomes
//! `Informational` when it reads as prose, or `Unparseable` when it is
//! shaped like a rule (leading operator or `if`) but does not parse.

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while_m_n},
    character::complete::{alphanumeric1, char, digit1, multispace0, space0, space1},
    combinator::{map, opt, recognize, value, verify},
    error::{ParseError, VerboseError},
    multi::{many0, many1, separated_list1},
    sequence::{delimited, preceded, tuple},
    Finish, IResult,
};
use smallvec::SmallVec;

use super::ast::{Branch, CompareOp, Comparison, Predicate};

/// Parser error type with context information.
pub type NomParseError<'a> = VerboseError<&'a str>;
pub type ParseResult<'a, T> = IResult<&'a str, T, NomParseError<'a>>;

/// Compile one criteria cell. Total and deterministic: the same text
/// always yields the same predicate, and no input is an error.
pub fn parse_criteria(raw: &str) -> Predicate {
    let text = raw.trim();
    if text.is_empty() {
        return Predicate::Empty;
    }

    if let Ok((rest, predicate)) = structured_predicate(text).finish() {
        if rest.trim().is_empty() {
            return predicate;
        }
    }

    // Rule-shaped text that survived to here failed the structured parse;
    // flagging it beats misreading "if x, then y" prose as a set.
    if looks_structured(text) {
        return Predicate::Unparseable;
    }

    if let Some(options) = enumerated_set(text) {
        return Predicate::OneOf(options);
    }

    Predicate::Informational
}

fn structured_predicate(input: &str) -> ParseResult<'_, Predicate> {
    alt((conditional, range, map(comparison, Predicate::Comparison)))(input)
}

/// Parse a comparison operator; two-char forms first.
fn compare_op(input: &str) -> ParseResult<'_, CompareOp> {
    alt((
        value(CompareOp::Gte, tag(">=")),
        value(CompareOp::Lte, tag("<=")),
        value(CompareOp::Eq, tag("==")),
        value(CompareOp::Eq, tag("=")),
        value(CompareOp::Gt, tag(">")),
        value(CompareOp::Lt, tag("<")),
    ))(input)
}

/// Parse one atom: `<op><number><unit?>`, e.g. `>=660` or `<= 45%`.
fn comparison(input: &str) -> ParseResult<'_, Comparison> {
    let (input, op) = compare_op(input)?;
    let (input, _) = space0(input)?;
    let (input, value) = number(input)?;
    Ok((input, Comparison { op, value }))
}

/// Parse a number like `660`, `3,500,000`, `$1,250,000.50`, or `85%`.
/// The `%` unit is consumed but the value keeps its 0-100 scale.
fn number(input: &str) -> ParseResult<'_, f64> {
    let (input, _) = opt(char('$'))(input)?;
    let (input, _) = space0(input)?;
    let (input, raw) = recognize(tuple((
        digit1,
        many0(preceded(char(','), thousands_group)),
        opt(preceded(char('.'), digit1)),
    )))(input)?;
    let (input, _) = opt(preceded(space0, char('%')))(input)?;

    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let parsed = cleaned.parse::<f64>().map_err(|_| {
        nom::Err::Error(VerboseError::from_error_kind(
            input,
            nom::error::ErrorKind::Float,
        ))
    })?;
    Ok((input, parsed))
}

fn thousands_group(input: &str) -> ParseResult<'_, &str> {
    take_while_m_n(3, 3, |c: char| c.is_ascii_digit())(input)
}

/// Parse two atoms joined by `and`: `>=125000 and <=3500000`.
fn range(input: &str) -> ParseResult<'_, Predicate> {
    let (input, low) = comparison(input)?;
    let (input, _) = delimited(space1, tag_no_case("and"), space1)(input)?;
    let (input, high) = comparison(input)?;
    Ok((input, Predicate::Range(low, high)))
}

/// Parse guarded branches: `if ltv,cltv>85%, then <=45% if ...`.
fn conditional(input: &str) -> ParseResult<'_, Predicate> {
    let (input, branches) = many1(preceded(multispace0, branch))(input)?;
    Ok((input, Predicate::Conditional(branches)))
}

fn branch(input: &str) -> ParseResult<'_, Branch> {
    let (input, _) = tag_no_case("if")(input)?;
    let (input, _) = space1(input)?;
    let (input, fields) = field_list(input)?;
    let (input, _) = space0(input)?;
    let (input, condition) = comparison(input)?;
    let (input, _) = opt(tuple((space0, char(','))))(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = tag_no_case("then")(input)?;
    let (input, _) = space1(input)?;
    let (input, consequent) = consequent(input)?;
    Ok((
        input,
        Branch {
            fields,
            condition,
            consequent,
        },
    ))
}

/// Borrower fields referenced by a guard, e.g. `ltv,cltv`. Lowercased for
/// profile lookup.
fn field_list(input: &str) -> ParseResult<'_, SmallVec<[String; 2]>> {
    let (input, names) = separated_list1(
        tuple((space0, char(','), space0)),
        field_name,
    )(input)?;
    Ok((input, names.iter().map(|n| n.to_lowercase()).collect()))
}

fn field_name(input: &str) -> ParseResult<'_, &str> {
    verify(
        recognize(many1(alt((alphanumeric1, tag("_"))))),
        |name: &str| {
            !name.eq_ignore_ascii_case("then")
                && !name.eq_ignore_ascii_case("if")
                && !name.eq_ignore_ascii_case("and")
        },
    )(input)
}

/// A consequent is a plain atom or a range; nested conditionals and sets
/// inside branches stay unparsed by design.
fn consequent(input: &str) -> ParseResult<'_, Predicate> {
    alt((range, map(comparison, Predicate::Comparison)))(input)
}

/// Read the text as an enumerated set like `Retail, Wholesale,
/// Correspondent` if every comma-separated token looks like a short label.
fn enumerated_set(text: &str) -> Option<Vec<String>> {
    if !text.contains(',') {
        return None;
    }
    let tokens: Vec<&str> = text.split(',').map(str::trim).collect();
    if tokens.len() < 2 {
        return None;
    }
    let mut options = Vec::with_capacity(tokens.len());
    for token in tokens {
        if token.is_empty() || !is_set_token(token) {
            return None;
        }
        options.push(token.to_string());
    }
    Some(options)
}

/// A set token is at most four words, has no comparison characters, and
/// no sentence boundary. Abbreviation dots (`U.S.`) are fine; a
/// multi-letter word ending in `.` before a space reads as prose.
fn is_set_token(token: &str) -> bool {
    if token.split_whitespace().count() > 4 {
        return false;
    }
    if token.chars().any(|c| matches!(c, '<' | '>' | '=' | ';')) {
        return false;
    }
    !has_sentence_boundary(token)
}

fn has_sentence_boundary(token: &str) -> bool {
    let chars: Vec<char> = token.chars().collect();
    for i in 0..chars.len() {
        if chars[i] != '.' {
            continue;
        }
        let followed_by_space = chars.get(i + 1).is_some_and(|c| c.is_whitespace());
        if !followed_by_space {
            continue;
        }
        let word_len = chars[..i]
            .iter()
            .rev()
            .take_while(|c| c.is_alphabetic())
            .count();
        if word_len >= 2 {
            return true;
        }
    }
    false
}

/// Rule-shaped text starts with an operator or the `if` keyword; when such
/// text fails to parse it is reported rather than silently ignored.
fn looks_structured(text: &str) -> bool {
    let lower = text.trim_start().to_lowercase();
    lower.starts_with('<')
        || lower.starts_with('>')
        || lower.starts_with('=')
        || lower == "if"
        || lower.starts_with("if ")
}
