//! Nom-based formula parser.
//!
//! Parses formula text straight to an [`Expr`]. A1-style references are
//! 1-based in the source text and come out of the parser zero-based.

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while, take_while1},
    character::complete::{char, multispace0, one_of, satisfy},
    combinator::{map, not, opt, recognize, value},
    multi::{fold_many0, many0, separated_list0},
    sequence::{delimited, pair, terminated, tuple},
    IResult,
};
use thiserror::Error;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use notebook_core::{col_from_label, CellCoord, CellError};

// =============================================================================
// Error Type
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

// =============================================================================
// Helper Combinators
// =============================================================================

/// Skip whitespace
fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Succeeds when the next character cannot continue a name
fn name_boundary(input: &str) -> IResult<&str, ()> {
    not(satisfy(|c| is_name_char(c) || c == '('))(input)
}

/// Parse an unsigned decimal number (negation is a unary operator)
fn parse_number(input: &str) -> IResult<&str, Expr> {
    let (input, num_str) = recognize(tuple((
        take_while1(|c: char| c.is_ascii_digit()),
        opt(pair(char('.'), take_while(|c: char| c.is_ascii_digit()))),
        opt(tuple((
            one_of("eE"),
            opt(one_of("+-")),
            take_while1(|c: char| c.is_ascii_digit()),
        ))),
    )))(input)?;

    let num: f64 = num_str.parse().unwrap_or(f64::NAN);
    Ok((input, Expr::Number(num)))
}

/// Parse a string literal (double-quoted, `""` escapes a quote)
fn parse_string(input: &str) -> IResult<&str, Expr> {
    let (rest, _) = char('"')(input)?;
    let mut result = String::new();
    let mut chars = rest.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != '"' {
            result.push(c);
            continue;
        }
        if matches!(chars.peek(), Some((_, '"'))) {
            result.push('"');
            chars.next();
        } else {
            return Ok((&rest[i + 1..], Expr::String(result)));
        }
    }

    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

/// Parse a boolean literal
fn parse_boolean(input: &str) -> IResult<&str, Expr> {
    alt((
        value(
            Expr::Boolean(true),
            terminated(tag_no_case("TRUE"), name_boundary),
        ),
        value(
            Expr::Boolean(false),
            terminated(tag_no_case("FALSE"), name_boundary),
        ),
    ))(input)
}

/// Parse an error literal
fn parse_error_literal(input: &str) -> IResult<&str, Expr> {
    alt((
        value(Expr::Error(CellError::DivisionByZero), tag("#DIV/0!")),
        value(Expr::Error(CellError::InvalidValue), tag("#VALUE!")),
        value(Expr::Error(CellError::InvalidReference), tag("#REF!")),
        value(Expr::Error(CellError::InvalidName), tag("#NAME?")),
        value(Expr::Error(CellError::NotAvailable), tag("#N/A")),
        value(Expr::Error(CellError::NullError), tag("#NULL!")),
        value(Expr::Error(CellError::NumError), tag("#NUM!")),
    ))(input)
}

/// Parse a cell reference (e.g., A1, $B$2, AA10) into zero-based coordinates
fn parse_cell_ref(input: &str) -> IResult<&str, Expr> {
    let start = input;
    let (input, abs_col) = opt(char('$'))(input)?;
    let (input, col_letters) = take_while1(|c: char| c.is_ascii_alphabetic())(input)?;
    let (input, abs_row) = opt(char('$'))(input)?;
    let (input, row_digits) = take_while1(|c: char| c.is_ascii_digit())(input)?;
    // `LOG10(` is a function name, not a reference
    let (input, _) = name_boundary(input)?;

    let fail = || nom::Err::Error(nom::error::Error::new(start, nom::error::ErrorKind::Verify));
    let col = col_from_label(col_letters).ok_or_else(fail)?;
    let row = row_digits
        .parse::<u32>()
        .ok()
        .and_then(|r| r.checked_sub(1))
        .ok_or_else(fail)?;

    Ok((
        input,
        Expr::CellRef {
            coord: CellCoord::new(row, col),
            abs_col: abs_col.is_some(),
            abs_row: abs_row.is_some(),
        },
    ))
}

/// Parse a cell reference optionally followed by `:` and a second reference
fn parse_ref_or_range(input: &str) -> IResult<&str, Expr> {
    let (input, first) = parse_cell_ref(input)?;
    let (input, second) = opt(pair(ws(char(':')), parse_cell_ref))(input)?;

    Ok(match second {
        Some((_, end)) => (input, Expr::range(first, end)),
        None => (input, first),
    })
}

/// Parse an identifier (function name)
fn parse_identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(is_name_char),
    ))(input)
}

/// Parse a sheet name (quoted or unquoted)
/// Examples: Sheet1, 'Sheet Name', 'Sheet''s Data'
fn parse_sheet_name(input: &str) -> IResult<&str, String> {
    alt((
        map(
            delimited(
                char('\''),
                recognize(many0(alt((take_while1(|c: char| c != '\''), tag("''"))))),
                char('\''),
            ),
            |s: &str| s.replace("''", "'"),
        ),
        map(
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
            |s: &str| s.to_string(),
        ),
    ))(input)
}

/// Parse `Sheet!A1` or `'Sheet name'!A1:B2`
fn parse_sheet_ref(input: &str) -> IResult<&str, Expr> {
    let (input, sheet_name) = parse_sheet_name(input)?;
    let (input, _) = char('!')(input)?;
    let (input, reference) = parse_ref_or_range(input)?;

    Ok((
        input,
        Expr::SheetRef {
            sheet_name,
            reference: Box::new(reference),
        },
    ))
}

/// Parse a function call with comma- or semicolon-separated arguments
fn parse_function_call(input: &str) -> IResult<&str, Expr> {
    let (input, name) = parse_identifier(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, args) = separated_list0(ws(alt((char(','), char(';')))), parse_expression)(input)?;
    let (input, _) = ws(char(')'))(input)?;

    Ok((input, Expr::function(name.to_uppercase(), args)))
}

// =============================================================================
// Operator Parsers
// =============================================================================

fn parse_comparison_op(input: &str) -> IResult<&str, BinaryOp> {
    alt((
        value(BinaryOp::Le, tag("<=")),
        value(BinaryOp::Ge, tag(">=")),
        value(BinaryOp::Ne, tag("<>")),
        value(BinaryOp::Lt, tag("<")),
        value(BinaryOp::Gt, tag(">")),
        value(BinaryOp::Eq, tag("=")),
    ))(input)
}

fn parse_additive_op(input: &str) -> IResult<&str, BinaryOp> {
    alt((
        value(BinaryOp::Add, char('+')),
        value(BinaryOp::Sub, char('-')),
    ))(input)
}

fn parse_multiplicative_op(input: &str) -> IResult<&str, BinaryOp> {
    alt((
        value(BinaryOp::Mul, char('*')),
        value(BinaryOp::Div, char('/')),
    ))(input)
}

fn parse_concat_op(input: &str) -> IResult<&str, BinaryOp> {
    value(BinaryOp::Concat, char('&'))(input)
}

// =============================================================================
// Expression Parsers (Precedence Climbing)
// =============================================================================

/// Parse a primary expression (literals, references, function calls, parentheses)
fn parse_primary(input: &str) -> IResult<&str, Expr> {
    let (input, _) = multispace0(input)?;

    alt((
        map(delimited(char('('), parse_expression, ws(char(')'))), |e| {
            Expr::Grouped(Box::new(e))
        }),
        parse_error_literal,
        parse_boolean,
        parse_string,
        parse_number,
        parse_sheet_ref,
        parse_ref_or_range,
        parse_function_call,
    ))(input)
}

/// Parse a postfix expression (percent)
fn parse_postfix(input: &str) -> IResult<&str, Expr> {
    let (input, expr) = parse_primary(input)?;
    let (input, percents) = many0(ws(char('%')))(input)?;

    let result = percents
        .into_iter()
        .fold(expr, |acc, _| Expr::unary(UnaryOp::Percent, acc));

    Ok((input, result))
}

/// Parse a unary expression (prefix - or +)
fn parse_unary(input: &str) -> IResult<&str, Expr> {
    let (input, _) = multispace0(input)?;

    alt((
        map(pair(char('-'), parse_unary), |(_, e)| {
            Expr::unary(UnaryOp::Neg, e)
        }),
        map(pair(char('+'), parse_unary), |(_, e)| {
            Expr::unary(UnaryOp::Pos, e)
        }),
        parse_postfix,
    ))(input)
}

/// Parse power expressions (right-associative)
fn parse_power(input: &str) -> IResult<&str, Expr> {
    let (input, base) = parse_unary(input)?;

    if let Ok((input, _)) = ws(char::<&str, nom::error::Error<&str>>('^'))(input) {
        let (input, exp) = parse_power(input)?;
        Ok((input, Expr::binary(base, BinaryOp::Pow, exp)))
    } else {
        Ok((input, base))
    }
}

/// Left-associative chain of `operand (op operand)*`
fn left_assoc<'a>(
    input: &'a str,
    operand: fn(&'a str) -> IResult<&'a str, Expr>,
    op: fn(&'a str) -> IResult<&'a str, BinaryOp>,
) -> IResult<&'a str, Expr> {
    let (input, init) = operand(input)?;

    fold_many0(
        pair(ws(op), operand),
        move || init.clone(),
        |acc, (op, val)| Expr::binary(acc, op, val),
    )(input)
}

fn parse_multiplicative(input: &str) -> IResult<&str, Expr> {
    left_assoc(input, parse_power, parse_multiplicative_op)
}

fn parse_additive(input: &str) -> IResult<&str, Expr> {
    left_assoc(input, parse_multiplicative, parse_additive_op)
}

fn parse_concat(input: &str) -> IResult<&str, Expr> {
    left_assoc(input, parse_additive, parse_concat_op)
}

fn parse_comparison(input: &str) -> IResult<&str, Expr> {
    left_assoc(input, parse_concat, parse_comparison_op)
}

/// Parse a complete expression
pub fn parse_expression(input: &str) -> IResult<&str, Expr> {
    let (input, _) = multispace0(input)?;
    let (input, expr) = parse_comparison(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, expr))
}

// =============================================================================
// Public API
// =============================================================================

/// Parse formula text into an AST. A leading `=` is optional.
pub fn parse_formula(input: &str) -> Result<Expr, ParseError> {
    let body = input.trim();
    let body = body.strip_prefix('=').unwrap_or(body);

    if body.trim().is_empty() {
        return Err(ParseError {
            message: "empty formula".to_string(),
            position: 0,
        });
    }

    match parse_expression(body) {
        Ok((remaining, expr)) => {
            if remaining.is_empty() {
                Ok(expr)
            } else {
                Err(ParseError {
                    message: format!("unexpected input: '{}'", remaining),
                    position: body.len() - remaining.len(),
                })
            }
        }
        Err(e) => Err(ParseError {
            message: format!("{:?}", e),
            position: 0,
        }),
    }
}

/// Parser handle, kept as a type so the grammar can be swapped behind it
#[derive(Debug, Clone, Copy, Default)]
pub struct FormulaParser;

impl FormulaParser {
    pub fn new() -> Self {
        FormulaParser
    }

    pub fn parse(&self, input: &str) -> Result<Expr, ParseError> {
        parse_formula(input)
    }
}

// =============================================================================
// Tests
// =============================================================================
