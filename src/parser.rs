//! Text parsers using nom.
//!
//! Two small grammars show up in schema files and on the command line:
//!
//! ```text
//! decimal(10,2)                       type declaration
//! ─┬───── ─┬ ─┬
//!  │       │  └── scale
//!  │       └── size
//!  └── datatype
//!
//! age>=21 and email in ('a@x.io', 'b@x.io') or deleted_on is null
//! ```

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while1},
    character::complete::{char, digit1, multispace0, multispace1},
    combinator::{map, map_res, opt, recognize},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated, tuple},
};

use crate::datatype::DataType;
use crate::error::{TabulaError, TabulaResult};
use crate::query::{ComparisonOp, Condition, Joiner, Where};
use crate::value::Value;

/// A parsed `name[(size[,scale])]` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub datatype: DataType,
    pub size: Option<i64>,
    pub scale: Option<u32>,
}

/// Parse a datatype declaration such as `varchar(128)` or `decimal(10,2)`.
pub fn parse_type_decl(input: &str) -> TabulaResult<TypeDecl> {
    match type_decl(input) {
        Ok(("", (name, args))) => {
            let datatype: DataType = name.parse()?;
            let (size, scale) = match args {
                Some((size, scale)) => (Some(size), scale),
                None => (None, None),
            };
            Ok(TypeDecl {
                datatype,
                size,
                scale,
            })
        }
        Ok((remaining, _)) => Err(TabulaError::parse(
            input.len() - remaining.len(),
            format!("Unexpected trailing content: '{}'", remaining),
        )),
        Err(e) => Err(TabulaError::parse(0, format!("Invalid type declaration: {:?}", e))),
    }
}

/// Parse a filter expression into a [`Where`].
pub fn parse_filter(input: &str) -> TabulaResult<Where> {
    match filters(input) {
        Ok(("", filter)) => Ok(filter),
        Ok((remaining, _)) => Err(TabulaError::parse(
            input.len() - remaining.len(),
            format!("Unexpected trailing content: '{}'", remaining),
        )),
        Err(e) => Err(TabulaError::parse(0, format!("Parse failed: {:?}", e))),
    }
}

fn type_decl(input: &str) -> IResult<&str, (&str, Option<(i64, Option<u32>)>)> {
    let (input, _) = multispace0(input)?;
    let (input, name) = take_while1(|c: char| c.is_ascii_alphabetic())(input)?;
    let (input, _) = multispace0(input)?;
    let (input, args) = opt(delimited(
        pair(char('('), multispace0),
        pair(
            parse_int,
            opt(preceded(
                tuple((multispace0, char(','), multispace0)),
                map_res(digit1, str::parse::<u32>),
            )),
        ),
        pair(multispace0, char(')')),
    ))(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, (name, args)))
}

fn parse_int(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(char('-')), digit1)), str::parse::<i64>)(input)
}

/// Parse the complete filter list.
fn filters(input: &str) -> IResult<&str, Where> {
    let (input, _) = multispace0(input)?;
    let (input, first) = filter(input)?;
    let (input, rest) = many0(pair(parse_joiner, filter))(input)?;
    let (input, _) = multispace0(input)?;

    let mut clause = Where::new();
    let (column, condition, value) = first;
    clause.push(column, condition, value, Joiner::And);
    for (joiner, (column, condition, value)) in rest {
        clause.push(column, condition, value, joiner);
    }
    Ok((input, clause))
}

fn parse_joiner(input: &str) -> IResult<&str, Joiner> {
    delimited(
        multispace1,
        alt((
            map(tag_no_case("and"), |_| Joiner::And),
            map(tag_no_case("or"), |_| Joiner::Or),
        )),
        multispace1,
    )(input)
}

/// Parse a single `column <condition> value` triple.
fn filter(input: &str) -> IResult<&str, (String, Condition, Value)> {
    let (input, column) = parse_identifier(input)?;
    let (input, _) = multispace0(input)?;
    let (input, (condition, value)) = parse_condition_and_value(input)?;
    Ok((input, (column.to_string(), condition, value)))
}

fn parse_identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-')(input)
}

fn parse_condition_and_value(input: &str) -> IResult<&str, (Condition, Value)> {
    alt((
        map(tag_no_case("is not null"), |_| {
            (Condition::Compare(ComparisonOp::Eq), Value::from("is not null"))
        }),
        map(tag_no_case("is null"), |_| {
            (Condition::Compare(ComparisonOp::Eq), Value::from("is null"))
        }),
        map(
            preceded(terminated(tag_no_case("not in"), multispace0), parse_list),
            |v| (Condition::NotIn, v),
        ),
        map(
            preceded(terminated(tag_no_case("in"), multispace0), parse_list),
            |v| (Condition::In, v),
        ),
        map(pair(parse_operator, preceded(multispace0, parse_value)), |(op, v)| {
            (Condition::Compare(op), v)
        }),
    ))(input)
}

fn parse_operator(input: &str) -> IResult<&str, ComparisonOp> {
    alt((
        map(tag(">="), |_| ComparisonOp::Gte),
        map(tag("<="), |_| ComparisonOp::Lte),
        map(tag("!="), |_| ComparisonOp::Ne),
        map(tag("<>"), |_| ComparisonOp::Ne),
        map(char('>'), |_| ComparisonOp::Gt),
        map(char('<'), |_| ComparisonOp::Lt),
        map(char('='), |_| ComparisonOp::Eq),
    ))(input)
}

fn parse_list(input: &str) -> IResult<&str, Value> {
    map(
        delimited(
            pair(char('('), multispace0),
            separated_list0(tuple((multispace0, char(','), multispace0)), parse_value),
            pair(multispace0, char(')')),
        ),
        Value::Array,
    )(input)
}

/// Parse a quoted string or a bare token.
fn parse_value(input: &str) -> IResult<&str, Value> {
    alt((parse_quoted_string, map(parse_bare, classify_bare)))(input)
}

/// Parse a quoted string. A doubled quote stands for one quote.
fn parse_quoted_string(input: &str) -> IResult<&str, Value> {
    let (input, _) = char('\'')(input)?;
    let (input, parts) = many0(alt((
        take_while1(|c: char| c != '\''),
        map(tag("''"), |_| "'"),
    )))(input)?;
    let (input, _) = char('\'')(input)?;
    Ok((input, Value::String(parts.concat())))
}

fn parse_bare(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| !c.is_whitespace() && c != ',' && c != ')' && c != '('),
        opt(tag("()")),
    ))(input)
}

/// Interpret a bare token as a number, boolean, null or plain string.
fn classify_bare(token: &str) -> Value {
    if let Ok(n) = token.parse::<i64>() {
        return Value::Int(n);
    }
    if let Ok(f) = token.parse::<f64>() {
        return Value::Float(f);
    }
    match token.to_ascii_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => Value::String(token.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnKey;

    #[test]
    fn test_type_decl_plain() {
        let decl = parse_type_decl("datetime").unwrap();
        assert_eq!(decl.datatype, DataType::DateTime);
        assert_eq!(decl.size, None);
    }

    #[test]
    fn test_type_decl_with_size_and_scale() {
        let decl = parse_type_decl(" DECIMAL( 10 , 2 ) ").unwrap();
        assert_eq!(decl.datatype, DataType::Decimal);
        assert_eq!(decl.size, Some(10));
        assert_eq!(decl.scale, Some(2));
    }

    #[test]
    fn test_type_decl_errors() {
        assert!(matches!(
            parse_type_decl("varchar(12"),
            Err(TabulaError::Parse { .. })
        ));
        assert_eq!(
            parse_type_decl("uuid").unwrap_err(),
            TabulaError::UnsupportedDatatype("uuid".into())
        );
    }

    #[test]
    fn test_filter_simple() {
        let filter = parse_filter("age>=21").unwrap();
        assert_eq!(filter.columns, vec![ColumnKey::from("age")]);
        assert_eq!(filter.conditions, vec![Condition::Compare(ComparisonOp::Gte)]);
        assert_eq!(filter.values, vec![Value::Int(21)]);
    }

    #[test]
    fn test_filter_joined() {
        let filter =
            parse_filter("name = 'o''brien' or deleted_on is null AND id in (1, 2)").unwrap();
        assert_eq!(filter.columns.len(), 3);
        assert_eq!(filter.values[0], Value::from("o'brien"));
        assert_eq!(filter.joiners, vec![Joiner::And, Joiner::Or, Joiner::And]);
        assert_eq!(filter.values[1], Value::from("is null"));
        assert_eq!(filter.conditions[2], Condition::In);
        assert_eq!(filter.values[2], Value::Array(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn test_filter_bare_date() {
        let filter = parse_filter("created_on=2023-05-01").unwrap();
        assert_eq!(filter.values, vec![Value::from("2023-05-01")]);
    }

    #[test]
    fn test_filter_trailing_garbage() {
        assert!(matches!(
            parse_filter("age >= 21 garbage"),
            Err(TabulaError::Parse { .. })
        ));
    }
}
