//! Sandboxed boolean row expressions
//!
//! Filter expressions are parsed into an [`Expression`] tree and evaluated against single rows
//! of the flattened event table. Nothing is ever executed besides comparisons and boolean connectives.
//!
//! Grammar (lowest precedence first):
//!
//! ```text
//! or         := and (('|' | '||' | 'or') and)*
//! and        := unary (('&' | '&&' | 'and') unary)*
//! unary      := ('!' | 'not') unary | primary
//! primary    := '(' or ')' | operand (comparison operand)?
//! comparison := '==' | '=' | '!=' | '>' | '<' | '>=' | '<='
//! operand    := field | `quoted field` | 'string' | "string" | number | true | false | null
//! ```
//!
//! Field names may contain letters, digits, `_`, `:` and `.` (e.g., `org:resource`); other names
//! can be quoted with backticks. A bare field is true if its value is `true`, a non-zero number or the string `"true"`.

use std::collections::BTreeSet;
use std::fmt::Display;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::event_data::case_centric::{AttributeValue, EventRow};
use crate::error::OperationError;

/// Maximum nesting depth of parentheses and negations
const MAX_NESTING: usize = 64;

/// Comparison of a field against a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ComparisonOperator {
    /// `==`
    #[serde(rename = "==")]
    Equal,
    /// `!=`
    #[serde(rename = "!=")]
    NotEqual,
    /// `>`
    #[serde(rename = ">")]
    GreaterThan,
    /// `<`
    #[serde(rename = "<")]
    SmallerThan,
    /// `>=`
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    /// `<=`
    #[serde(rename = "<=")]
    SmallerThanOrEqual,
}

impl ComparisonOperator {
    /// Operator symbol (e.g., `>=`)
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::Equal => "==",
            ComparisonOperator::NotEqual => "!=",
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::SmallerThan => "<",
            ComparisonOperator::GreaterThanOrEqual => ">=",
            ComparisonOperator::SmallerThanOrEqual => "<=",
        }
    }

    ///
    /// Apply the comparison
    ///
    /// Equality is [`AttributeValue::loosely_equals`]; ordering comparisons of incomparable values are `false`.
    pub fn apply(&self, left: &AttributeValue, right: &AttributeValue) -> bool {
        use std::cmp::Ordering::*;
        match self {
            ComparisonOperator::Equal => left.loosely_equals(right),
            ComparisonOperator::NotEqual => !left.loosely_equals(right),
            ComparisonOperator::GreaterThan => left.compare(right) == Some(Greater),
            ComparisonOperator::SmallerThan => left.compare(right) == Some(Less),
            ComparisonOperator::GreaterThanOrEqual => {
                matches!(left.compare(right), Some(Greater | Equal))
            }
            ComparisonOperator::SmallerThanOrEqual => {
                matches!(left.compare(right), Some(Less | Equal))
            }
        }
    }
}

impl Display for ComparisonOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Leaf of an [`Expression`]
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Column of the event table
    Field(String),
    /// Constant value
    Literal(AttributeValue),
}

impl Operand {
    fn field_name(&self) -> Option<&str> {
        match self {
            Operand::Field(name) => Some(name),
            Operand::Literal(_) => None,
        }
    }

    /// Value of this operand for one row; missing fields resolve to [`AttributeValue::Null`]
    fn resolve<F: Fn(&str) -> Option<AttributeValue>>(&self, lookup: &F) -> AttributeValue {
        match self {
            Operand::Field(name) => lookup(name).unwrap_or(AttributeValue::Null),
            Operand::Literal(value) => value.clone(),
        }
    }
}

/// Parsed boolean row expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// `true` or `false`
    Constant(bool),
    /// Bare field used as condition
    Truthy(Operand),
    /// Binary comparison
    Comparison {
        /// Left-hand side
        left: Operand,
        /// Operator
        op: ComparisonOperator,
        /// Right-hand side
        right: Operand,
    },
    /// Negation
    Not(Box<Expression>),
    /// Conjunction
    And(Box<Expression>, Box<Expression>),
    /// Disjunction
    Or(Box<Expression>, Box<Expression>),
}

impl Expression {
    ///
    /// Parse an expression
    ///
    /// ```rust
    /// use log_workbench::transform::expression::Expression;
    ///
    /// let expr = Expression::parse("cost > 10 & `org:resource` != 'Ann'").unwrap();
    /// assert_eq!(expr.referenced_fields().len(), 2);
    /// assert!(Expression::parse("cost >").is_err());
    /// ```
    pub fn parse(source: &str) -> Result<Self, OperationError> {
        let invalid = |reason: String| OperationError::InvalidExpression {
            expression: source.to_string(),
            reason,
        };
        let tokens = tokenize(source).map_err(invalid)?;
        if tokens.is_empty() {
            return Err(invalid("expression is empty".to_string()));
        }
        let mut parser = Parser {
            tokens,
            position: 0,
            depth: 0,
        };
        let expression = parser.parse_or().map_err(invalid)?;
        if let Some(token) = parser.peek() {
            return Err(invalid(format!(
                "unexpected {} after end of expression",
                token.describe()
            )));
        }
        Ok(expression)
    }

    /// Names of all fields the expression reads
    pub fn referenced_fields(&self) -> BTreeSet<&str> {
        let mut fields = BTreeSet::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields<'a>(&'a self, fields: &mut BTreeSet<&'a str>) {
        match self {
            Expression::Constant(_) => {}
            Expression::Truthy(operand) => fields.extend(operand.field_name()),
            Expression::Comparison { left, right, .. } => {
                fields.extend(left.field_name().into_iter().chain(right.field_name()))
            }
            Expression::Not(inner) => inner.collect_fields(fields),
            Expression::And(l, r) | Expression::Or(l, r) => {
                l.collect_fields(fields);
                r.collect_fields(fields);
            }
        }
    }

    /// Evaluate the expression, looking up field values with `lookup`
    pub fn evaluate<F: Fn(&str) -> Option<AttributeValue>>(&self, lookup: &F) -> bool {
        match self {
            Expression::Constant(value) => *value,
            Expression::Truthy(operand) => is_truthy(&operand.resolve(lookup)),
            Expression::Comparison { left, op, right } => {
                op.apply(&left.resolve(lookup), &right.resolve(lookup))
            }
            Expression::Not(inner) => !inner.evaluate(lookup),
            Expression::And(l, r) => l.evaluate(lookup) && r.evaluate(lookup),
            Expression::Or(l, r) => l.evaluate(lookup) || r.evaluate(lookup),
        }
    }

    /// Evaluate the expression for one row of the event table
    pub fn matches(&self, row: &EventRow) -> bool {
        self.evaluate(&|name: &str| row.get_field(name))
    }
}

fn is_truthy(value: &AttributeValue) -> bool {
    match value {
        AttributeValue::Boolean(b) => *b,
        AttributeValue::String(s) => s.trim().eq_ignore_ascii_case("true"),
        AttributeValue::Int(i) => *i != 0,
        AttributeValue::Float(f) => *f != 0.0,
        AttributeValue::Date(_) => true,
        AttributeValue::Null => false,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Field(String),
    Literal(AttributeValue),
    Comparison(ComparisonOperator),
    And,
    Or,
    Not,
    LeftParen,
    RightParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Field(name) => format!("field '{}'", name),
            Token::Literal(value) => format!("value '{}'", value),
            Token::Comparison(op) => format!("'{}'", op),
            Token::And => "'&'".to_string(),
            Token::Or => "'|'".to_string(),
            Token::Not => "'!'".to_string(),
            Token::LeftParen => "'('".to_string(),
            Token::RightParen => "')'".to_string(),
        }
    }
}

fn is_field_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | ':' | '.')
}

/// Read a quoted section starting at `start`; returns the unescaped text and the index after the closing quote
fn read_quoted(chars: &[char], start: usize) -> Result<(String, usize), String> {
    let quote = chars[start];
    let mut text = String::new();
    let mut i = start + 1;
    while let Some(&c) = chars.get(i) {
        if c == quote {
            return Ok((text, i + 1));
        }
        if c == '\\' && quote != '`' {
            match chars.get(i + 1) {
                Some(&escaped) => {
                    text.push(escaped);
                    i += 2;
                    continue;
                }
                None => break,
            }
        }
        text.push(c);
        i += 1;
    }
    Err(format!("unterminated quote starting at position {}", start))
}

fn parse_number(text: &str) -> Result<AttributeValue, String> {
    if let Ok(int) = text.parse::<i64>() {
        return Ok(AttributeValue::Int(int));
    }
    text.parse::<f64>()
        .map(AttributeValue::Float)
        .map_err(|_| format!("invalid number '{}'", text))
}

fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while let Some(&c) = chars.get(i) {
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LeftParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RightParen);
                i += 1;
            }
            '&' => {
                tokens.push(Token::And);
                i += if next == Some('&') { 2 } else { 1 };
            }
            '|' => {
                tokens.push(Token::Or);
                i += if next == Some('|') { 2 } else { 1 };
            }
            '!' if next == Some('=') => {
                tokens.push(Token::Comparison(ComparisonOperator::NotEqual));
                i += 2;
            }
            '!' => {
                tokens.push(Token::Not);
                i += 1;
            }
            '=' => {
                tokens.push(Token::Comparison(ComparisonOperator::Equal));
                i += if next == Some('=') { 2 } else { 1 };
            }
            '>' | '<' => {
                let or_equal = next == Some('=');
                let op = match (c, or_equal) {
                    ('>', false) => ComparisonOperator::GreaterThan,
                    ('>', true) => ComparisonOperator::GreaterThanOrEqual,
                    ('<', false) => ComparisonOperator::SmallerThan,
                    _ => ComparisonOperator::SmallerThanOrEqual,
                };
                tokens.push(Token::Comparison(op));
                i += if or_equal { 2 } else { 1 };
            }
            '\'' | '"' | '`' => {
                let (text, end) = read_quoted(&chars, i)?;
                tokens.push(if c == '`' {
                    Token::Field(text)
                } else {
                    Token::Literal(AttributeValue::String(text))
                });
                i = end;
            }
            c if c.is_ascii_digit()
                || (matches!(c, '-' | '.') && next.is_some_and(|n| n.is_ascii_digit())) =>
            {
                let start = i;
                i += 1;
                while let Some(&d) = chars.get(i) {
                    let exponent_sign = matches!(d, '+' | '-') && matches!(chars[i - 1], 'e' | 'E');
                    if d.is_ascii_digit() || matches!(d, '.' | 'e' | 'E') || exponent_sign {
                        i += 1;
                    } else {
                        break;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                tokens.push(Token::Literal(parse_number(&text)?));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while chars.get(i).is_some_and(|&d| is_field_char(d)) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.to_ascii_lowercase().as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "true" => Token::Literal(AttributeValue::Boolean(true)),
                    "false" => Token::Literal(AttributeValue::Boolean(false)),
                    "null" | "none" => Token::Literal(AttributeValue::Null),
                    _ => Token::Field(word),
                });
            }
            other => {
                return Err(format!(
                    "unexpected character '{}' at position {}",
                    other, i
                ))
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn enter(&mut self) -> Result<(), String> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(format!("expression nested deeper than {} levels", MAX_NESTING));
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expression, String> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.position += 1;
            let right = self.parse_and()?;
            left = Expression::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression, String> {
        let mut left = self.parse_unary()?;
        while self.peek() == Some(&Token::And) {
            self.position += 1;
            let right = self.parse_unary()?;
            left = Expression::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, String> {
        if self.peek() == Some(&Token::Not) {
            self.position += 1;
            self.enter()?;
            let inner = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Expression::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expression, String> {
        match self.advance() {
            Some(Token::LeftParen) => {
                self.enter()?;
                let inner = self.parse_or()?;
                self.depth -= 1;
                match self.advance() {
                    Some(Token::RightParen) => Ok(inner),
                    Some(token) => Err(format!("expected ')' but found {}", token.describe())),
                    None => Err("missing closing parenthesis".to_string()),
                }
            }
            Some(Token::Field(name)) => self.parse_comparison(Operand::Field(name)),
            Some(Token::Literal(value)) => self.parse_comparison(Operand::Literal(value)),
            Some(token) => Err(format!("unexpected {}", token.describe())),
            None => Err("unexpected end of expression".to_string()),
        }
    }

    fn parse_comparison(&mut self, left: Operand) -> Result<Expression, String> {
        if let Some(Token::Comparison(op)) = self.peek().cloned() {
            self.position += 1;
            let right = match self.advance() {
                Some(Token::Field(name)) => Operand::Field(name),
                Some(Token::Literal(value)) => Operand::Literal(value),
                Some(token) => {
                    return Err(format!(
                        "expected a value after '{}' but found {}",
                        op,
                        token.describe()
                    ))
                }
                None => return Err(format!("expected a value after '{}'", op)),
            };
            return Ok(Expression::Comparison { left, op, right });
        }
        match left {
            Operand::Literal(AttributeValue::Boolean(value)) => Ok(Expression::Constant(value)),
            Operand::Field(_) => Ok(Expression::Truthy(left)),
            Operand::Literal(value) => Err(format!("expected a comparison after '{}'", value)),
        }
    }
}
