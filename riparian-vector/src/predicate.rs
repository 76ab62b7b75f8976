//! Attribute predicate expressions in the SQL-subset the original selection
//! clauses used: comparisons (`=`, `<>`, `<`, `<=`, `>`, `>=`), `IN (...)`
//! lists, `AND`/`OR`, and parentheses. String literals use single quotes.
//! Null values never satisfy a comparison.

use crate::attributes::FieldData;
use crate::collection::FeatureCollection;
use crate::VectorError;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(f64),
    Op(CmpOp),
    In,
    And,
    Or,
    LParen,
    RParen,
    Comma,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
enum Literal {
    Num(f64),
    Str(String),
}

#[derive(Debug, Clone)]
enum Expr {
    Cmp {
        field: String,
        op: CmpOp,
        literal: Literal,
    },
    In {
        field: String,
        list: Vec<Literal>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone)]
pub struct Predicate {
    expr: Expr,
    text: String,
}

fn tokenize(text: &str) -> Result<Vec<Token>, VectorError> {
    let bad = |msg: String| VectorError::Predicate(msg);
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\r' | '\n' => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '=' => {
                tokens.push(Token::Op(CmpOp::Eq));
                i += 1;
            }
            '<' => {
                if i + 1 < chars.len() && chars[i + 1] == '>' {
                    tokens.push(Token::Op(CmpOp::Ne));
                    i += 2;
                } else if i + 1 < chars.len() && chars[i + 1] == '=' {
                    tokens.push(Token::Op(CmpOp::Le));
                    i += 2;
                } else {
                    tokens.push(Token::Op(CmpOp::Lt));
                    i += 1;
                }
            }
            '>' => {
                if i + 1 < chars.len() && chars[i + 1] == '=' {
                    tokens.push(Token::Op(CmpOp::Ge));
                    i += 2;
                } else {
                    tokens.push(Token::Op(CmpOp::Gt));
                    i += 1;
                }
            }
            '\'' => {
                let mut s = String::new();
                i += 1;
                loop {
                    if i >= chars.len() {
                        return Err(bad("unterminated string literal".to_string()));
                    }
                    if chars[i] == '\'' {
                        // Doubled quote escapes a quote, SQL style.
                        if i + 1 < chars.len() && chars[i + 1] == '\'' {
                            s.push('\'');
                            i += 2;
                        } else {
                            i += 1;
                            break;
                        }
                    } else {
                        s.push(chars[i]);
                        i += 1;
                    }
                }
                tokens.push(Token::Str(s));
            }
            _ if c.is_ascii_digit() || c == '-' || c == '.' => {
                let start = i;
                i += 1;
                while i < chars.len()
                    && (chars[i].is_ascii_digit() || chars[i] == '.' || chars[i] == 'e'
                        || chars[i] == 'E' || chars[i] == '+' || chars[i] == '-')
                {
                    i += 1;
                }
                let num_text: String = chars[start..i].iter().collect();
                let value = num_text
                    .parse::<f64>()
                    .map_err(|_| bad(format!("invalid number '{}'", num_text)))?;
                tokens.push(Token::Num(value));
            }
            _ if c.is_alphanumeric() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                match word.to_uppercase().as_str() {
                    "AND" => tokens.push(Token::And),
                    "OR" => tokens.push(Token::Or),
                    "IN" => tokens.push(Token::In),
                    _ => tokens.push(Token::Ident(word)),
                }
            }
            _ => return Err(bad(format!("unexpected character '{}'", c))),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn parse_or(&mut self) -> Result<Expr, VectorError> {
        let mut left = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.next();
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, VectorError> {
        let mut left = self.parse_primary()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.next();
            let right = self.parse_primary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_literal(&mut self) -> Result<Literal, VectorError> {
        match self.next() {
            Some(Token::Num(v)) => Ok(Literal::Num(v)),
            Some(Token::Str(s)) => Ok(Literal::Str(s)),
            other => Err(VectorError::Predicate(format!(
                "expected literal, found {:?}",
                other
            ))),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, VectorError> {
        match self.next() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(VectorError::Predicate("expected ')'".to_string())),
                }
            }
            Some(Token::Ident(field)) => match self.next() {
                Some(Token::Op(op)) => {
                    let literal = self.parse_literal()?;
                    Ok(Expr::Cmp { field, op, literal })
                }
                Some(Token::In) => {
                    if !matches!(self.next(), Some(Token::LParen)) {
                        return Err(VectorError::Predicate(
                            "expected '(' after IN".to_string(),
                        ));
                    }
                    let mut list = vec![self.parse_literal()?];
                    loop {
                        match self.next() {
                            Some(Token::Comma) => list.push(self.parse_literal()?),
                            Some(Token::RParen) => break,
                            other => {
                                return Err(VectorError::Predicate(format!(
                                    "expected ',' or ')' in IN list, found {:?}",
                                    other
                                )))
                            }
                        }
                    }
                    Ok(Expr::In { field, list })
                }
                other => Err(VectorError::Predicate(format!(
                    "expected comparison after '{}', found {:?}",
                    field, other
                ))),
            },
            other => Err(VectorError::Predicate(format!(
                "unexpected token {:?}",
                other
            ))),
        }
    }
}

fn compare(value: &FieldData, op: CmpOp, literal: &Literal) -> bool {
    if value.is_null() {
        return false;
    }
    match literal {
        Literal::Num(lit) => match value.as_f64() {
            Some(v) => match op {
                CmpOp::Eq => v == *lit,
                CmpOp::Ne => v != *lit,
                CmpOp::Lt => v < *lit,
                CmpOp::Le => v <= *lit,
                CmpOp::Gt => v > *lit,
                CmpOp::Ge => v >= *lit,
            },
            None => false,
        },
        Literal::Str(lit) => match value.as_text() {
            Some(v) => match op {
                CmpOp::Eq => v == lit.as_str(),
                CmpOp::Ne => v != lit.as_str(),
                CmpOp::Lt => v < lit.as_str(),
                CmpOp::Le => v <= lit.as_str(),
                CmpOp::Gt => v > lit.as_str(),
                CmpOp::Ge => v >= lit.as_str(),
            },
            None => false,
        },
    }
}

impl Predicate {
    pub fn parse(text: &str) -> Result<Predicate, VectorError> {
        let tokens = tokenize(text)?;
        if tokens.is_empty() {
            return Err(VectorError::Predicate("empty predicate".to_string()));
        }
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.parse_or()?;
        if parser.pos != parser.tokens.len() {
            return Err(VectorError::Predicate(format!(
                "trailing input in predicate '{}'",
                text
            )));
        }
        Ok(Predicate {
            expr,
            text: text.to_string(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn matches(&self, fc: &FeatureCollection, record: usize) -> Result<bool, VectorError> {
        fn eval(
            expr: &Expr,
            fc: &FeatureCollection,
            record: usize,
        ) -> Result<bool, VectorError> {
            match expr {
                Expr::Cmp { field, op, literal } => {
                    let idx = fc.require_field(field)?;
                    Ok(compare(fc.value(record, idx), *op, literal))
                }
                Expr::In { field, list } => {
                    let idx = fc.require_field(field)?;
                    Ok(list
                        .iter()
                        .any(|lit| compare(fc.value(record, idx), CmpOp::Eq, lit)))
                }
                Expr::And(a, b) => Ok(eval(a, fc, record)? && eval(b, fc, record)?),
                Expr::Or(a, b) => Ok(eval(a, fc, record)? || eval(b, fc, record)?),
            }
        }
        eval(&self.expr, fc, record)
    }
}

/// Attribute-predicate select: a new collection holding the matching
/// records in their original order.
pub fn select(
    fc: &FeatureCollection,
    predicate: &Predicate,
) -> Result<FeatureCollection, VectorError> {
    let mut out = FeatureCollection::new(fc.fields.clone());
    for i in 0..fc.len() {
        if predicate.matches(fc, i)? {
            out.features.push(fc.features[i].clone());
        }
    }
    Ok(out)
}
