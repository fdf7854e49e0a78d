//! Query language: simple terms, left-to-right boolean expressions with
//! parenthesized grouping, and two-term proximity (`a b /k`).

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

/// Deepest parenthesis nesting accepted by the parser.
pub const MAX_GROUP_DEPTH: usize = 256;

lazy_static! {
    static ref PROXIMITY: Regex = Regex::new(r"^\s*(.*?)\s+/\s*(\d+)\s*$").expect("valid regex");
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("empty query")]
    EmptyQuery,
    #[error("invalid proximity query format, use 'term1 term2 /k'")]
    MalformedProximity,
    #[error("proximity query supports exactly 2 terms, got {0}")]
    ProximityTermCount(usize),
    #[error("unbalanced parenthesis at offset {0}")]
    UnbalancedParenthesis(usize),
    /// Operators are strictly binary, so `NOT` needs a left operand even at the
    /// start of a group: `deep OR (NOT image)` is rejected here, whereas a plain
    /// split on ` NOT ` would have looked up `NOT image` as an unknown term.
    #[error("operator {0} is missing an operand")]
    MissingOperand(Op),
    #[error("expected an operator before {0:?}")]
    ExpectedOperator(String),
    #[error("parentheses nested deeper than {0} levels")]
    TooDeep(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    And,
    Or,
    Not,
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Op::And => "AND",
            Op::Or => "OR",
            Op::Not => "NOT",
        })
    }
}

/// Parsed query tree. Terms hold the raw operand text; normalization happens
/// at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Term(String),
    /// `first op1 e1 op2 e2 ...`, applied to a running result from left to
    /// right. `NOT` is set difference.
    Chain { first: Box<Expr>, rest: Vec<(Op, Expr)> },
    Proximity { left: String, right: String, distance: u32 },
    Group(Box<Expr>),
}

/// Classify and parse a raw query string. Proximity wins over boolean, which
/// wins over a simple term.
pub fn parse_query(input: &str) -> Result<Expr, QueryError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(QueryError::EmptyQuery);
    }
    if trimmed.contains('/') {
        return parse_proximity(trimmed);
    }
    let tokens = lex(trimmed)?;
    let is_boolean = tokens.iter().any(|t| !matches!(t, Token::Word(_)));
    if !is_boolean {
        return Ok(Expr::Term(trimmed.to_string()));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_sequence()?;
    match parser.peek() {
        None => Ok(expr),
        Some(other) => Err(QueryError::ExpectedOperator(other.to_string())),
    }
}

fn parse_proximity(input: &str) -> Result<Expr, QueryError> {
    let caps = PROXIMITY.captures(input).ok_or(QueryError::MalformedProximity)?;
    let terms: Vec<&str> = caps[1].split_whitespace().collect();
    if terms.len() != 2 {
        return Err(QueryError::ProximityTermCount(terms.len()));
    }
    if terms.iter().any(|t| t.contains('/')) {
        return Err(QueryError::MalformedProximity);
    }
    let distance = caps[2].parse().map_err(|_| QueryError::MalformedProximity)?;
    Ok(Expr::Proximity { left: terms[0].to_string(), right: terms[1].to_string(), distance })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Op(Op),
    Open(usize),
    Close(usize),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Word(w) => f.write_str(w),
            Token::Op(op) => op.fmt(f),
            Token::Open(_) => f.write_str("("),
            Token::Close(_) => f.write_str(")"),
        }
    }
}

fn word_token(word: &str) -> Token {
    match word {
        "AND" => Token::Op(Op::And),
        "OR" => Token::Op(Op::Or),
        "NOT" => Token::Op(Op::Not),
        _ => Token::Word(word.to_string()),
    }
}

fn lex(input: &str) -> Result<Vec<Token>, QueryError> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut word_start: Option<usize> = None;
    for (i, c) in input.char_indices() {
        if c == '(' || c == ')' || c.is_whitespace() {
            if let Some(start) = word_start.take() {
                tokens.push(word_token(&input[start..i]));
            }
        } else if word_start.is_none() {
            word_start = Some(i);
        }
        match c {
            '(' => {
                depth += 1;
                if depth > MAX_GROUP_DEPTH {
                    return Err(QueryError::TooDeep(MAX_GROUP_DEPTH));
                }
                tokens.push(Token::Open(i));
            }
            ')' => {
                if depth == 0 {
                    return Err(QueryError::UnbalancedParenthesis(i));
                }
                depth -= 1;
                tokens.push(Token::Close(i));
            }
            _ => {}
        }
    }
    if let Some(start) = word_start {
        tokens.push(word_token(&input[start..]));
    }
    if depth > 0 {
        let offset = tokens
            .iter()
            .rev()
            .find_map(|t| match t {
                Token::Open(i) => Some(*i),
                _ => None,
            })
            .unwrap_or(0);
        return Err(QueryError::UnbalancedParenthesis(offset));
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> { self.tokens.get(self.pos) }

    /// `operand (op operand)*`, folded strictly left to right.
    fn parse_sequence(&mut self) -> Result<Expr, QueryError> {
        let first = match self.peek() {
            Some(Token::Op(op)) => return Err(QueryError::MissingOperand(*op)),
            _ => self.parse_operand(None)?,
        };
        let mut rest = Vec::new();
        while let Some(Token::Op(op)) = self.peek() {
            let op = *op;
            self.pos += 1;
            rest.push((op, self.parse_operand(Some(op))?));
        }
        if rest.is_empty() {
            return Ok(first);
        }
        Ok(Expr::Chain { first: Box::new(first), rest })
    }

    fn parse_operand(&mut self, after: Option<Op>) -> Result<Expr, QueryError> {
        let missing = || match after {
            Some(op) => QueryError::MissingOperand(op),
            None => QueryError::EmptyQuery,
        };
        match self.peek() {
            Some(Token::Open(_)) => {
                self.pos += 1;
                if let Some(Token::Close(_)) = self.peek() {
                    return Err(missing());
                }
                let inner = self.parse_sequence()?;
                match self.peek() {
                    Some(Token::Close(_)) => {
                        self.pos += 1;
                        Ok(Expr::Group(Box::new(inner)))
                    }
                    Some(other) => Err(QueryError::ExpectedOperator(other.to_string())),
                    None => Err(QueryError::UnbalancedParenthesis(self.tokens.len())),
                }
            }
            Some(Token::Word(_)) => {
                let mut words = Vec::new();
                while let Some(Token::Word(w)) = self.peek() {
                    words.push(w.clone());
                    self.pos += 1;
                }
                Ok(Expr::Term(words.join(" ")))
            }
            _ => Err(missing()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(s: &str) -> Expr { Expr::Term(s.into()) }

    fn chain(first: Expr, rest: Vec<(Op, Expr)>) -> Expr { Expr::Chain { first: Box::new(first), rest } }

    fn group(inner: Expr) -> Expr { Expr::Group(Box::new(inner)) }

    #[test]
    fn plain_text_is_a_single_term() {
        assert_eq!(parse_query("  Autoencoders ").unwrap(), Expr::Term("Autoencoders".into()));
        assert_eq!(parse_query("deep learning").unwrap(), Expr::Term("deep learning".into()));
    }

    #[test]
    fn operators_fold_left_without_precedence() {
        let parsed = parse_query("a OR b AND c").unwrap();
        assert_eq!(parsed, chain(term("a"), vec![(Op::Or, term("b")), (Op::And, term("c"))]));
    }

    #[test]
    fn lowercase_operators_are_plain_words() {
        assert_eq!(parse_query("rock and roll").unwrap(), Expr::Term("rock and roll".into()));
    }

    #[test]
    fn groups_become_subtrees() {
        let parsed = parse_query("x AND (y OR (z NOT w))").unwrap();
        let inner = group(chain(term("z"), vec![(Op::Not, term("w"))]));
        let outer = group(chain(term("y"), vec![(Op::Or, inner)]));
        assert_eq!(parsed, chain(term("x"), vec![(Op::And, outer)]));
    }

    #[test]
    fn proximity_needs_exactly_two_terms() {
        assert_eq!(
            parse_query("neural information /2").unwrap(),
            Expr::Proximity { left: "neural".into(), right: "information".into(), distance: 2 }
        );
        assert_eq!(parse_query("a b c /2"), Err(QueryError::ProximityTermCount(3)));
        assert_eq!(parse_query("a/b"), Err(QueryError::MalformedProximity));
        assert_eq!(parse_query("a b /x"), Err(QueryError::MalformedProximity));
    }

    #[test]
    fn leading_not_has_no_left_operand() {
        assert_eq!(parse_query("NOT deep"), Err(QueryError::MissingOperand(Op::Not)));
        assert_eq!(parse_query("deep AND"), Err(QueryError::MissingOperand(Op::And)));
        assert_eq!(parse_query("deep OR (NOT image)"), Err(QueryError::MissingOperand(Op::Not)));
    }

    #[test]
    fn long_chains_stay_flat() {
        let query = vec!["deep"; 100_000].join(" AND ");
        let Expr::Chain { first, rest } = parse_query(&query).unwrap() else {
            panic!("expected a chain");
        };
        assert_eq!(*first, term("deep"));
        assert_eq!(rest.len(), 99_999);
        assert!(rest.iter().all(|(op, e)| *op == Op::And && *e == term("deep")));
    }

    #[test]
    fn nesting_depth_is_bounded() {
        let at_limit = format!("{}a OR b{}", "(".repeat(MAX_GROUP_DEPTH), ")".repeat(MAX_GROUP_DEPTH));
        assert!(parse_query(&at_limit).is_ok());

        let too_deep = format!("{}a OR b{}", "(".repeat(20_000), ")".repeat(20_000));
        assert_eq!(parse_query(&too_deep), Err(QueryError::TooDeep(MAX_GROUP_DEPTH)));
    }

    #[test]
    fn unbalanced_parentheses_are_reported() {
        assert!(matches!(parse_query("(a AND b"), Err(QueryError::UnbalancedParenthesis(0))));
        assert!(matches!(parse_query("a AND b)"), Err(QueryError::UnbalancedParenthesis(7))));
        assert!(matches!(parse_query("a AND ()"), Err(QueryError::MissingOperand(Op::And))));
        assert_eq!(parse_query("(a) b"), Err(QueryError::ExpectedOperator("b".into())));
    }
}
