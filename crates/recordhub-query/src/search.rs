//! Full-text search predicates.
//!
//! A raw search string is normalized into two `to_tsquery('simple', ...)`
//! expressions: an AND form that requires every word and an OR form that
//! accepts any of them. Rows match when either form matches; ranking prefers
//! AND-form relevance, then OR-form relevance.
//!
//! [`TsQuery`] evaluates the same expressions against a lexeme list, for
//! backends without a native `tsvector`.

use recordhub_core::{ObjectMetadataItem, SEARCH_VECTOR_FIELD};

use crate::filter::FilterError;
use crate::sql_builder::{OrderByExpr, Predicate, SelectQuery, SortOrder};

const ESCAPED_CHARS: &[char] = &['\\', ':', '\'', '&', '|', '!', '(', ')', '@', '<', '>'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOperator {
    And,
    Or,
}

impl SearchOperator {
    fn separator(self) -> &'static str {
        match self {
            Self::And => " & ",
            Self::Or => " | ",
        }
    }
}

/// Turn user input into a prefix-matching tsquery expression.
///
/// `"john d'oe"` becomes `john:* & d\'oe:*` with [`SearchOperator::And`].
pub fn format_search_terms(input: &str, operator: SearchOperator) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut escaped = String::with_capacity(word.len() + 2);
            for c in word.chars() {
                if ESCAPED_CHARS.contains(&c) {
                    escaped.push('\\');
                }
                escaped.push(c);
            }
            escaped.push_str(":*");
            escaped
        })
        .collect::<Vec<_>>()
        .join(operator.separator())
}

/// The AND and OR forms of one search input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerms {
    pub and_terms: String,
    pub or_terms: String,
}

impl SearchTerms {
    /// `None` for empty or whitespace-only input.
    pub fn from_input(input: &str) -> Option<Self> {
        if input.trim().is_empty() {
            return None;
        }
        Some(Self {
            and_terms: format_search_terms(input, SearchOperator::And),
            or_terms: format_search_terms(input, SearchOperator::Or),
        })
    }

    /// Rows whose search vector matches either form.
    pub fn predicate(&self) -> Predicate {
        Predicate::or(vec![
            Predicate::TsMatch {
                column: SEARCH_VECTOR_FIELD.to_string(),
                query: self.and_terms.clone(),
            },
            Predicate::TsMatch {
                column: SEARCH_VECTOR_FIELD.to_string(),
                query: self.or_terms.clone(),
            },
        ])
    }

    /// `ts_rank_cd` over the AND form, then `ts_rank` over the OR form, both descending.
    pub fn ranking(&self) -> [OrderByExpr; 2] {
        [
            OrderByExpr::TsRankCd {
                column: SEARCH_VECTOR_FIELD.to_string(),
                query: self.and_terms.clone(),
                order: SortOrder::Desc,
            },
            OrderByExpr::TsRank {
                column: SEARCH_VECTOR_FIELD.to_string(),
                query: self.or_terms.clone(),
                order: SortOrder::Desc,
            },
        ]
    }
}

/// Restrict and rank `query` by `terms`.
pub fn apply_search_to_builder(
    query: &mut SelectQuery,
    terms: &SearchTerms,
    object: &ObjectMetadataItem,
) -> Result<(), FilterError> {
    if !object.has_search_vector() {
        return Err(FilterError::NotSearchable(object.name_singular.clone()));
    }
    query.and_where(terms.predicate());
    for order in terms.ranking() {
        query.push_order_by(order);
    }
    Ok(())
}

/// Lexemes of `text` under the `simple` configuration: lowercased alphanumeric words.
pub fn to_tsvector(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

// ============================================================================
// tsquery evaluation
// ============================================================================

/// A parsed tsquery expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TsQuery {
    Term { lexemes: Vec<String>, prefix: bool },
    And(Box<TsQuery>, Box<TsQuery>),
    Or(Box<TsQuery>, Box<TsQuery>),
    Not(Box<TsQuery>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String, bool),
    And,
    Or,
    Not,
    Open,
    Close,
}

fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '&' => {
                chars.next();
                tokens.push(Token::And);
            }
            '|' => {
                chars.next();
                tokens.push(Token::Or);
            }
            '!' => {
                chars.next();
                tokens.push(Token::Not);
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            _ => {
                let mut word = String::new();
                let mut prefix = false;
                while let Some(&c) = chars.peek() {
                    match c {
                        '\\' => {
                            chars.next();
                            if let Some(escaped) = chars.next() {
                                word.push(escaped);
                            }
                        }
                        ':' => {
                            chars.next();
                            // Weight/prefix labels, e.g. `:*` or `:AB*`.
                            while let Some(&label) = chars.peek() {
                                if label == '*' {
                                    prefix = true;
                                } else if !label.is_ascii_alphabetic() {
                                    break;
                                }
                                chars.next();
                            }
                        }
                        c if c.is_whitespace() || "&|!()".contains(c) => break,
                        c => {
                            word.push(c);
                            chars.next();
                        }
                    }
                }
                tokens.push(Token::Word(word, prefix));
            }
        }
    }

    tokens
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
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn parse_or(&mut self) -> Option<TsQuery> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.next();
            let right = self.parse_and()?;
            left = TsQuery::Or(Box::new(left), Box::new(right));
        }
        Some(left)
    }

    fn parse_and(&mut self) -> Option<TsQuery> {
        let mut left = self.parse_unary()?;
        while self.peek() == Some(&Token::And) {
            self.next();
            let right = self.parse_unary()?;
            left = TsQuery::And(Box::new(left), Box::new(right));
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> Option<TsQuery> {
        match self.next()? {
            Token::Not => Some(TsQuery::Not(Box::new(self.parse_unary()?))),
            Token::Open => {
                let inner = self.parse_or()?;
                match self.next()? {
                    Token::Close => Some(inner),
                    _ => None,
                }
            }
            Token::Word(word, prefix) => Some(TsQuery::Term {
                lexemes: to_tsvector(&word),
                prefix,
            }),
            Token::And | Token::Or | Token::Close => None,
        }
    }
}

impl TsQuery {
    /// Parse a tsquery expression. `None` when the expression is malformed.
    pub fn parse(input: &str) -> Option<Self> {
        let mut parser = Parser {
            tokens: tokenize(input),
            pos: 0,
        };
        let query = parser.parse_or()?;
        (parser.pos == parser.tokens.len()).then_some(query)
    }

    fn term_matches(lexeme: &str, candidate: &str, prefix: bool) -> bool {
        if prefix {
            candidate.starts_with(lexeme)
        } else {
            candidate == lexeme
        }
    }

    pub fn matches(&self, vector: &[String]) -> bool {
        match self {
            // A word that normalizes to several lexemes requires all of them.
            Self::Term { lexemes, prefix } => {
                !lexemes.is_empty()
                    && lexemes.iter().all(|l| {
                        vector
                            .iter()
                            .any(|candidate| Self::term_matches(l, candidate, *prefix))
                    })
            }
            Self::And(left, right) => left.matches(vector) && right.matches(vector),
            Self::Or(left, right) => left.matches(vector) || right.matches(vector),
            Self::Not(inner) => !inner.matches(vector),
        }
    }

    /// Relevance: matched lexeme occurrences relative to vector length.
    pub fn rank(&self, vector: &[String]) -> f64 {
        if vector.is_empty() || !self.matches(vector) {
            return 0.0;
        }
        let hits = self.hits(vector) as f64;
        hits / (1.0 + (vector.len() as f64).ln())
    }

    fn hits(&self, vector: &[String]) -> usize {
        match self {
            Self::Term { lexemes, prefix } => lexemes
                .iter()
                .map(|l| {
                    vector
                        .iter()
                        .filter(|candidate| Self::term_matches(l, candidate, *prefix))
                        .count()
                })
                .sum(),
            Self::And(left, right) | Self::Or(left, right) => {
                left.hits(vector) + right.hits(vector)
            }
            Self::Not(_) => 0,
        }
    }
}
