//! Predicate evaluation and ordering over in-memory rows.
//!
//! Evaluation follows SQL three-valued logic: a comparison against a missing
//! or NULL column is unknown (`None`), and only rows whose predicate is
//! `Some(true)` are returned.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use recordhub_query::{NullsOrder, Operator, OrderByExpr, Predicate, SortOrder, SqlValue, TsQuery};
use recordhub_storage::RawRow;
use serde_json::Value;

/// Whether `row` satisfies `predicate`.
pub fn matches(predicate: &Predicate, row: &RawRow) -> bool {
    evaluate(predicate, row) == Some(true)
}

/// Evaluate a predicate. `None` is SQL's unknown.
pub fn evaluate(predicate: &Predicate, row: &RawRow) -> Option<bool> {
    match predicate {
        Predicate::Compare { column, op, value } => {
            let cell = non_null(row, column)?;
            compare(cell, *op, value)
        }

        Predicate::In { column, values } => {
            if values.is_empty() {
                return Some(false);
            }
            let cell = non_null(row, column)?;
            let mut unknown = false;
            for value in values {
                match compare(cell, Operator::Eq, value) {
                    Some(true) => return Some(true),
                    None => unknown = true,
                    Some(false) => {}
                }
            }
            if unknown { None } else { Some(false) }
        }

        Predicate::IsNull { column, negated } => {
            let is_null = non_null(row, column).is_none();
            Some(is_null != *negated)
        }

        Predicate::ArrayOverlap { column, values } => {
            let items = non_null(row, column)?.as_array()?;
            Some(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|item| values.iter().any(|v| v == item)),
            )
        }

        Predicate::ArrayElementILike { column, pattern } => {
            let items = non_null(row, column)?.as_array()?;
            Some(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|item| like(item, pattern, true)),
            )
        }

        Predicate::TsMatch { column, query } => {
            let vector = lexemes(row, column)?;
            Some(TsQuery::parse(query).is_some_and(|q| q.matches(&vector)))
        }

        Predicate::And(children) => {
            let mut result = Some(true);
            for child in children {
                match evaluate(child, row) {
                    Some(false) => return Some(false),
                    None => result = None,
                    Some(true) => {}
                }
            }
            result
        }

        Predicate::Or(children) => {
            let mut result = Some(false);
            for child in children {
                match evaluate(child, row) {
                    Some(true) => return Some(true),
                    None => result = None,
                    Some(false) => {}
                }
            }
            result
        }

        Predicate::Not(child) => evaluate(child, row).map(|b| !b),
        Predicate::True => Some(true),
        Predicate::False => Some(false),
    }
}

fn non_null<'a>(row: &'a RawRow, column: &str) -> Option<&'a Value> {
    row.get(column).filter(|v| !v.is_null())
}

fn lexemes(row: &RawRow, column: &str) -> Option<Vec<String>> {
    let items = non_null(row, column)?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
    )
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn apply(ordering: Ordering, op: Operator) -> bool {
    match op {
        Operator::Eq => ordering == Ordering::Equal,
        Operator::Ne => ordering != Ordering::Equal,
        Operator::Gt => ordering == Ordering::Greater,
        Operator::Ge => ordering != Ordering::Less,
        Operator::Lt => ordering == Ordering::Less,
        Operator::Le => ordering != Ordering::Greater,
        Operator::Like | Operator::ILike => false,
    }
}

fn compare(cell: &Value, op: Operator, value: &SqlValue) -> Option<bool> {
    if matches!(op, Operator::Like | Operator::ILike) {
        let SqlValue::Text(pattern) = value else {
            return Some(false);
        };
        let text = cell.as_str()?;
        return Some(like(text, pattern, op == Operator::ILike));
    }

    let ordering = match value {
        SqlValue::Null => return None,
        SqlValue::Text(s) => cell.as_str()?.cmp(s.as_str()),
        SqlValue::Integer(i) => cell.as_f64()?.partial_cmp(&(*i as f64))?,
        SqlValue::Float(f) => cell.as_f64()?.partial_cmp(f)?,
        SqlValue::Boolean(b) => cell.as_bool()?.cmp(b),
        SqlValue::Uuid(u) => cell.as_str()?.to_ascii_lowercase().cmp(&u.to_string()),
        SqlValue::Timestamp(t) => parse_timestamp(cell.as_str()?)?.cmp(t),
        SqlValue::Json(v) => {
            if cell == v {
                Ordering::Equal
            } else {
                return Some(op == Operator::Ne);
            }
        }
        SqlValue::TextArray(items) => {
            let cells: Vec<&str> = cell.as_array()?.iter().filter_map(Value::as_str).collect();
            cells.cmp(&items.iter().map(String::as_str).collect::<Vec<_>>())
        }
    };

    Some(apply(ordering, op))
}

/// SQL LIKE with `%`, `_` and backslash escapes.
pub fn like(text: &str, pattern: &str, case_insensitive: bool) -> bool {
    let (text, pattern) = if case_insensitive {
        (text.to_lowercase(), pattern.to_lowercase())
    } else {
        (text.to_string(), pattern.to_string())
    };

    #[derive(Clone, Copy, PartialEq)]
    enum Token {
        Literal(char),
        AnyOne,
        AnyMany,
    }

    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '\\' => Token::Literal(chars.next().unwrap_or('\\')),
            '%' => Token::AnyMany,
            '_' => Token::AnyOne,
            c => Token::Literal(c),
        });
    }

    let text: Vec<char> = text.chars().collect();
    // dp[j]: pattern prefix of length j matches the text prefix consumed so far
    let mut dp = vec![false; tokens.len() + 1];
    dp[0] = true;
    for j in 1..=tokens.len() {
        dp[j] = dp[j - 1] && tokens[j - 1] == Token::AnyMany;
    }

    for c in text {
        let mut next = vec![false; tokens.len() + 1];
        for j in 1..=tokens.len() {
            next[j] = match tokens[j - 1] {
                Token::AnyMany => next[j - 1] || dp[j],
                Token::AnyOne => dp[j - 1],
                Token::Literal(l) => dp[j - 1] && l == c,
            };
        }
        dp = next;
    }

    dp[tokens.len()]
}

fn compare_cells(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => match (parse_timestamp(x), parse_timestamp(y)) {
            (Some(tx), Some(ty)) => tx.cmp(&ty),
            _ => x.cmp(y),
        },
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn rank(row: &RawRow, column: &str, query: &str) -> f64 {
    match (lexemes(row, column), TsQuery::parse(query)) {
        (Some(vector), Some(q)) => q.rank(&vector),
        _ => 0.0,
    }
}

fn directed(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

/// Compare two rows by an ORDER BY list.
pub fn compare_rows(order_by: &[OrderByExpr], a: &RawRow, b: &RawRow) -> Ordering {
    for expr in order_by {
        let ordering = match expr {
            OrderByExpr::Column {
                column,
                order,
                nulls,
            } => match (non_null(a, column), non_null(b, column)) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => match nulls {
                    NullsOrder::First => Ordering::Less,
                    NullsOrder::Last => Ordering::Greater,
                },
                (Some(_), None) => match nulls {
                    NullsOrder::First => Ordering::Greater,
                    NullsOrder::Last => Ordering::Less,
                },
                (Some(x), Some(y)) => directed(compare_cells(x, y), *order),
            },
            OrderByExpr::TsRankCd {
                column,
                query,
                order,
            }
            | OrderByExpr::TsRank {
                column,
                query,
                order,
            } => directed(
                rank(a, column, query)
                    .partial_cmp(&rank(b, column, query))
                    .unwrap_or(Ordering::Equal),
                *order,
            ),
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> RawRow {
        match value {
            Value::Object(map) => map,
            _ => RawRow::new(),
        }
    }

    fn text(s: &str) -> SqlValue {
        SqlValue::Text(s.to_string())
    }

    #[test]
    fn test_like_patterns() {
        assert!(like("Paris", "Par%", false));
        assert!(!like("Paris", "par%", false));
        assert!(like("Paris", "par%", true));
        assert!(like("Paris", "P_ris", false));
        assert!(like("50%", "50\\%", false));
        assert!(!like("500", "50\\%", false));
        assert!(like("", "%", false));
    }

    #[test]
    fn test_null_comparison_is_unknown() {
        let r = row(json!({"city": null}));
        let eq = Predicate::compare("city", Operator::Eq, text("Paris"));
        assert_eq!(evaluate(&eq, &r), None);
        assert!(!matches(&Predicate::negate(eq), &r));
        assert!(matches(&Predicate::is_null("city"), &r));
        assert!(matches(&Predicate::is_null("missing"), &r));
    }

    #[test]
    fn test_three_valued_or() {
        let r = row(json!({"city": null, "age": 30}));
        let predicate = Predicate::or(vec![
            Predicate::compare("city", Operator::Eq, text("Paris")),
            Predicate::compare("age", Operator::Gt, SqlValue::Integer(18)),
        ]);
        assert!(matches(&predicate, &r));
    }

    #[test]
    fn test_numeric_and_timestamp_comparisons() {
        let r = row(json!({"age": 30.5, "createdAt": "2024-05-01T10:00:00.000Z"}));
        assert!(matches(
            &Predicate::compare("age", Operator::Ge, SqlValue::Integer(30)),
            &r
        ));
        let cutoff = parse_timestamp("2024-04-30T00:00:00Z").unwrap();
        assert!(matches(
            &Predicate::compare("createdAt", Operator::Gt, SqlValue::Timestamp(cutoff)),
            &r
        ));
    }

    #[test]
    fn test_uuid_and_in() {
        let id = uuid::Uuid::new_v4();
        let r = row(json!({"id": id.to_string()}));
        assert!(matches(
            &Predicate::in_values("id", vec![SqlValue::Uuid(id)]),
            &r
        ));
        assert!(!matches(&Predicate::in_values("id", vec![]), &r));
    }

    #[test]
    fn test_array_predicates() {
        let r = row(json!({"tags": ["vip", "lead"]}));
        assert!(matches(
            &Predicate::ArrayOverlap {
                column: "tags".into(),
                values: vec!["lead".into(), "x".into()],
            },
            &r
        ));
        assert!(matches(
            &Predicate::ArrayElementILike {
                column: "tags".into(),
                pattern: "%V%".into(),
            },
            &r
        ));
    }

    #[test]
    fn test_ts_match() {
        let r = row(json!({"searchVector": ["john", "doe"]}));
        let hit = Predicate::TsMatch {
            column: "searchVector".into(),
            query: "jo:* & do:*".into(),
        };
        let miss = Predicate::TsMatch {
            column: "searchVector".into(),
            query: "jane:*".into(),
        };
        assert!(matches(&hit, &r));
        assert!(!matches(&miss, &r));
    }

    #[test]
    fn test_compare_rows_nulls_and_direction() {
        let a = row(json!({"name": "a"}));
        let b = row(json!({"name": "b"}));
        let n = row(json!({"name": null}));

        let asc = [OrderByExpr::asc("name")];
        assert_eq!(compare_rows(&asc, &a, &b), Ordering::Less);
        assert_eq!(compare_rows(&asc, &n, &a), Ordering::Greater);

        let desc_nulls_last = [OrderByExpr::Column {
            column: "name".into(),
            order: SortOrder::Desc,
            nulls: NullsOrder::Last,
        }];
        assert_eq!(compare_rows(&desc_nulls_last, &a, &b), Ordering::Greater);
        assert_eq!(compare_rows(&desc_nulls_last, &n, &b), Ordering::Greater);
    }
}
