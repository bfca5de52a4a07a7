// TermiBase
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use super::facts::{JoinInfo, JoinType, QueryFacts, QueryType};
use super::scanner::{Span, depth_at_end, mask};

static LEADING_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\s(]*([A-Za-z_]+)").expect("leading word pattern"));
static FROM_TARGET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?i)\bFROM\s+["`\[]?(\w+)"#).expect("from pattern"));
static FROM_KEYWORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bFROM\b").expect("from keyword pattern"));
static JOIN_KEYWORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bJOIN\b").expect("join keyword pattern"));
static JOIN_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:\b(INNER|LEFT|RIGHT|FULL|OUTER|CROSS|NATURAL)\s+(?:OUTER\s+)?)?\bJOIN\s+["`\[]?(\w+)"#).expect("join pattern")
});
static INSERT_TARGET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?i)\bINSERT\s+(?:OR\s+\w+\s+)?INTO\s+["`\[]?(\w+)"#).expect("insert pattern"));
static UPDATE_TARGET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?i)\bUPDATE\s+(?:OR\s+\w+\s+)?["`\[]?(\w+)"#).expect("update pattern"));
static DELETE_TARGET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?i)\bDELETE\s+FROM\s+["`\[]?(\w+)"#).expect("delete pattern"));
static SELECT_KEYWORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bSELECT\b").expect("select pattern"));
static WHERE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bWHERE\b").expect("where pattern"));
static WHERE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(?:GROUP|ORDER|HAVING|LIMIT)\b").expect("where end pattern"));
static AND_OR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s+(?:AND|OR)\s+").expect("and/or pattern"));
static GROUP_BY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bGROUP\s+BY\b").expect("group by pattern"));
static GROUP_BY_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(?:ORDER|HAVING|LIMIT|OFFSET)\b").expect("group by end pattern"));
static ORDER_BY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bORDER\s+BY\b").expect("order by pattern"));
static ORDER_BY_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(?:LIMIT|OFFSET|GROUP|HAVING)\b").expect("order by end pattern"));
static LIMIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bLIMIT\s+(\d+)").expect("limit pattern"));
static AS_ALIAS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s+AS\s+").expect("alias pattern"));
static PROJECTION_MODIFIER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^(?:DISTINCT|ALL)\b\s*").expect("modifier pattern"));
static BARE_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"^["`\[]?\w+["`\]]?$"#).expect("identifier pattern"));

/// Words that close an expression and must not be read as a bare alias.
const NON_ALIAS_WORDS: &[&str] = &["END", "NULL", "TRUE", "FALSE", "AND", "OR", "NOT", "THEN", "ELSE", "DESC", "ASC"];

/// Extracts structural facts from one SQL statement without executing it.
///
/// Every operation is best effort. Unrecognized or half-typed SQL produces
/// empty or default results instead of an error, so the analyzer can follow a
/// query while it is still being written.
pub struct QueryAnalyzer<'q> {
    query: &'q str,
    masked: String,
    query_type: QueryType,
}

impl<'q> QueryAnalyzer<'q> {
    pub fn new(query: &'q str) -> Self {
        let query = query.trim().trim_end_matches(';').trim_end();
        let masked = mask(query);
        let query_type = LEADING_WORD
            .captures(&masked)
            .and_then(|c| c.get(1))
            .map(|m| QueryType::from_keyword(m.as_str()))
            .unwrap_or_default();

        Self { query, masked, query_type }
    }

    pub fn get_query_type(&self) -> QueryType {
        self.query_type
    }

    /// Tables named after FROM, JOIN and the write keyword of the statement.
    pub fn get_tables(&self) -> Vec<String> {
        let mut tables = BTreeSet::new();

        if let Some(table) = self.from_target() {
            tables.insert(table);
        }

        for join in self.get_join_info() {
            tables.insert(join.table);
        }

        if let Some(target) = self.get_target() {
            tables.insert(target);
        }

        tables.into_iter().collect()
    }

    /// Table written by INSERT INTO, UPDATE or DELETE FROM.
    pub fn get_target(&self) -> Option<String> {
        let pattern = match self.query_type {
            QueryType::Insert => &*INSERT_TARGET,
            QueryType::Update => &*UPDATE_TARGET,
            QueryType::Delete => &*DELETE_TARGET,
            _ => return None,
        };

        pattern.captures(&self.masked).and_then(|c| c.get(1)).map(|m| m.as_str().to_lowercase())
    }

    /// Projected expressions of a SELECT, aliases removed.
    pub fn get_columns(&self) -> Vec<String> {
        if self.query_type != QueryType::Select {
            return Vec::new();
        }

        let Some(projection) = self.projection() else {
            return Vec::new();
        };

        let projection = projection.trim();
        if projection.original == "*" {
            return vec!["*".to_string()];
        }

        projection.split_top_level(',').into_iter().filter_map(base_expression).collect()
    }

    /// Predicate fragments of the WHERE clause, split on AND/OR.
    ///
    /// The split is textual: parentheses are not balanced, so a grouped
    /// `(a OR b) AND c` yields `["(a", "b)", "c"]`.
    pub fn get_where_conditions(&self) -> Vec<String> {
        let Some(clause) = self.clause(&WHERE_KEYWORD, &WHERE_END) else {
            return Vec::new();
        };

        clause
            .split_on(&AND_OR)
            .into_iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_blank())
            .map(|part| part.original.to_string())
            .collect()
    }

    pub fn has_joins(&self) -> bool {
        JOIN_KEYWORD.is_match(&self.masked)
    }

    pub fn get_join_info(&self) -> Vec<JoinInfo> {
        JOIN_TARGET
            .captures_iter(&self.masked)
            .filter_map(|c| {
                let table = c.get(2)?.as_str().to_lowercase();
                let join_type = JoinType::from_qualifier(c.get(1).map(|m| m.as_str()));
                Some(JoinInfo { join_type, table })
            })
            .collect()
    }

    pub fn get_group_by(&self) -> Vec<String> {
        self.clause_columns(&GROUP_BY, &GROUP_BY_END)
    }

    pub fn get_order_by(&self) -> Vec<String> {
        self.clause_columns(&ORDER_BY, &ORDER_BY_END)
    }

    pub fn get_limit(&self) -> Option<u64> {
        LIMIT.captures(&self.masked).and_then(|c| c.get(1)).and_then(|m| m.as_str().parse().ok())
    }

    pub fn analyze(&self) -> QueryFacts {
        QueryFacts {
            query_type: self.get_query_type(),
            tables: self.get_tables(),
            columns: self.get_columns(),
            where_conditions: self.get_where_conditions(),
            has_joins: self.has_joins(),
            joins: self.get_join_info(),
            group_by: self.get_group_by(),
            order_by: self.get_order_by(),
            limit: self.get_limit(),
            target: self.get_target(),
        }
    }

    fn span(&self, start: usize, end: usize) -> Option<Span<'_>> {
        Span::slice(self.query, &self.masked, start, end)
    }

    /// First FROM target outside parentheses, else the first one anywhere.
    fn from_target(&self) -> Option<String> {
        let mut first_nested = None;

        for c in FROM_TARGET.captures_iter(&self.masked) {
            let (Some(keyword), Some(name)) = (c.get(0), c.get(1)) else {
                continue;
            };
            let table = name.as_str().to_lowercase();
            if depth_at_end(&self.masked[..keyword.start()]) == 0 {
                return Some(table);
            }
            first_nested.get_or_insert(table);
        }

        first_nested
    }

    /// Text between SELECT and its top-level FROM, or the end of the query.
    fn projection(&self) -> Option<Span<'_>> {
        let select = SELECT_KEYWORD.find(&self.masked)?;
        let start = select.end();

        let end = FROM_KEYWORD
            .find_iter(&self.masked[start..])
            .find(|m| depth_at_end(&self.masked[start..start + m.start()]) == 0)
            .map(|m| start + m.start())
            .unwrap_or(self.masked.len());

        self.span(start, end)
    }

    /// Body of the clause opened by `open`, up to the next `close` match.
    fn clause(&self, open: &Regex, close: &Regex) -> Option<Span<'_>> {
        let start = open.find(&self.masked)?.end();
        let end = close.find_at(&self.masked, start).map(|m| m.start()).unwrap_or(self.masked.len());
        self.span(start, end)
    }

    fn clause_columns(&self, open: &Regex, close: &Regex) -> Vec<String> {
        let Some(clause) = self.clause(open, close) else {
            return Vec::new();
        };

        clause
            .split_top_level(',')
            .into_iter()
            .filter_map(|part| part.original.split_whitespace().next().map(str::to_string))
            .collect()
    }
}

/// Reduces one projection item to its base expression.
fn base_expression(item: Span<'_>) -> Option<String> {
    let mut item = item.trim();

    if let Some(modifier) = PROJECTION_MODIFIER.find(item.masked) {
        item = Span::slice(item.original, item.masked, modifier.end(), item.masked.len())?;
    }

    let alias = AS_ALIAS.find_iter(item.masked).find(|m| depth_at_end(&item.masked[..m.start()]) == 0);
    let expression = match alias {
        Some(m) => Span::slice(item.original, item.masked, 0, m.start())?.trim(),
        None => strip_bare_alias(item),
    };

    let cleaned = expression.original.trim_matches(|c| matches!(c, '`' | '"' | '[' | ']'));
    let upper = cleaned.to_ascii_uppercase();
    if cleaned.is_empty() || upper == "DISTINCT" || upper == "ALL" {
        return None;
    }

    Some(cleaned.to_string())
}

/// Drops a trailing alias written without AS (`COUNT(*) total`, `u.name n`).
fn strip_bare_alias(item: Span<'_>) -> Span<'_> {
    let mut split_at = None;
    let mut depth = 0usize;
    for (idx, c) in item.masked.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => split_at = Some(idx),
            _ => {}
        }
    }

    let Some(idx) = split_at else {
        return item;
    };

    let (Some(head), Some(tail)) = (
        Span::slice(item.original, item.masked, 0, idx),
        Span::slice(item.original, item.masked, idx, item.masked.len()),
    ) else {
        return item;
    };

    let head = head.trim();
    let tail = tail.trim();
    let ends_with_operator = head.masked.ends_with(|c: char| "+-*/%|=<>,.".contains(c));
    let tail_is_keyword = NON_ALIAS_WORDS.contains(&tail.masked.to_ascii_uppercase().as_str());

    if head.is_blank() || ends_with_operator || tail_is_keyword || !BARE_IDENTIFIER.is_match(tail.masked) {
        return item;
    }

    head
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(sql: &str) -> Vec<String> {
        QueryAnalyzer::new(sql).get_columns()
    }

    #[test]
    fn test_query_type_detection() {
        assert_eq!(QueryAnalyzer::new("SELECT * FROM users").get_query_type(), QueryType::Select);
        assert_eq!(QueryAnalyzer::new("  insert into t values (1)").get_query_type(), QueryType::Insert);
        assert_eq!(QueryAnalyzer::new("-- note\nUPDATE t SET a = 1").get_query_type(), QueryType::Update);
        assert_eq!(QueryAnalyzer::new("CREATE TABLE t (id INTEGER)").get_query_type(), QueryType::Create);
        assert_eq!(QueryAnalyzer::new("PRAGMA table_info(t)").get_query_type(), QueryType::Unknown);
        assert_eq!(QueryAnalyzer::new("").get_query_type(), QueryType::Unknown);
        assert_eq!(QueryAnalyzer::new(";;").get_query_type(), QueryType::Unknown);
    }

    #[test]
    fn test_tables_exclude_aliases() {
        let analyzer = QueryAnalyzer::new("SELECT u.name, o.amount FROM users u JOIN orders o ON u.id = o.user_id");
        assert_eq!(analyzer.get_tables(), vec!["orders", "users"]);

        assert_eq!(QueryAnalyzer::new("SELECT * FROM users u").get_tables(), vec!["users"]);
    }

    #[test]
    fn test_tables_are_lowercased_and_deduplicated() {
        let analyzer = QueryAnalyzer::new("SELECT * FROM Users JOIN USERS b ON 1 = 1");
        assert_eq!(analyzer.get_tables(), vec!["users"]);
    }

    #[test]
    fn test_write_targets() {
        let insert = QueryAnalyzer::new("INSERT INTO Users (name) VALUES ('x')");
        assert_eq!(insert.get_tables(), vec!["users"]);
        assert_eq!(insert.get_target().as_deref(), Some("users"));

        let update = QueryAnalyzer::new("UPDATE users SET age = 30 WHERE id = 1");
        assert_eq!(update.get_target().as_deref(), Some("users"));

        let delete = QueryAnalyzer::new("DELETE FROM orders WHERE amount < 10");
        assert_eq!(delete.get_tables(), vec!["orders"]);

        let copy = QueryAnalyzer::new("INSERT INTO archive SELECT * FROM users");
        assert_eq!(copy.get_tables(), vec!["archive", "users"]);
        assert_eq!(copy.get_target().as_deref(), Some("archive"));
    }

    #[test]
    fn test_from_prefers_top_level() {
        let analyzer = QueryAnalyzer::new("SELECT EXTRACT(YEAR FROM created) FROM events");
        assert_eq!(analyzer.get_tables(), vec!["events"]);

        let derived = QueryAnalyzer::new("SELECT * FROM (SELECT id FROM users) sub");
        assert_eq!(derived.get_tables(), vec!["users"]);
    }

    #[test]
    fn test_columns() {
        assert_eq!(columns("SELECT * FROM users"), vec!["*"]);
        assert_eq!(columns("SELECT name, age FROM users"), vec!["name", "age"]);
        assert_eq!(columns("SELECT name AS n FROM users"), vec!["name"]);
        assert_eq!(columns("SELECT name as n FROM users"), vec!["name"]);
        assert_eq!(columns("SELECT u.name n, COUNT(*) total FROM users u"), vec!["u.name", "COUNT(*)"]);
        assert_eq!(columns("SELECT DISTINCT city FROM users"), vec!["city"]);
        assert_eq!(columns("SELECT \"name\", `age` FROM users"), vec!["name", "age"]);
        assert_eq!(columns("SELECT COALESCE(a, b) AS c FROM t"), vec!["COALESCE(a, b)"]);
        assert_eq!(columns("SELECT CAST(age AS TEXT) FROM users"), vec!["CAST(age AS TEXT)"]);
        assert_eq!(columns("SELECT price * qty FROM items"), vec!["price * qty"]);
    }

    #[test]
    fn test_columns_only_for_select() {
        assert!(columns("DELETE FROM users").is_empty());
        assert_eq!(columns("SELECT 1 + 1"), vec!["1 + 1"]);
    }

    #[test]
    fn test_where_conditions() {
        let analyzer = QueryAnalyzer::new("SELECT * FROM users WHERE age > 25 AND city = 'Boston' or name LIKE 'A%' ORDER BY age");
        assert_eq!(analyzer.get_where_conditions(), vec!["age > 25", "city = 'Boston'", "name LIKE 'A%'"]);
    }

    #[test]
    fn test_where_conditions_ignore_keywords_in_literals() {
        let analyzer = QueryAnalyzer::new("SELECT * FROM t WHERE note = 'order and limit' LIMIT 3");
        assert_eq!(analyzer.get_where_conditions(), vec!["note = 'order and limit'"]);
    }

    #[test]
    fn test_where_split_does_not_balance_parentheses() {
        let analyzer = QueryAnalyzer::new("SELECT * FROM t WHERE (a > 1 OR b < 2) AND c = 3");
        assert_eq!(analyzer.get_where_conditions(), vec!["(a > 1", "b < 2)", "c = 3"]);
    }

    #[test]
    fn test_where_absent_or_empty() {
        assert!(QueryAnalyzer::new("SELECT * FROM t").get_where_conditions().is_empty());
        assert!(QueryAnalyzer::new("SELECT * FROM t WHERE").get_where_conditions().is_empty());
    }

    #[test]
    fn test_join_info() {
        let analyzer = QueryAnalyzer::new("SELECT * FROM a JOIN b ON a.id=b.id");
        assert!(analyzer.has_joins());
        assert_eq!(analyzer.get_join_info(), vec![JoinInfo::new(JoinType::Inner, "b")]);

        let outer = QueryAnalyzer::new("SELECT * FROM a LEFT OUTER JOIN b ON a.id = b.id right join C on 1=1");
        assert_eq!(
            outer.get_join_info(),
            vec![JoinInfo::new(JoinType::Left, "b"), JoinInfo::new(JoinType::Right, "c")]
        );

        let aliased = QueryAnalyzer::new("SELECT * FROM users u JOIN orders o ON u.id = o.user_id");
        assert_eq!(aliased.get_join_info(), vec![JoinInfo::new(JoinType::Inner, "orders")]);
    }

    #[test]
    fn test_no_joins() {
        let analyzer = QueryAnalyzer::new("SELECT joined_at FROM users");
        assert!(!analyzer.has_joins());
        assert!(analyzer.get_join_info().is_empty());
    }

    #[test]
    fn test_group_and_order_by() {
        let analyzer = QueryAnalyzer::new("SELECT city, COUNT(*) FROM users GROUP BY city, age HAVING COUNT(*) > 1 ORDER BY city DESC, age ASC NULLS LAST LIMIT 5");
        assert_eq!(analyzer.get_group_by(), vec!["city", "age"]);
        assert_eq!(analyzer.get_order_by(), vec!["city", "age"]);
    }

    #[test]
    fn test_order_by_keeps_original_case() {
        let analyzer = QueryAnalyzer::new("SELECT * FROM users ORDER BY Age DESC");
        assert_eq!(analyzer.get_order_by(), vec!["Age"]);
    }

    #[test]
    fn test_limit() {
        assert_eq!(QueryAnalyzer::new("SELECT * FROM users LIMIT 10").get_limit(), Some(10));
        assert_eq!(QueryAnalyzer::new("SELECT * FROM users limit 0;").get_limit(), Some(0));
        assert_eq!(QueryAnalyzer::new("SELECT * FROM users LIMIT").get_limit(), None);
        assert_eq!(QueryAnalyzer::new("SELECT * FROM users LIMIT 99999999999999999999999").get_limit(), None);
    }

    #[test]
    fn test_analyze_composes_facts() {
        let facts = QueryAnalyzer::new("SELECT name, age FROM users WHERE age > 25 LIMIT 3").analyze();
        assert_eq!(facts.query_type, QueryType::Select);
        assert_eq!(facts.tables, vec!["users"]);
        assert_eq!(facts.columns, vec!["name", "age"]);
        assert_eq!(facts.where_conditions, vec!["age > 25"]);
        assert!(!facts.has_joins);
        assert_eq!(facts.limit, Some(3));
        assert_eq!(facts.target, None);
    }

    #[test]
    fn test_analyze_partial_input() {
        let facts = QueryAnalyzer::new("SELECT name, FROM").analyze();
        assert_eq!(facts.query_type, QueryType::Select);
        assert!(facts.tables.is_empty());
        assert_eq!(facts.columns, vec!["name"]);

        let garbage = QueryAnalyzer::new("))) 'unterminated").analyze();
        assert_eq!(garbage, QueryFacts::default());
    }
}
