//! SQL parsing and classification logic.
//!
//! Uses sqlparser-rs with the MySQL dialect to parse SQL and classify
//! statements by their safety level.

use sqlparser::ast::{Query, Select, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

use super::{ClassificationResult, SafetyLevel, StatementType};

/// SQL classifier that parses and classifies SQL statements.
#[derive(Debug)]
pub struct SqlClassifier {
    dialect: MySqlDialect,
}

impl Default for SqlClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlClassifier {
    /// Creates a new SQL classifier.
    pub fn new() -> Self {
        Self {
            dialect: MySqlDialect {},
        }
    }

    /// Classifies a SQL string and returns the classification result.
    ///
    /// Text that does not parse is classified as `Unknown`.
    pub fn classify(&self, sql: &str) -> ClassificationResult {
        if sql.trim().is_empty() {
            return ClassificationResult::new(SafetyLevel::Unknown, StatementType::Empty);
        }

        let statements = match Parser::parse_sql(&self.dialect, sql) {
            Ok(statements) => statements,
            Err(_) => {
                return ClassificationResult::new(SafetyLevel::Unknown, StatementType::Unknown)
            }
        };

        match statements.as_slice() {
            [] => ClassificationResult::new(SafetyLevel::Unknown, StatementType::Empty),
            [single] => {
                let (level, stmt_type) = classify_statement(single);
                ClassificationResult::new(level, stmt_type)
            }
            many => {
                // Multiple statements: report the most dangerous one
                let (level, stmt_type) = many
                    .iter()
                    .map(classify_statement)
                    .fold((SafetyLevel::ReadOnly, StatementType::Select), most_dangerous);
                ClassificationResult::new(level, StatementType::Multiple(Box::new(stmt_type)))
            }
        }
    }
}

/// Convenience function to classify SQL without creating a classifier instance.
pub fn classify_sql(sql: &str) -> ClassificationResult {
    SqlClassifier::new().classify(sql)
}

/// Returns a priority value for safety levels (higher = more dangerous).
fn level_priority(level: &SafetyLevel) -> u8 {
    match level {
        SafetyLevel::ReadOnly | SafetyLevel::Unknown => 0,
        SafetyLevel::Mutating => 1,
        SafetyLevel::Destructive => 2,
    }
}

fn most_dangerous(
    current: (SafetyLevel, StatementType),
    candidate: (SafetyLevel, StatementType),
) -> (SafetyLevel, StatementType) {
    if level_priority(&candidate.0) > level_priority(&current.0) {
        candidate
    } else {
        current
    }
}

/// Classifies a single parsed statement.
fn classify_statement(statement: &Statement) -> (SafetyLevel, StatementType) {
    match statement {
        // Query: may hide mutations in CTEs or derived tables, so recurse
        Statement::Query(query) => classify_query(query),
        Statement::Explain {
            analyze, statement, ..
        } => {
            if *analyze {
                // EXPLAIN ANALYZE runs the statement
                let (inner_level, _) = classify_statement(statement);
                (inner_level, StatementType::Explain)
            } else {
                (SafetyLevel::ReadOnly, StatementType::Explain)
            }
        }
        Statement::ExplainTable { .. } => (SafetyLevel::ReadOnly, StatementType::Explain),
        Statement::ShowVariable { .. }
        | Statement::ShowTables { .. }
        | Statement::ShowColumns { .. }
        | Statement::ShowCreate { .. }
        | Statement::ShowStatus { .. }
        | Statement::ShowCollation { .. } => (SafetyLevel::ReadOnly, StatementType::Show),

        Statement::Insert { .. } => (SafetyLevel::Mutating, StatementType::Insert),
        Statement::Update { .. } => (SafetyLevel::Mutating, StatementType::Update),

        Statement::Delete { .. } => (SafetyLevel::Destructive, StatementType::Delete),
        Statement::Drop { .. } => (SafetyLevel::Destructive, StatementType::Drop),
        Statement::Truncate { .. } => (SafetyLevel::Destructive, StatementType::Truncate),
        Statement::AlterTable { .. } | Statement::AlterView { .. } => {
            (SafetyLevel::Destructive, StatementType::Alter)
        }
        Statement::CreateTable { .. }
        | Statement::CreateIndex { .. }
        | Statement::CreateView { .. }
        | Statement::CreateDatabase { .. } => (SafetyLevel::Destructive, StatementType::Create),
        Statement::Grant { .. } => (SafetyLevel::Destructive, StatementType::Grant),
        Statement::Revoke { .. } => (SafetyLevel::Destructive, StatementType::Revoke),

        // Anything else the parser understood is refused
        _ => (SafetyLevel::Destructive, StatementType::Unknown),
    }
}

/// Classifies a Query by recursively inspecting for data-modifying operations.
fn classify_query(query: &Query) -> (SafetyLevel, StatementType) {
    let ctes = query
        .with
        .iter()
        .flat_map(|with| with.cte_tables.iter())
        .map(|cte| classify_query(&cte.query));

    ctes.chain(std::iter::once(classify_set_expr(&query.body)))
        .fold((SafetyLevel::ReadOnly, StatementType::Select), most_dangerous)
}

/// Classifies a SetExpr, detecting mutations and recursing into nested queries.
fn classify_set_expr(set_expr: &SetExpr) -> (SafetyLevel, StatementType) {
    match set_expr {
        SetExpr::Insert(stmt) | SetExpr::Update(stmt) => classify_statement(stmt),
        SetExpr::Query(query) => classify_query(query),
        SetExpr::Select(select) => classify_select(select),
        SetExpr::SetOperation { left, right, .. } => {
            most_dangerous(classify_set_expr(left), classify_set_expr(right))
        }
        _ => (SafetyLevel::ReadOnly, StatementType::Select),
    }
}

/// Classifies a Select by checking its FROM clause for subqueries.
fn classify_select(select: &Select) -> (SafetyLevel, StatementType) {
    select
        .from
        .iter()
        .map(classify_table_with_joins)
        .fold((SafetyLevel::ReadOnly, StatementType::Select), most_dangerous)
}

/// Classifies a TableWithJoins, checking the main relation and all joins.
fn classify_table_with_joins(twj: &TableWithJoins) -> (SafetyLevel, StatementType) {
    std::iter::once(&twj.relation)
        .chain(twj.joins.iter().map(|join| &join.relation))
        .map(classify_table_factor)
        .fold((SafetyLevel::ReadOnly, StatementType::Select), most_dangerous)
}

/// Classifies a TableFactor, recursing into derived tables (subqueries).
fn classify_table_factor(factor: &TableFactor) -> (SafetyLevel, StatementType) {
    match factor {
        TableFactor::Derived { subquery, .. } => classify_query(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => classify_table_with_joins(table_with_joins),
        _ => (SafetyLevel::ReadOnly, StatementType::Select),
    }
}
