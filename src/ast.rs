//! Classified WebFOCUS lines and the accumulator they feed.

use serde::Serialize;
use std::fmt;

/// Key column used by the hold-table join.
///
/// Known limitation: this is a fixed guess, not inferred from either table.
pub const HOLD_JOIN_KEY: &str = "ID";

/// What a single source line was recognized as, with its extracted payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LineKind {
    /// `TABLE FILE <table>`
    TableFile(String),
    /// `WHERE`/`IF` condition, operators already substituted when enabled.
    Where(String),
    /// `PRINT` column list.
    Print(Vec<String>),
    /// `BY <column>`
    By(String),
    /// `SUM` argument, without the wrapping call.
    Sum(String),
    /// `JOIN <table> ON <condition>`
    Join { table: String, condition: String },
    /// `ON TABLE ... HOLD AS <name>`
    HoldJoin(String),
    /// `END`
    End,
    /// Nothing matched; kept verbatim.
    Unhandled(String),
}

impl LineKind {
    /// Short label used by `explain` output.
    pub fn label(&self) -> &'static str {
        match self {
            LineKind::TableFile(_) => "TABLE FILE",
            LineKind::Where(_) => "WHERE",
            LineKind::Print(_) => "PRINT",
            LineKind::By(_) => "BY",
            LineKind::Sum(_) => "SUM",
            LineKind::Join { .. } => "JOIN",
            LineKind::HoldJoin(_) => "ON TABLE HOLD",
            LineKind::End => "END",
            LineKind::Unhandled(_) => "UNHANDLED",
        }
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineKind::TableFile(t) => write!(f, "table {}", t),
            LineKind::Where(c) => write!(f, "condition {}", c),
            LineKind::Print(cols) => write!(f, "columns {}", cols.join(", ")),
            LineKind::By(c) => write!(f, "group by {}", c),
            LineKind::Sum(e) => write!(f, "SUM({})", e),
            LineKind::Join { table, condition } => write!(f, "JOIN {} ON {}", table, condition),
            LineKind::HoldJoin(t) => write!(f, "hold table {}", t),
            LineKind::End => write!(f, "end of request"),
            LineKind::Unhandled(l) => write!(f, "{}", l),
        }
    }
}

/// One source line together with how it was classified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedLine {
    /// 1-based position among the lines handed to the classifier.
    pub line_no: usize,
    pub text: String,
    pub kind: LineKind,
}

/// Fragments collected from one request, in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryParts {
    pub table_name: Option<String>,
    pub select_columns: Vec<String>,
    pub where_conditions: Vec<String>,
    pub group_by_columns: Vec<String>,
    pub join_clauses: Vec<String>,
    pub unhandled: Vec<String>,
}

impl QueryParts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one classified line into the accumulator.
    ///
    /// Returns `false` once the request is terminated by `END`.
    pub fn apply(&mut self, kind: LineKind) -> bool {
        match kind {
            LineKind::TableFile(table) => {
                if self.table_name.is_none() {
                    self.table_name = Some(table);
                }
            }
            LineKind::Where(cond) => self.where_conditions.push(cond),
            LineKind::Print(cols) => self.select_columns.extend(cols),
            LineKind::By(col) => {
                self.select_columns.push(col.clone());
                self.group_by_columns.push(col);
            }
            LineKind::Sum(expr) => self.select_columns.push(format!("SUM({})", expr)),
            LineKind::Join { table, condition } => {
                self.join_clauses.push(format!("JOIN {} ON {}", table, condition));
            }
            LineKind::HoldJoin(hold) => {
                let base = self.table_name.as_deref().unwrap_or_default();
                self.join_clauses.push(format!(
                    "JOIN {hold} ON {base}.{key} = {hold}.{key}",
                    key = HOLD_JOIN_KEY
                ));
            }
            LineKind::End => return false,
            LineKind::Unhandled(line) => self.unhandled.push(line),
        }
        true
    }

    /// Table name, or empty when no `TABLE FILE` was seen.
    pub fn table(&self) -> &str {
        self.table_name.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_table_wins() {
        let mut parts = QueryParts::new();
        parts.apply(LineKind::TableFile("SALES".into()));
        parts.apply(LineKind::TableFile("CUSTOMERS".into()));
        assert_eq!(parts.table(), "SALES");
    }

    #[test]
    fn test_by_feeds_select_and_group() {
        let mut parts = QueryParts::new();
        parts.apply(LineKind::By("REGION".into()));
        assert_eq!(parts.select_columns, vec!["REGION"]);
        assert_eq!(parts.group_by_columns, vec!["REGION"]);
    }

    #[test]
    fn test_end_stops() {
        let mut parts = QueryParts::new();
        assert!(parts.apply(LineKind::Sum("AMOUNT".into())));
        assert!(!parts.apply(LineKind::End));
        assert_eq!(parts.select_columns, vec!["SUM(AMOUNT)"]);
    }

    #[test]
    fn test_hold_join_uses_current_table() {
        let mut parts = QueryParts::new();
        parts.apply(LineKind::TableFile("SALES".into()));
        parts.apply(LineKind::HoldJoin("HOLD1".into()));
        assert_eq!(parts.join_clauses, vec!["JOIN HOLD1 ON SALES.ID = HOLD1.ID"]);
    }

    #[test]
    fn test_label_and_display() {
        let kind = LineKind::Join {
            table: "CUST".into(),
            condition: "A.ID = CUST.ID".into(),
        };
        assert_eq!(kind.label(), "JOIN");
        assert_eq!(kind.to_string(), "JOIN CUST ON A.ID = CUST.ID");
    }
}
