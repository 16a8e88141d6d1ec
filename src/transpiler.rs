//! SQL assembler for classified WebFOCUS requests.
//!
//! Renders a [`QueryParts`] accumulator as SQL Server text. Sections come out
//! in a fixed order:
//!
//! ```text
//! -- Unhandled: ...   one per unrecognized line
//! SELECT ...
//! FROM ...
//! WHERE ...           if any condition
//! JOIN ...            one per join clause
//! GROUP BY ...;       if any BY column
//! ```
//!
//! Nothing is validated. Missing pieces render empty rather than failing.

use crate::ast::*;

/// Prefix for lines the classifier did not recognize.
pub const UNHANDLED_PREFIX: &str = "-- Unhandled: ";

/// Trait for converting classified requests to SQL.
pub trait ToSql {
    /// Convert this node to a SQL string.
    fn to_sql(&self) -> String;
}

impl ToSql for QueryParts {
    fn to_sql(&self) -> String {
        let mut lines: Vec<String> = self
            .unhandled
            .iter()
            .map(|line| format!("{}{}", UNHANDLED_PREFIX, line))
            .collect();

        lines.push(format!("SELECT {}", self.select_columns.join(", ")));
        lines.push(format!("FROM {}", self.table()));

        if !self.where_conditions.is_empty() {
            lines.push(format!("WHERE {}", self.where_conditions.join(" AND ")));
        }

        lines.extend(self.join_clauses.iter().cloned());

        if !self.group_by_columns.is_empty() {
            lines.push(format!("GROUP BY {};", self.group_by_columns.join(", ")));
        }

        lines
            .iter()
            .map(|l| l.trim_end())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl ToSql for LineKind {
    /// The SQL fragment a single line contributes, used by `explain`.
    fn to_sql(&self) -> String {
        match self {
            LineKind::TableFile(t) => format!("FROM {}", t),
            LineKind::Where(c) => format!("WHERE {}", c),
            LineKind::Print(cols) => format!("SELECT {}", cols.join(", ")),
            LineKind::By(c) => format!("SELECT {c} ... GROUP BY {c}"),
            LineKind::Sum(e) => format!("SELECT SUM({})", e),
            LineKind::Join { table, condition } => format!("JOIN {} ON {}", table, condition),
            LineKind::HoldJoin(h) => format!("JOIN {h} ON <table>.{k} = {h}.{k}", k = HOLD_JOIN_KEY),
            LineKind::End => String::new(),
            LineKind::Unhandled(l) => format!("{}{}", UNHANDLED_PREFIX, l),
        }
    }
}
