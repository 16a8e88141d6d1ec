//! # wf2sql — WebFOCUS to SQL Server
//!
//! Turns WebFOCUS report requests into SQL Server query text, either with a
//! keyword-driven line classifier or by asking a hosted language model.
//!
//! ## Quick Example
//!
//! ```
//! let sql = wf2sql::translate("TABLE FILE SALES\nSUM AMOUNT\nBY REGION\nEND").unwrap();
//! assert_eq!(sql, "SELECT SUM(AMOUNT), REGION\nFROM SALES\nGROUP BY REGION;");
//! ```
//!
//! ## Recognized statements
//!
//! | WebFOCUS          | SQL                         |
//! |-------------------|-----------------------------|
//! | `TABLE FILE t`    | `FROM t`                    |
//! | `WHERE c` / `IF c`| `WHERE c` (operators mapped)|
//! | `PRINT a b`       | `SELECT a, b`               |
//! | `SUM x`           | `SELECT SUM(x)`             |
//! | `BY c`            | `SELECT c` + `GROUP BY c`   |
//! | `JOIN t ON cond`  | `JOIN t ON cond`            |
//! | `ON TABLE HOLD AS h` | `JOIN h ON t.ID = h.ID`  |
//! | `END`             | stops reading               |

pub mod ast;
pub mod config;
pub mod engine;
pub mod error;
pub mod llm;
pub mod parser;
pub mod preprocess;
pub mod transpiler;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::config::Config;
    pub use crate::engine::{Backend, Engine, RuleTranslator, Translator};
    pub use crate::error::*;
    pub use crate::llm::LlmTranslator;
    pub use crate::parser::{Classifier, ClassifierOptions, parse};
    pub use crate::preprocess::{clean_source, strip_comments};
    pub use crate::transpiler::ToSql;
}

/// Translate WebFOCUS source with the rule-based classifier.
///
/// Empty or whitespace-only input is rejected.
///
/// # Example
///
/// ```
/// use wf2sql::translate;
///
/// let sql = translate("TABLE FILE CAR\nPRINT MODEL\nWHERE SEATS GT 2\nEND").unwrap();
/// assert_eq!(sql, "SELECT MODEL\nFROM CAR\nWHERE SEATS > 2");
/// ```
pub fn translate(source: &str) -> Result<String, error::TranslateError> {
    if source.trim().is_empty() {
        return Err(error::TranslateError::EmptyInput);
    }
    Ok(engine::RuleTranslator::default().to_sql(source))
}
