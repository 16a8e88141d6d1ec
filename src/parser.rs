//! WebFOCUS line classifier using nom.
//!
//! Every line is checked against an ordered rule table. The first rule that
//! matches and can extract its payload decides what the line means.
//!
//! # Rule order
//!
//! ```text
//!  #  keyword        position   result
//!  1  TABLE FILE     anywhere   table name (last token)
//!  2  WHERE          prefix     condition
//!  3  IF             prefix     condition
//!  4  PRINT          prefix     columns
//!  5  BY             prefix     group-by column (last token)
//!  6  SUM            anywhere   SUM(<rest>)
//!  7  JOIN           anywhere   JOIN <table> ON <condition>
//!  8  ON TABLE       prefix     hold-table join (needs HOLD AS <name>)
//!  9  END            anywhere   stop
//!     (no match)                unhandled passthrough
//! ```
//!
//! Keywords are case-insensitive and match whole words only: the characters
//! on either side must not be `[A-Za-z0-9_]`. `SUMMARY` never triggers the
//! `SUM` rule, while `END;` and `SUM(AMOUNT)` do match. Text inside quotes is
//! never searched for keywords.

use nom::{
    IResult,
    bytes::complete::tag_no_case,
    character::complete::multispace1,
    character::complete::satisfy,
    combinator::{not, value},
};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::debug;

use crate::ast::*;
use crate::preprocess::strip_comments;

/// Where a rule's keyword has to appear in the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// The line starts with the keyword.
    Prefix,
    /// The keyword appears somewhere in the line.
    Anywhere,
}

/// What a matching rule extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    TableFile,
    Where,
    Print,
    By,
    Sum,
    Join,
    HoldJoin,
    End,
}

/// One entry of the classification table.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Keyword words, matched in sequence.
    pub keyword: &'static [&'static str],
    pub position: Position,
    pub action: RuleAction,
}

/// Classification rules, in priority order.
pub const RULES: &[Rule] = &[
    Rule {
        keyword: &["TABLE", "FILE"],
        position: Position::Anywhere,
        action: RuleAction::TableFile,
    },
    Rule {
        keyword: &["WHERE"],
        position: Position::Prefix,
        action: RuleAction::Where,
    },
    Rule {
        keyword: &["IF"],
        position: Position::Prefix,
        action: RuleAction::Where,
    },
    Rule {
        keyword: &["PRINT"],
        position: Position::Prefix,
        action: RuleAction::Print,
    },
    Rule {
        keyword: &["BY"],
        position: Position::Prefix,
        action: RuleAction::By,
    },
    Rule {
        keyword: &["SUM"],
        position: Position::Anywhere,
        action: RuleAction::Sum,
    },
    Rule {
        keyword: &["JOIN"],
        position: Position::Anywhere,
        action: RuleAction::Join,
    },
    Rule {
        keyword: &["ON", "TABLE"],
        position: Position::Prefix,
        action: RuleAction::HoldJoin,
    },
    Rule {
        keyword: &["END"],
        position: Position::Anywhere,
        action: RuleAction::End,
    },
];

/// WebFOCUS operator → SQL replacements, applied in order.
const OPERATOR_MAP: &[(&str, &str)] = &[
    (r"IS\s+NOT\s+MISSING", "IS NOT NULL"),
    (r"NE\s+MISSING", "IS NOT NULL"),
    (r"IS\s+MISSING", "IS NULL"),
    (r"EQ\s+MISSING", "IS NULL"),
    (r"MISSING", "IS NULL"),
    (r"GE", ">="),
    (r"LE", "<="),
    (r"GT", ">"),
    (r"LT", "<"),
    (r"EQ", "="),
    (r"NE", "<>"),
];

fn operator_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        OPERATOR_MAP
            .iter()
            .map(|(pat, sql)| {
                let re = Regex::new(&format!(r"(?i)\b{}\b", pat))
                    .expect("valid operator pattern");
                (re, *sql)
            })
            .collect()
    })
}

/// Replace WebFOCUS comparison words with their SQL operators.
///
/// Single-quoted literals are left untouched.
pub fn substitute_operators(condition: &str) -> String {
    condition
        .split('\'')
        .enumerate()
        .map(|(i, segment)| {
            if i % 2 == 1 {
                return segment.to_string();
            }
            operator_patterns()
                .iter()
                .fold(segment.to_string(), |acc, (re, sql)| {
                    re.replace_all(&acc, *sql).into_owned()
                })
        })
        .collect::<Vec<_>>()
        .join("'")
}

/// Knobs that used to differ between translator variants.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClassifierOptions {
    /// Rewrite `EQ`, `GT`, `MISSING`, ... in conditions.
    pub substitute_operators: bool,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            substitute_operators: true,
        }
    }
}

/// Rule-table driven line classifier.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    options: ClassifierOptions,
}

impl Classifier {
    pub fn new(options: ClassifierOptions) -> Self {
        Self { options }
    }

    /// Classify a single line.
    pub fn classify_line(&self, line: &str) -> LineKind {
        let line = line.trim();
        RULES
            .iter()
            .find_map(|rule| {
                let (before, after) = match rule.position {
                    Position::Prefix => ("", strip_phrase(line, rule.keyword)?),
                    Position::Anywhere => find_phrase(line, rule.keyword)?,
                };
                self.extract(rule.action, before, after)
            })
            .unwrap_or_else(|| LineKind::Unhandled(line.to_string()))
    }

    /// Classify lines up to and including the first `END`.
    pub fn classify<'a, I>(&self, lines: I) -> Vec<ClassifiedLine>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut out = Vec::new();
        for (idx, text) in lines.into_iter().enumerate() {
            let kind = self.classify_line(text);
            debug!(line = idx + 1, rule = kind.label(), "classified: {}", text.trim());
            let done = kind == LineKind::End;
            out.push(ClassifiedLine {
                line_no: idx + 1,
                text: text.trim().to_string(),
                kind,
            });
            if done {
                break;
            }
        }
        out
    }

    /// Classify lines and fold them into a [`QueryParts`].
    pub fn accumulate<'a, I>(&self, lines: I) -> QueryParts
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut parts = QueryParts::new();
        for line in self.classify(lines) {
            if !parts.apply(line.kind) {
                break;
            }
        }
        parts
    }

    fn extract(&self, action: RuleAction, before: &str, after: &str) -> Option<LineKind> {
        match action {
            RuleAction::TableFile => after
                .split_whitespace()
                .last()
                .map(|t| LineKind::TableFile(t.to_string())),
            RuleAction::Where => {
                let cond = after.trim().trim_end_matches(';').trim_end();
                if cond.is_empty() {
                    return None;
                }
                let cond = if self.options.substitute_operators {
                    substitute_operators(cond)
                } else {
                    cond.to_string()
                };
                Some(LineKind::Where(cond))
            }
            RuleAction::Print => {
                let cols: Vec<String> = after.split_whitespace().map(String::from).collect();
                (!cols.is_empty()).then_some(LineKind::Print(cols))
            }
            RuleAction::By => after
                .split_whitespace()
                .last()
                .map(|c| LineKind::By(c.to_string())),
            RuleAction::Sum => {
                let rest = [before.trim(), after.trim()]
                    .iter()
                    .filter(|s| !s.is_empty())
                    .copied()
                    .collect::<Vec<_>>()
                    .join(" ");
                // SUM(x) already carries its own parentheses
                let rest = rest
                    .strip_prefix('(')
                    .and_then(|r| r.strip_suffix(')'))
                    .filter(|inner| !inner.contains(['(', ')']))
                    .map(str::trim)
                    .unwrap_or(&rest)
                    .to_string();
                (!rest.is_empty()).then_some(LineKind::Sum(rest))
            }
            RuleAction::Join => {
                let (target, condition) = find_phrase(after, &["ON"])?;
                let table = target.split_whitespace().last()?;
                let condition = condition.trim();
                (!condition.is_empty()).then(|| LineKind::Join {
                    table: table.to_string(),
                    condition: condition.to_string(),
                })
            }
            RuleAction::HoldJoin => {
                let (_, rest) = find_phrase(after, &["HOLD", "AS"])?;
                rest.split_whitespace()
                    .next()
                    .map(|name| LineKind::HoldJoin(name.to_string()))
            }
            RuleAction::End => Some(LineKind::End),
        }
    }
}

/// Strip comments and classify a whole source text with default options.
///
/// # Example
///
/// ```
/// let parts = wf2sql::parser::parse("TABLE FILE SALES\nPRINT A B\nEND");
/// assert_eq!(parts.table(), "SALES");
/// assert_eq!(parts.select_columns, vec!["A", "B"]);
/// ```
pub fn parse(source: &str) -> QueryParts {
    Classifier::default().accumulate(strip_comments(source))
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Succeeds unless an identifier character follows; consumes nothing.
fn word_end(input: &str) -> IResult<&str, ()> {
    value((), not(satisfy(is_ident_char)))(input)
}

/// Match a keyword phrase (words separated by any whitespace) at the start.
fn keyword_phrase<'a>(words: &[&str], input: &'a str) -> IResult<&'a str, &'a str> {
    let mut rest = input;
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            let (r, _) = multispace1(rest)?;
            rest = r;
        }
        let (r, _) = tag_no_case(*word)(rest)?;
        let (r, _) = word_end(r)?;
        rest = r;
    }
    Ok((rest, &input[..input.len() - rest.len()]))
}

/// Text after `words` when the line starts with them.
fn strip_phrase<'a>(line: &'a str, words: &[&str]) -> Option<&'a str> {
    keyword_phrase(words, line).ok().map(|(rest, _)| rest)
}

/// Split around the first whole-word occurrence of `words`.
fn find_phrase<'a>(line: &'a str, words: &[&str]) -> Option<(&'a str, &'a str)> {
    word_starts(line).find_map(|start| {
        keyword_phrase(words, &line[start..])
            .ok()
            .map(|(rest, _)| (&line[..start], rest))
    })
}

/// Byte offsets where an identifier-like word starts, outside quotes.
fn word_starts(line: &str) -> impl Iterator<Item = usize> + '_ {
    let mut quote: Option<char> = None;
    let mut prev_ident = false;
    line.char_indices().filter_map(move |(i, c)| {
        let start = quote.is_none() && is_ident_char(c) && !prev_ident;
        match quote {
            Some(q) if c == q => quote = None,
            None if c == '\'' || c == '"' => quote = Some(c),
            _ => {}
        }
        prev_ident = is_ident_char(c);
        start.then_some(i)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(line: &str) -> LineKind {
        Classifier::default().classify_line(line)
    }

    #[test]
    fn test_table_file() {
        assert_eq!(classify("TABLE FILE SALES"), LineKind::TableFile("SALES".into()));
        assert_eq!(classify("  table   file  car"), LineKind::TableFile("car".into()));
    }

    #[test]
    fn test_where_substitution() {
        assert_eq!(classify("WHERE A EQ 5"), LineKind::Where("A = 5".into()));
        assert_eq!(
            classify("WHERE COUNTRY NE 'ITALY' AND SALES GT 100;"),
            LineKind::Where("COUNTRY <> 'ITALY' AND SALES > 100".into())
        );
    }

    #[test]
    fn test_where_without_substitution() {
        let c = Classifier::new(ClassifierOptions {
            substitute_operators: false,
        });
        assert_eq!(c.classify_line("WHERE A EQ 5"), LineKind::Where("A EQ 5".into()));
    }

    #[test]
    fn test_if_is_where() {
        assert_eq!(classify("IF QTY LT 10"), LineKind::Where("QTY < 10".into()));
    }

    #[test]
    fn test_missing_forms() {
        assert_eq!(substitute_operators("X MISSING"), "X IS NULL");
        assert_eq!(substitute_operators("X IS MISSING"), "X IS NULL");
        assert_eq!(substitute_operators("X IS NOT MISSING"), "X IS NOT NULL");
        assert_eq!(substitute_operators("X EQ MISSING"), "X IS NULL");
        assert_eq!(substitute_operators("X NE MISSING"), "X IS NOT NULL");
    }

    #[test]
    fn test_substitution_is_whole_word() {
        assert_eq!(substitute_operators("AGE GE 18"), "AGE >= 18");
        assert_eq!(substitute_operators("NET_EQUITY LE 0"), "NET_EQUITY <= 0");
        assert_eq!(substitute_operators("a eq 1"), "a = 1");
    }

    #[test]
    fn test_print_columns() {
        assert_eq!(
            classify("PRINT A B"),
            LineKind::Print(vec!["A".into(), "B".into()])
        );
    }

    #[test]
    fn test_by_last_token() {
        assert_eq!(classify("BY REGION"), LineKind::By("REGION".into()));
        assert_eq!(classify("BY HIGHEST AMOUNT"), LineKind::By("AMOUNT".into()));
    }

    #[test]
    fn test_sum() {
        assert_eq!(classify("SUM AMOUNT"), LineKind::Sum("AMOUNT".into()));
        assert_eq!(classify("sum qty"), LineKind::Sum("qty".into()));
    }

    #[test]
    fn test_keywords_are_whole_words() {
        assert_eq!(
            classify("SUMMARY SPEND"),
            LineKind::Unhandled("SUMMARY SPEND".into())
        );
        assert_eq!(classify("PRINTER X"), LineKind::Unhandled("PRINTER X".into()));
        assert_eq!(classify("BYPASS"), LineKind::Unhandled("BYPASS".into()));
        assert_eq!(classify("SUM_TOTAL"), LineKind::Unhandled("SUM_TOTAL".into()));
        assert_eq!(classify("WEEKEND2"), LineKind::Unhandled("WEEKEND2".into()));
    }

    #[test]
    fn test_prefix_rules_beat_later_rules() {
        // WHERE wins over SUM and END
        assert_eq!(
            classify("WHERE SUM EQ END"),
            LineKind::Where("SUM = END".into())
        );
        // BY wins over SUM
        assert_eq!(classify("BY SUM"), LineKind::By("SUM".into()));
    }

    #[test]
    fn test_join() {
        assert_eq!(
            classify("JOIN CUSTOMERS ON SALES.CUST_ID = CUSTOMERS.ID"),
            LineKind::Join {
                table: "CUSTOMERS".into(),
                condition: "SALES.CUST_ID = CUSTOMERS.ID".into(),
            }
        );
        assert_eq!(
            classify("join orders on a.id = orders.a_id"),
            LineKind::Join {
                table: "orders".into(),
                condition: "a.id = orders.a_id".into(),
            }
        );
    }

    #[test]
    fn test_join_without_on_is_unhandled() {
        assert_eq!(
            classify("JOIN CUST_ID IN SALES TO ID IN CUSTOMERS AS J1"),
            LineKind::Unhandled("JOIN CUST_ID IN SALES TO ID IN CUSTOMERS AS J1".into())
        );
    }

    #[test]
    fn test_hold_join() {
        assert_eq!(
            classify("ON TABLE HOLD AS HOLD1"),
            LineKind::HoldJoin("HOLD1".into())
        );
        assert_eq!(
            classify("ON TABLE PCHOLD FORMAT EXL07"),
            LineKind::Unhandled("ON TABLE PCHOLD FORMAT EXL07".into())
        );
    }

    #[test]
    fn test_end() {
        assert_eq!(classify("END"), LineKind::End);
        assert_eq!(classify("end"), LineKind::End);
        assert_eq!(classify("END;"), LineKind::End);
        assert_eq!(classify("END."), LineKind::End);
    }

    #[test]
    fn test_keywords_next_to_punctuation() {
        assert_eq!(classify("SUM(AMOUNT)"), LineKind::Sum("AMOUNT".into()));
        assert_eq!(classify("SUM (A) + (B)"), LineKind::Sum("(A) + (B)".into()));
        assert_eq!(classify("WHERE(A EQ 1)"), LineKind::Where("(A = 1)".into()));
    }

    #[test]
    fn test_keywords_inside_quotes_are_ignored() {
        assert_eq!(
            classify("HEADING \"END OF REPORT\""),
            LineKind::Unhandled("HEADING \"END OF REPORT\"".into())
        );
        assert_eq!(
            classify("FOOTING 'SUM OF SALES'"),
            LineKind::Unhandled("FOOTING 'SUM OF SALES'".into())
        );
    }

    #[test]
    fn test_substitution_skips_quoted_literals() {
        assert_eq!(
            classify("WHERE CITY EQ 'LE HAVRE'"),
            LineKind::Where("CITY = 'LE HAVRE'".into())
        );
        assert_eq!(
            classify("IF NOTE EQ 'MISSING'"),
            LineKind::Where("NOTE = 'MISSING'".into())
        );
        assert_eq!(
            substitute_operators("A EQ 'GT' AND B NE 'it''s LT'"),
            "A = 'GT' AND B <> 'it''s LT'"
        );
    }

    #[test]
    fn test_every_operator_pattern_compiles() {
        assert_eq!(operator_patterns().len(), OPERATOR_MAP.len());
    }

    #[test]
    fn test_classify_stops_after_end() {
        let lines = Classifier::default().classify(["TABLE FILE A", "END", "PRINT X"]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].kind, LineKind::End);
        assert_eq!(lines[1].line_no, 2);
    }

    #[test]
    fn test_parse_accumulates() {
        let parts = parse("-* comment\nTABLE FILE SALES\nPRINT A B\nWHERE A GT 1\nBY R\nEND\nPRINT Z");
        assert_eq!(parts.table(), "SALES");
        assert_eq!(parts.select_columns, vec!["A", "B", "R"]);
        assert_eq!(parts.where_conditions, vec!["A > 1"]);
        assert_eq!(parts.group_by_columns, vec!["R"]);
        assert!(parts.unhandled.is_empty());
    }

    #[test]
    fn test_empty_payloads_fall_through() {
        assert_eq!(classify("PRINT"), LineKind::Unhandled("PRINT".into()));
        assert_eq!(classify("WHERE ;"), LineKind::Unhandled("WHERE ;".into()));
    }
}
