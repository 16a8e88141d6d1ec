//! Translation engine.
//!
//! Both strategies sit behind the [`Translator`] trait. [`Engine`] is the
//! front door: it rejects empty input, runs the selected translator and
//! reports the outcome.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use crate::ast::ClassifiedLine;
use crate::config::Config;
use crate::error::{TranslateError, TranslateResult};
use crate::llm::LlmTranslator;
use crate::parser::{Classifier, ClassifierOptions};
use crate::preprocess::strip_comments;
use crate::transpiler::ToSql;

/// A WebFOCUS → SQL translation strategy.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Short backend name for logs and output.
    fn name(&self) -> &'static str;

    /// Translate WebFOCUS source into SQL text.
    async fn translate(&self, source: &str) -> TranslateResult<String>;
}

/// Keyword-classifier translator. Never fails.
#[derive(Debug, Clone, Default)]
pub struct RuleTranslator {
    classifier: Classifier,
}

impl RuleTranslator {
    pub fn new(options: ClassifierOptions) -> Self {
        Self {
            classifier: Classifier::new(options),
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Strip comments, classify, and assemble.
    pub fn to_sql(&self, source: &str) -> String {
        self.classifier.accumulate(strip_comments(source)).to_sql()
    }

    /// Per-line classification of the comment-stripped source.
    pub fn explain(&self, source: &str) -> Vec<ClassifiedLine> {
        self.classifier.classify(strip_comments(source))
    }
}

#[async_trait]
impl Translator for RuleTranslator {
    fn name(&self) -> &'static str {
        "rules"
    }

    async fn translate(&self, source: &str) -> TranslateResult<String> {
        Ok(self.to_sql(source))
    }
}

/// Selectable translation backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Rules,
    Llm,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Rules => write!(f, "rules"),
            Backend::Llm => write!(f, "llm"),
        }
    }
}

/// Request front door around one translator.
pub struct Engine {
    translator: Box<dyn Translator>,
}

impl Engine {
    pub fn new(translator: Box<dyn Translator>) -> Self {
        Self { translator }
    }

    /// Build the translator for `backend` from configuration.
    ///
    /// `backend` is usually `config.backend`, possibly overridden by a flag.
    pub fn from_config(backend: Backend, config: &Config) -> TranslateResult<Self> {
        let translator: Box<dyn Translator> = match backend {
            Backend::Rules => Box::new(RuleTranslator::new(config.rules.clone())),
            Backend::Llm => Box::new(LlmTranslator::new(config.llm.clone())?),
        };
        Ok(Self::new(translator))
    }

    pub fn backend(&self) -> &'static str {
        self.translator.name()
    }

    /// Validate and translate one request.
    ///
    /// Empty or whitespace-only input is rejected with
    /// [`TranslateError::EmptyInput`] before the translator runs.
    pub async fn translate(&self, source: &str) -> TranslateResult<String> {
        if source.trim().is_empty() {
            return Err(TranslateError::EmptyInput);
        }

        let backend = self.translator.name();
        info!(backend, lines = source.lines().count(), "translating");

        match self.translator.translate(source).await {
            Ok(sql) => {
                info!(backend, "translation complete");
                Ok(sql)
            }
            Err(e) => {
                warn!(backend, "translation failed: {}", e);
                Err(e)
            }
        }
    }
}
