//! Field compiler: orchestrates one field's compilation against one entry.
//!
//! Pipeline order per (field, entry) pair: build context document, apply
//! the configured stylesheet, evaluate the configured expression, run the
//! result through the field's value formatter, write the formatted value
//! back into entry storage. A manually entered value on an override field
//! short-circuits the whole pipeline.

use crate::document::{BuildOptions, ContextDocumentBuilder};
use crate::error::ReflectionResult;
use crate::expression::Evaluator;
use crate::host::HostServices;
use crate::model::{Entry, ReflectionConfig};
use crate::transform::TransformStage;
use std::sync::Arc;

/// Where a compilation ended for one (field, entry) pair.
///
/// The full progression is `Uncompiled -> DocumentBuilt ->
/// Transformed | Untransformed -> Evaluated | SkippedNoExpression ->
/// WrittenBack`; a report only carries the terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileState {
    /// An override field with a manually entered value; nothing was built
    /// or written.
    ManualPreserved,
    /// The computed value was written back into entry storage.
    WrittenBack,
}

#[derive(Debug, Clone)]
pub struct CompileReport {
    pub field_id: u64,
    pub state: CompileState,
    /// Whether the stylesheet stage actually produced a transformed
    /// document (false on pass-through or when no stylesheet is set).
    pub transformed: bool,
    /// Whether an expression was evaluated (false when the field has none).
    pub evaluated: bool,
    /// The value written back, absent for `ManualPreserved`.
    pub value: Option<String>,
}

pub struct FieldCompiler {
    host: Arc<HostServices>,
    transform: TransformStage,
    evaluator: Evaluator,
}

impl FieldCompiler {
    pub fn new(host: Arc<HostServices>) -> Self {
        let transform = TransformStage::new(&host.stylesheet_dir);
        let evaluator = Evaluator::new(host.functions.clone());
        Self {
            host,
            transform,
            evaluator,
        }
    }

    /// Compile one reflection field against one entry.
    ///
    /// Document build failures and expression failures propagate to the
    /// caller without any write-back; they are scoped to this field only
    /// and must not stop sibling fields.
    pub fn compile(
        &self,
        config: &ReflectionConfig,
        entry: &Entry,
    ) -> ReflectionResult<CompileReport> {
        if config.override_manual.is_yes() && entry.value(config.field_id).is_some() {
            log::debug!(
                "field {} on entry {} has a manual value and override is set, preserving",
                config.field_id,
                entry.id
            );
            return Ok(CompileReport {
                field_id: config.field_id,
                state: CompileState::ManualPreserved,
                transformed: false,
                evaluated: false,
                value: None,
            });
        }

        let options = BuildOptions::new(
            &self.host.entry_handle,
            config.fetch_associated_counts.is_yes(),
        );
        let document = ContextDocumentBuilder::new(self.host.as_ref()).build(entry, &options)?;

        let (document, transformed) = match self
            .transform
            .try_apply(&document, config.xslt_file.as_deref())
        {
            Some(doc) => (doc, true),
            None => (document, false),
        };

        // A field without an expression deterministically compiles to the
        // empty string.
        let (raw_value, evaluated) = match config.expression.as_deref() {
            Some(expression) if !expression.is_empty() => {
                let value = self.evaluator.evaluate(&document, expression)?;
                (value.string_value(&document), true)
            }
            _ => (String::new(), false),
        };

        let formatted = self
            .host
            .value_formatters
            .apply(config.formatter.as_deref(), &raw_value);

        self.host
            .entries
            .write_value(entry.id, config.field_id, &formatted)?;

        Ok(CompileReport {
            field_id: config.field_id,
            state: CompileState::WrittenBack,
            transformed,
            evaluated,
            value: Some(formatted),
        })
    }
}
