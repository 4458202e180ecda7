//! Runs report requests through the assembly flow.

use crate::config::AssemblyConfig;
use crate::error::AssemblyError;
use crate::flow::{AssemblyFailure, Flow};
use crate::request::{AssemblyReport, AssemblyRequest, TemplateInput};
use indexmap::IndexMap;
use std::sync::Arc;
use valuer_executor::ExecutorImpl;
use valuer_merge::{DataMerger, MergedData};
use valuer_placeholder::{ImageInput, map_images, map_text};
use valuer_render::{RenderConfig, RenderOutcome, TemplateRenderer};
use valuer_schema::{FieldStatus, SchemaModel, ValidationWarning, Validator};
use valuer_source::{DataSource, SourceStack};
use valuer_traits::{ConfigStore, Executor, InMemoryConfigStore, SharedDocument};
use valuer_types::{ImageSlot, PlaceholderToken, RenderResult};

/// Assembles valuation reports from stored configuration and caller data.
///
/// Holds no per-request state; one assembler can serve any number of
/// requests, concurrently or not.
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    store: Arc<dyn ConfigStore>,
    config: AssemblyConfig,
    executor: ExecutorImpl,
}

/// Configuration documents read for one request.
struct Inputs {
    model: SchemaModel,
    template: SharedDocument,
    slots: Vec<ImageSlot>,
}

impl ReportAssembler {
    pub fn builder() -> ReportAssemblerBuilder {
        ReportAssemblerBuilder::default()
    }

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn ConfigStore {
        self.store.as_ref()
    }

    fn renderer(&self) -> TemplateRenderer {
        TemplateRenderer::new(self.config.render.clone()).with_strict_unknown_tokens(self.config.strict_unknown_tokens)
    }

    /// Runs one request to `Done` or `Failed`.
    pub fn assemble(&self, request: AssemblyRequest) -> Result<AssemblyReport, AssemblyFailure> {
        let mut flow = Flow::start(request.label());
        let AssemblyRequest {
            schema_key,
            template,
            image_config_key,
            sources,
            images,
        } = request;

        flow.advance();
        let inputs = match self.load_inputs(&schema_key, template, image_config_key.as_deref()) {
            Ok(inputs) => inputs,
            Err(e) => return Err(flow.fail(e)),
        };

        flow.advance();
        let validator = Validator::build(&inputs.model);
        let mut warnings = validate_sources(&validator, &sources);

        flow.advance();
        let merged = match DataMerger::new().merge(&SourceStack::from(sources), &inputs.model) {
            Ok(merged) => merged,
            Err(e) => return Err(flow.fail(e)),
        };
        for path in validator.missing_required(merged.value()) {
            warnings.push(ValidationWarning {
                source: None,
                path,
                status: FieldStatus::Constraint("required field has no value".to_string()),
            });
        }
        for warning in &warnings {
            log::warn!("{warning}");
        }

        flow.advance();
        let text = map_text(&merged, &inputs.model);
        let (image_map, mut image_errors) = map_images(&inputs.slots, &images);
        flow.progress.text_replacements = text.non_empty_count();

        flow.advance();
        let renderer = self.renderer();
        let image_pass = match renderer.image_phase(&inputs.template, &image_map) {
            Ok(pass) => pass,
            Err(e) => return Err(flow.fail(e)),
        };
        flow.progress.images_replaced = image_pass.images_replaced;
        image_errors.extend(image_pass.errors);
        let text_pass = match renderer.text_phase(&image_pass.document, &text) {
            Ok(pass) => pass,
            Err(e) => return Err(flow.fail(e)),
        };

        let result = RenderResult {
            document_bytes: text_pass.document,
            replacements_count: flow.progress.text_replacements + flow.progress.images_replaced,
            images_replaced_count: flow.progress.images_replaced,
        };
        log::info!(
            "Assembled report from '{schema_key}': {} replacement(s), {} image(s), {} warning(s)",
            result.replacements_count,
            result.images_replaced_count,
            warnings.len()
        );

        Ok(AssemblyReport {
            result,
            warnings,
            image_errors,
            schema_issues: inputs.model.issues().to_vec(),
            unknown_tokens: text_pass.unknown_tokens,
            merged,
            transitions: flow.finish(),
        })
    }

    /// Runs independent requests through the configured executor. Results
    /// come back in request order.
    pub fn assemble_all(&self, requests: Vec<AssemblyRequest>) -> Vec<Result<AssemblyReport, AssemblyFailure>> {
        log::debug!(
            "Assembling {} report(s) on {} (parallelism {})",
            requests.len(),
            self.executor.name(),
            self.executor.parallelism()
        );
        let worker = self.clone();
        self.executor.execute_all(requests, move |request| worker.assemble(request))
    }

    /// Renders already merged data, skipping load, validation and merge.
    /// Used to re-render a saved report; given the same image-size table it
    /// produces the same document as [`Self::assemble`].
    pub fn render_merged(
        &self,
        model: &SchemaModel,
        template: &[u8],
        merged: &MergedData,
        slots: &[ImageSlot],
        images: &IndexMap<PlaceholderToken, ImageInput>,
    ) -> Result<RenderOutcome, AssemblyError> {
        let text = map_text(merged, model);
        let (image_map, mut image_errors) = map_images(slots, images);
        let mut outcome = self.renderer().render(template, &text, &image_map)?;
        image_errors.append(&mut outcome.image_errors);
        outcome.image_errors = image_errors;
        Ok(outcome)
    }

    fn load_inputs(
        &self,
        schema_key: &str,
        template: TemplateInput,
        image_config_key: Option<&str>,
    ) -> Result<Inputs, AssemblyError> {
        let raw = self.store.read_json(schema_key)?;
        let model = SchemaModel::parse(&raw)?;

        let template = match template {
            TemplateInput::Key(key) => self.store.read_document(&key)?,
            TemplateInput::Inline(bytes) => Arc::new(bytes),
        };

        let slots = match image_config_key {
            Some(key) => {
                let document = self.store.read_document(key)?;
                serde_json::from_slice::<Vec<ImageSlot>>(&document)
                    .map_err(|e| AssemblyError::config_load(format!("image size table '{key}'"), e))?
            }
            None => Vec::new(),
        };

        log::debug!(
            "Loaded schema '{schema_key}' ({} leaves), template ({} bytes), {} image slot(s)",
            model.leaf_count(),
            template.len(),
            slots.len()
        );
        Ok(Inputs { model, template, slots })
    }
}

/// Checks every source on its own. Missing values are expected in partial
/// sources and are not reported.
fn validate_sources(validator: &Validator, sources: &[DataSource]) -> Vec<ValidationWarning> {
    sources
        .iter()
        .filter(|source| source.is_usable())
        .flat_map(|source| validator.check(source.value()).into_warnings(Some(source.name())))
        .collect()
}

/// Builder for [`ReportAssembler`].
#[derive(Debug, Default)]
pub struct ReportAssemblerBuilder {
    store: Option<Arc<dyn ConfigStore>>,
    config: AssemblyConfig,
    executor: Option<ExecutorImpl>,
}

impl ReportAssemblerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Where schemas, templates and image-size tables are read from.
    pub fn with_store(mut self, store: impl ConfigStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    pub fn with_shared_store(mut self, store: Arc<dyn ConfigStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_config(mut self, config: AssemblyConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_render_config(mut self, render: RenderConfig) -> Self {
        self.config.render = render;
        self
    }

    pub fn with_strict_unknown_tokens(mut self, strict: bool) -> Self {
        self.config.strict_unknown_tokens = strict;
        self
    }

    /// Selects how [`ReportAssembler::assemble_all`] spreads requests.
    pub fn with_executor(mut self, executor: ExecutorImpl) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Shorthand for [`ExecutorImpl::with_workers`].
    pub fn with_workers(self, workers: usize) -> Self {
        self.with_executor(ExecutorImpl::with_workers(workers))
    }

    pub fn build(self) -> ReportAssembler {
        let store = self.store.unwrap_or_else(|| {
            log::debug!("No configuration store given; using an empty in-memory store");
            Arc::new(InMemoryConfigStore::new())
        });
        ReportAssembler {
            store,
            config: self.config,
            executor: self.executor.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::FlowState;
    use serde_json::json;
    use valuer_traits::SyncExecutor;

    fn store() -> InMemoryConfigStore {
        let store = InMemoryConfigStore::new();
        store
            .add_json(
                "schema.json",
                &json!({
                    "ownerName": { "placeholder": "owner_name", "validation": { "required": true } },
                    "landArea": { "placeholder": "land_area", "type": "number" }
                }),
            )
            .unwrap();
        store.add("bad-sizes.json", b"{ not json".to_vec()).unwrap();
        store
    }

    fn assembler() -> ReportAssembler {
        ReportAssembler::builder()
            .with_store(store())
            .with_executor(ExecutorImpl::Sync(SyncExecutor::new()))
            .build()
    }

    #[test]
    fn missing_schema_fails_while_loading() {
        let failure = assembler()
            .assemble(AssemblyRequest::new("nope.json", TemplateInput::Inline(Vec::new())))
            .unwrap_err();
        assert_eq!(failure.failed_in, FlowState::LoadingInputs);
        assert!(matches!(&failure.error, AssemblyError::ConfigLoad { resource, .. } if resource == "nope.json"));
        assert_eq!(failure.transitions, vec![FlowState::Idle, FlowState::LoadingInputs, FlowState::Failed]);
    }

    #[test]
    fn missing_template_key_fails_while_loading() {
        let failure = assembler()
            .assemble(AssemblyRequest::new("schema.json", TemplateInput::Key("templates/missing.docx".into())))
            .unwrap_err();
        assert_eq!(failure.failed_in, FlowState::LoadingInputs);
        assert!(failure.to_string().contains("templates/missing.docx"));
    }

    #[test]
    fn unreadable_image_table_names_the_document() {
        let failure = assembler()
            .assemble(
                AssemblyRequest::new("schema.json", TemplateInput::Inline(Vec::new())).with_image_config("bad-sizes.json"),
            )
            .unwrap_err();
        assert!(matches!(&failure.error, AssemblyError::ConfigLoad { resource, .. } if resource.contains("bad-sizes.json")));
    }

    #[test]
    fn render_failure_keeps_mapped_counts() {
        let failure = assembler()
            .assemble(
                AssemblyRequest::new("schema.json", TemplateInput::Inline(b"not a zip".to_vec()))
                    .with_source(DataSource::draft(json!({ "ownerName": "Jane", "landArea": "650" }))),
            )
            .unwrap_err();
        assert_eq!(failure.failed_in, FlowState::Rendering);
        assert_eq!(failure.progress.text_replacements, 2);
        assert_eq!(failure.progress.images_replaced, 0);
        assert_eq!(failure.error.kind(), "render");
    }

    #[test]
    fn batch_results_keep_request_order() {
        let results = assembler().assemble_all(vec![
            AssemblyRequest::new("a.json", TemplateInput::Inline(Vec::new())),
            AssemblyRequest::new("schema.json", TemplateInput::Inline(Vec::new())),
        ]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap_err().failed_in, FlowState::LoadingInputs);
        assert_eq!(results[1].as_ref().unwrap_err().failed_in, FlowState::Rendering);
    }
}
