//! Renders a zip-of-XML document template in two strictly ordered passes.
//!
//! 1. The **image phase** replaces `{%name}` tags with inline pictures,
//!    embedding the media and wiring up relationships and content types.
//!    Tags with no usable image are removed.
//! 2. The **text phase** replaces `[name]` tags with mapped text. A tag the
//!    text map does not define is an error naming that tag.
//!
//! Both passes are pure `bytes -> bytes` functions over an in-memory copy of
//! the archive. The input is never modified and every rewritten part is
//! re-parsed from the output archive before it is returned, so a failing
//! pass can always be retried against the original bytes.

mod config;
mod container;
mod error;
mod image_phase;
mod media;
mod text_phase;
mod xml;

pub use config::{Delimiters, PartFilter, RenderConfig};
pub use error::{ContainerError, RenderError, RenderStage};
pub use image_phase::ImagePhaseOutcome;
pub use text_phase::TextPhaseOutcome;

use container::Container;
use std::borrow::Cow;
use valuer_placeholder::{ImageMap, TextMap};
use valuer_types::{ImageDecodeError, RenderResult, decode_binary_input};

/// The rendered document plus the per-image problems met on the way.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub result: RenderResult,
    pub image_errors: Vec<ImageDecodeError>,
    /// Unknown tokens that were rendered empty (lenient mode only).
    pub unknown_tokens: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    config: RenderConfig,
    strict_unknown_tokens: bool,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl TemplateRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            strict_unknown_tokens: true,
        }
    }

    /// With `false`, template tags missing from the text map render as empty
    /// text and are logged instead of failing the render.
    pub fn with_strict_unknown_tokens(mut self, strict: bool) -> Self {
        self.strict_unknown_tokens = strict;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Runs the image pass alone.
    pub fn image_phase(&self, template: &[u8], images: &ImageMap) -> Result<ImagePhaseOutcome, RenderError> {
        let template = decode_template(template, RenderStage::Image)?;
        image_phase::run(&template, images, &self.config)
    }

    /// Runs the text pass alone, normally over the image pass's output.
    pub fn text_phase(&self, document: &[u8], text: &TextMap) -> Result<TextPhaseOutcome, RenderError> {
        let document = decode_template(document, RenderStage::Text)?;
        text_phase::run(&document, text, &self.config, self.strict_unknown_tokens)
    }

    /// Renders `template` (raw bytes or a data-URI) with both passes.
    ///
    /// `replacements_count` is the number of non-empty text values plus the
    /// number of images substituted.
    pub fn render(&self, template: &[u8], text: &TextMap, images: &ImageMap) -> Result<RenderOutcome, RenderError> {
        let images_done = self.image_phase(template, images)?;
        let text_done = self.text_phase(&images_done.document, text)?;
        let result = RenderResult {
            document_bytes: text_done.document,
            replacements_count: text.non_empty_count() + images_done.images_replaced,
            images_replaced_count: images_done.images_replaced,
        };
        log::debug!(
            "Rendered document: {} bytes, {} replacement(s)",
            result.document_bytes.len(),
            result.replacements_count
        );
        Ok(RenderOutcome {
            result,
            image_errors: images_done.errors,
            unknown_tokens: text_done.unknown_tokens,
        })
    }
}

fn decode_template(input: &[u8], stage: RenderStage) -> Result<Cow<'_, [u8]>, RenderError> {
    if !input.starts_with(b"data:") {
        return Ok(Cow::Borrowed(input));
    }
    decode_binary_input(input)
        .map(Cow::Owned)
        .map_err(|e| RenderError::new(stage, format!("template data-URI could not be decoded: {e}")))
}

/// The substitutable parts of `container`, each checked for well-formedness
/// before anything is rewritten.
pub(crate) fn part_texts<'a>(
    container: &'a Container,
    config: &RenderConfig,
    stage: RenderStage,
) -> Result<Vec<(String, &'a str)>, RenderError> {
    let names: Vec<String> = container
        .names()
        .filter(|name| config.text_parts.matches(name))
        .map(str::to_string)
        .collect();
    let mut parts = Vec::with_capacity(names.len());
    for name in names {
        let Some(source) = container.text(&name).map_err(|e| e.in_stage(stage))? else {
            continue;
        };
        xml::check_well_formed(source).map_err(|message| {
            ContainerError::MalformedXml {
                part: name.clone(),
                message,
            }
            .in_stage(stage)
        })?;
        parts.push((name, source));
    }
    Ok(parts)
}

/// Re-opens a freshly written archive and re-checks the rewritten parts.
pub(crate) fn verify_parts(document: &[u8], parts: &[String], stage: RenderStage) -> Result<(), RenderError> {
    let container = Container::open(document).map_err(|e| e.in_stage(stage))?;
    for part in parts {
        let source = container
            .text(part)
            .map_err(|e| e.in_stage(stage))?
            .ok_or_else(|| RenderError::new(stage, format!("part '{part}' is missing from the output")))?;
        xml::check_well_formed(source).map_err(|message| {
            ContainerError::MalformedXml {
                part: part.clone(),
                message,
            }
            .in_stage(stage)
        })?;
    }
    Ok(())
}
