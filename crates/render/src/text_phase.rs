//! Second pass: replaces `[name]` tags with mapped text.

use crate::config::RenderConfig;
use crate::container::Container;
use crate::error::{RenderError, RenderStage};
use crate::xml::{self, Replacement};
use crate::{part_texts, verify_parts};
use valuer_placeholder::TextMap;

const STAGE: RenderStage = RenderStage::Text;

/// Result of the text pass.
#[derive(Debug, Clone)]
pub struct TextPhaseOutcome {
    pub document: Vec<u8>,
    /// Tag occurrences replaced from the text map.
    pub substitutions: usize,
    /// Tokens the template uses that the map does not define. Only non-empty
    /// when unknown tokens are tolerated.
    pub unknown_tokens: Vec<String>,
}

pub(crate) fn run(
    document: &[u8],
    text: &TextMap,
    config: &RenderConfig,
    strict_unknown_tokens: bool,
) -> Result<TextPhaseOutcome, RenderError> {
    let mut container = Container::open(document).map_err(|e| e.in_stage(STAGE))?;
    let open = config.text_delimiters.open.as_str();
    let close = config.text_delimiters.close.as_str();

    let mut substitutions = 0;
    let mut unknown: Vec<(String, String)> = Vec::new();
    let mut rewrites: Vec<(String, String)> = Vec::new();

    for (part, source) in part_texts(&container, config, STAGE)? {
        let paragraphs =
            xml::paragraphs(source).map_err(|message| RenderError::new(STAGE, format!("cannot read '{part}': {message}")))?;
        let mut splices = Vec::new();
        for paragraph in paragraphs {
            let tags = xml::find_tags(&paragraph.text, open, close).map_err(|partial| {
                RenderError::at(STAGE, partial.clone(), format!("tag '{partial}' in '{part}' is never closed"))
            })?;
            let edits: Vec<_> = tags
                .into_iter()
                .map(|tag| {
                    let value = match text.get(&tag.name) {
                        Some(value) => {
                            substitutions += 1;
                            value.to_string()
                        }
                        None => {
                            if !unknown.iter().any(|(name, _)| *name == tag.name) {
                                unknown.push((tag.name.clone(), part.clone()));
                            }
                            String::new()
                        }
                    };
                    (tag.range, Replacement::Text(value))
                })
                .collect();
            splices.extend(paragraph.splices(&edits));
        }
        if !splices.is_empty() {
            rewrites.push((part.clone(), xml::apply_splices(source, splices)));
        }
    }

    if let Some((first, _)) = unknown.first() {
        let listed = unknown
            .iter()
            .map(|(name, part)| format!("{open}{name}{close} ({part})"))
            .collect::<Vec<_>>()
            .join(", ");
        if strict_unknown_tokens {
            return Err(RenderError::at(
                STAGE,
                first.clone(),
                format!("template uses placeholders with no mapped value: {listed}"),
            ));
        }
        log::warn!("Rendering unknown placeholders as empty text: {listed}");
    }

    let unknown_tokens = unknown.into_iter().map(|(name, _)| name).collect();
    if rewrites.is_empty() {
        return Ok(TextPhaseOutcome {
            document: document.to_vec(),
            substitutions,
            unknown_tokens,
        });
    }

    let touched: Vec<String> = rewrites.iter().map(|(part, _)| part.clone()).collect();
    for (part, rewritten) in rewrites {
        container.put(&part, rewritten.into_bytes());
    }
    let output = container.to_bytes().map_err(|e| e.in_stage(STAGE))?;
    verify_parts(&output, &touched, STAGE)?;

    log::debug!("Text phase replaced {substitutions} tag(s) in {} part(s)", touched.len());
    Ok(TextPhaseOutcome {
        document: output,
        substitutions,
        unknown_tokens,
    })
}
