//! First pass: replaces `{%name}` tags with inline pictures.

use crate::config::RenderConfig;
use crate::container::Container;
use crate::error::{RenderError, RenderStage};
use crate::media::{self, PreparedImage};
use crate::xml::{self, Replacement};
use crate::{part_texts, verify_parts};
use std::collections::HashMap;
use valuer_placeholder::ImageMap;
use valuer_types::{ImageDecodeError, PlaceholderToken};

const STAGE: RenderStage = RenderStage::Image;
const CONTENT_TYPES: &str = "[Content_Types].xml";
/// Keeps generated drawing ids clear of the ids Word assigns itself.
const DOC_PR_BASE: u32 = 0x5641_0000;

/// Result of the image pass.
#[derive(Debug, Clone)]
pub struct ImagePhaseOutcome {
    /// The intermediate container, with no image tags left in it.
    pub document: Vec<u8>,
    /// Distinct image tokens that were substituted.
    pub images_replaced: usize,
    /// Images that could not be used; their tags were removed.
    pub errors: Vec<ImageDecodeError>,
}

/// A media part allocated for one image token.
struct Media<'a> {
    token: PlaceholderToken,
    index: usize,
    image: &'a PreparedImage,
}

impl Media<'_> {
    fn rel_id(&self) -> String {
        format!("rIdValuerImg{}", self.index)
    }

    fn file_name(&self) -> String {
        format!("valuer_image{}.{}", self.index, self.image.extension)
    }
}

pub(crate) fn run(template: &[u8], images: &ImageMap, config: &RenderConfig) -> Result<ImagePhaseOutcome, RenderError> {
    let mut container = Container::open(template).map_err(|e| e.in_stage(STAGE))?;

    let mut errors = Vec::new();
    let mut prepared: HashMap<&str, PreparedImage> = HashMap::new();
    for (token, payload) in images {
        match media::prepare(token, payload, config.fallback_image_size) {
            Ok(image) => {
                prepared.insert(token.as_str(), image);
            }
            Err(e) => {
                log::warn!("{e}");
                errors.push(e);
            }
        }
    }

    let open = config.image_open();
    let close = config.image_delimiters.close.as_str();
    let mut media: Vec<Media<'_>> = Vec::new();
    let mut placements = 0u32;
    let mut rewrites: Vec<(String, String, Vec<(String, String)>)> = Vec::new();

    for (part, source) in part_texts(&container, config, STAGE)? {
        let mut splices = Vec::new();
        let mut relationships: Vec<(String, String)> = Vec::new();
        let paragraphs =
            xml::paragraphs(source).map_err(|message| RenderError::new(STAGE, format!("cannot read '{part}': {message}")))?;

        for paragraph in paragraphs {
            let tags = xml::find_tags(&paragraph.text, &open, close).map_err(|partial| {
                RenderError::at(STAGE, partial.clone(), format!("image tag '{partial}' in '{part}' is never closed"))
            })?;
            let mut edits = Vec::with_capacity(tags.len());
            for tag in tags {
                let token = PlaceholderToken::new(&tag.name);
                let Some(image) = prepared.get(token.as_str()) else {
                    log::debug!("No usable image for '{token}' in '{part}'; removing the tag");
                    edits.push((tag.range, Replacement::Text(String::new())));
                    continue;
                };
                let slot = match media.iter().position(|m| m.token == token) {
                    Some(i) => i,
                    None => {
                        let index = next_media_index(&container, media.last().map_or(1, |m| m.index + 1));
                        media.push(Media {
                            token: token.clone(),
                            index,
                            image,
                        });
                        media.len() - 1
                    }
                };
                let entry = &media[slot];
                let rel_id = entry.rel_id();
                if !relationships.iter().any(|(id, _)| *id == rel_id) {
                    relationships.push((rel_id.clone(), media_target(&part, &entry.file_name())));
                }
                placements += 1;
                let markup = media::drawing_markup(image, &rel_id, DOC_PR_BASE + placements, token.as_str());
                edits.push((tag.range, Replacement::Raw(markup)));
            }
            splices.extend(paragraph.splices(&edits));
        }

        if !splices.is_empty() {
            rewrites.push((part.clone(), xml::apply_splices(source, splices), relationships));
        }
    }

    if rewrites.is_empty() {
        log::debug!("Template has no image tags; image phase skipped");
        return Ok(ImagePhaseOutcome {
            document: template.to_vec(),
            images_replaced: 0,
            errors,
        });
    }

    let mut touched = Vec::new();
    let media_entries: Vec<(String, Vec<u8>, &'static str, &'static str)> = media
        .iter()
        .map(|m| {
            (
                format!("word/media/{}", m.file_name()),
                m.image.payload.bytes.to_vec(),
                m.image.extension,
                m.image.content_type,
            )
        })
        .collect();
    let images_replaced = media.len();

    for (part, rewritten, relationships) in rewrites {
        container.put(&part, rewritten.into_bytes());
        if !relationships.is_empty() {
            let rels_name = xml::rels_path(&part);
            let existing = container.text(&rels_name).map_err(|e| e.in_stage(STAGE))?;
            let rels = media::add_relationships(existing, &relationships)
                .map_err(|message| RenderError::new(STAGE, format!("'{rels_name}': {message}")))?;
            container.put(&rels_name, rels.into_bytes());
            touched.push(rels_name);
        }
        touched.push(part);
    }

    let mut content_types: Vec<(&str, &str)> = Vec::new();
    for (name, bytes, extension, mime) in media_entries {
        container.put(&name, bytes);
        if !content_types.iter().any(|(ext, _)| *ext == extension) {
            content_types.push((extension, mime));
        }
    }
    let types = container
        .text(CONTENT_TYPES)
        .map_err(|e| e.in_stage(STAGE))?
        .ok_or_else(|| RenderError::new(STAGE, "package has no [Content_Types].xml"))?;
    let types = media::add_content_types(types, &content_types).map_err(|message| RenderError::new(STAGE, message))?;
    container.put(CONTENT_TYPES, types.into_bytes());
    touched.push(CONTENT_TYPES.to_string());

    let document = container.to_bytes().map_err(|e| e.in_stage(STAGE))?;
    verify_parts(&document, &touched, STAGE)?;

    log::debug!("Image phase embedded {images_replaced} image(s) in {placements} place(s)");
    Ok(ImagePhaseOutcome {
        document,
        images_replaced,
        errors,
    })
}

/// The first media index at or after `from` that no existing part uses.
fn next_media_index(container: &Container, from: usize) -> usize {
    let mut index = from;
    loop {
        let prefix = format!("word/media/valuer_image{index}.");
        if !container.names().any(|name| name.starts_with(&prefix)) {
            return index;
        }
        index += 1;
    }
}

/// Relationship target of a media file, relative to the part when it lives
/// in `word/`.
fn media_target(part: &str, file_name: &str) -> String {
    match part.rsplit_once('/') {
        Some(("word", _)) => format!("media/{file_name}"),
        _ => format!("/word/media/{file_name}"),
    }
}
