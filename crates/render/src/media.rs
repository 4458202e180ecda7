//! Image probing, sizing and the package plumbing an embedded image needs.

use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use valuer_types::{ImageDecodeError, ImagePayload, PlaceholderToken};

/// English Metric Units per CSS pixel (96 dpi).
pub(crate) const EMU_PER_PX: u64 = 9525;

const RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const IMAGE_REL_TYPE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// An image that passed format detection, with its final size in pixels.
#[derive(Debug, Clone)]
pub(crate) struct PreparedImage {
    pub payload: ImagePayload,
    pub extension: &'static str,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Detects the format and resolves the display size of one image.
///
/// An unrecognised format is an error for the slot. A recognised format whose
/// header cannot be read still renders, at the fallback size.
pub(crate) fn prepare(
    token: &PlaceholderToken,
    payload: &ImagePayload,
    fallback: (u32, u32),
) -> Result<PreparedImage, ImageDecodeError> {
    let format = image::guess_format(&payload.bytes)
        .map_err(|_| ImageDecodeError::new(token.clone(), "unrecognised image format"))?;
    let (extension, content_type) = match format {
        ImageFormat::Png => ("png", "image/png"),
        ImageFormat::Jpeg => ("jpeg", "image/jpeg"),
        ImageFormat::Gif => ("gif", "image/gif"),
        ImageFormat::Bmp => ("bmp", "image/bmp"),
        ImageFormat::Tiff => ("tiff", "image/tiff"),
        other => {
            return Err(ImageDecodeError::new(
                token.clone(),
                format!("{other:?} images cannot be embedded in a document"),
            ));
        }
    };

    let measured = read_dimensions(&payload.bytes);
    if measured.is_none() {
        log::warn!("Could not read the header of image '{token}'; using the fallback size");
    }
    let (width, height) = resolve_size((payload.width, payload.height), measured, fallback);
    Ok(PreparedImage {
        payload: payload.clone(),
        extension,
        content_type,
        width,
        height,
    })
}

fn read_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format().ok()?;
    reader
        .into_dimensions()
        .ok()
        .filter(|(w, h)| *w > 0 && *h > 0)
}

/// Caller width and height win; one caller dimension keeps the image's
/// aspect ratio; otherwise the measured size; otherwise the fallback.
pub(crate) fn resolve_size(
    caller: (Option<u32>, Option<u32>),
    measured: Option<(u32, u32)>,
    fallback: (u32, u32),
) -> (u32, u32) {
    let (ratio_w, ratio_h) = measured.unwrap_or(fallback);
    let scale = |value: u32, num: u32, den: u32| -> u32 {
        ((f64::from(value) * f64::from(num) / f64::from(den.max(1))).round() as u32).max(1)
    };
    match caller {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, scale(w, ratio_h, ratio_w)),
        (None, Some(h)) => (scale(h, ratio_w, ratio_h), h),
        (None, None) => (ratio_w, ratio_h),
    }
}

/// Inline drawing markup for one placement. Spliced into a `<w:t>`, so it
/// closes the current text and run first and reopens them afterwards.
pub(crate) fn drawing_markup(image: &PreparedImage, rel_id: &str, doc_pr_id: u32, name: &str) -> String {
    let cx = u64::from(image.width) * EMU_PER_PX;
    let cy = u64::from(image.height) * EMU_PER_PX;
    let name = quick_xml::escape::escape(name);
    format!(
        concat!(
            "</w:t></w:r><w:r><w:drawing>",
            "<wp:inline distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\" ",
            "xmlns:wp=\"http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing\">",
            "<wp:extent cx=\"{cx}\" cy=\"{cy}\"/>",
            "<wp:docPr id=\"{id}\" name=\"{name}\"/>",
            "<a:graphic xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\">",
            "<a:graphicData uri=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
            "<pic:pic xmlns:pic=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
            "<pic:nvPicPr><pic:cNvPr id=\"0\" name=\"{name}\"/><pic:cNvPicPr/></pic:nvPicPr>",
            "<pic:blipFill><a:blip r:embed=\"{rel}\" ",
            "xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\"/>",
            "<a:stretch><a:fillRect/></a:stretch></pic:blipFill>",
            "<pic:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>",
            "<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr>",
            "</pic:pic></a:graphicData></a:graphic></wp:inline>",
            "</w:drawing></w:r><w:r><w:t xml:space=\"preserve\">"
        ),
        cx = cx,
        cy = cy,
        id = doc_pr_id,
        name = name,
        rel = rel_id,
    )
}

/// Adds image relationships to a part's `.rels` document, creating it when
/// the part had none. `targets` are `(relationship id, target)` pairs.
pub(crate) fn add_relationships(existing: Option<&str>, targets: &[(String, String)]) -> Result<String, String> {
    let mut entries = String::new();
    for (id, target) in targets {
        entries.push_str(&format!(
            "<Relationship Id=\"{id}\" Type=\"{IMAGE_REL_TYPE}\" Target=\"{target}\"/>"
        ));
    }
    match existing {
        None => Ok(format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<Relationships xmlns=\"{RELS_NS}\">{entries}</Relationships>"
        )),
        Some(rels) => insert_before_close(rels, "Relationships", &entries)
            .ok_or_else(|| "relationships part has no <Relationships> root".to_string()),
    }
}

/// Registers a default content type for each `(extension, mime)` pair the
/// package does not declare yet.
pub(crate) fn add_content_types(types: &str, defaults: &[(&str, &str)]) -> Result<String, String> {
    let lowered = types.to_ascii_lowercase();
    let mut entries = String::new();
    for (extension, mime) in defaults {
        let declared = format!("extension=\"{}\"", extension.to_ascii_lowercase());
        if lowered.contains(&declared) {
            continue;
        }
        entries.push_str(&format!("<Default Extension=\"{extension}\" ContentType=\"{mime}\"/>"));
    }
    if entries.is_empty() {
        return Ok(types.to_string());
    }
    insert_before_close(types, "Types", &entries).ok_or_else(|| "[Content_Types].xml has no <Types> root".to_string())
}

/// Inserts `markup` as the last children of the root element `root`,
/// expanding a self-closing root if needed.
fn insert_before_close(xml: &str, root: &str, markup: &str) -> Option<String> {
    let close = format!("</{root}>");
    if let Some(at) = xml.rfind(&close) {
        return Some(format!("{}{markup}{}", &xml[..at], &xml[at..]));
    }
    let open = xml.find(&format!("<{root}"))?;
    let end = open + xml[open..].find("/>")?;
    Some(format!("{}>{markup}{close}{}", &xml[..end], &xml[end + 2..]))
}
