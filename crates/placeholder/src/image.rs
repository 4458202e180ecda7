use indexmap::IndexMap;
use valuer_types::{
    DataUriError, ImageDecodeError, ImagePayload, ImageSlot, PlaceholderToken, decode_base64_text,
    decode_binary_input,
};

/// An image as supplied by a caller: raw bytes, or text holding a data-URI
/// or bare base64.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    Bytes(Vec<u8>),
    Text(String),
}

impl ImageInput {
    fn decode(&self) -> Result<Vec<u8>, DataUriError> {
        match self {
            ImageInput::Bytes(bytes) => decode_binary_input(bytes),
            ImageInput::Text(text) => decode_base64_text(text),
        }
    }
}

impl From<Vec<u8>> for ImageInput {
    fn from(bytes: Vec<u8>) -> Self {
        ImageInput::Bytes(bytes)
    }
}

impl From<String> for ImageInput {
    fn from(text: String) -> Self {
        ImageInput::Text(text)
    }
}

impl From<&str> for ImageInput {
    fn from(text: &str) -> Self {
        ImageInput::Text(text.to_string())
    }
}

/// `token -> decoded image` for every image the renderer should place.
pub type ImageMap = IndexMap<PlaceholderToken, ImagePayload>;

/// Pairs the image-size table with the images a caller provided.
///
/// Slots without a provided image are left out, so the renderer removes
/// their tags. Images without a slot are still mapped, without a caller
/// size. Images that fail to decode are reported and left out.
pub fn map_images(
    slots: &[ImageSlot],
    provided: &IndexMap<PlaceholderToken, ImageInput>,
) -> (ImageMap, Vec<ImageDecodeError>) {
    let mut sizes: IndexMap<&PlaceholderToken, (Option<u32>, Option<u32>)> = IndexMap::new();
    for slot in slots {
        if sizes.contains_key(&slot.placeholder) {
            log::warn!("Image slot '{}' is configured twice; using the first entry", slot.placeholder);
            continue;
        }
        sizes.insert(&slot.placeholder, (slot.width, slot.height));
    }

    let mut images = ImageMap::new();
    let mut errors = Vec::new();

    // Table order first, then images the table does not mention.
    let ordered = sizes
        .keys()
        .filter_map(|token| provided.get_key_value(token.as_str()))
        .chain(provided.iter().filter(|(token, _)| !sizes.contains_key(token)));

    for (token, input) in ordered {
        match input.decode() {
            Ok(bytes) if bytes.is_empty() => {
                errors.push(ImageDecodeError::new(token.clone(), "image is empty"));
            }
            Ok(bytes) => {
                let (width, height) = sizes.get(token).copied().unwrap_or_default();
                images.insert(token.clone(), ImagePayload::new(bytes).with_size(width, height));
            }
            Err(e) => errors.push(ImageDecodeError::new(token.clone(), e.to_string())),
        }
    }

    for error in &errors {
        log::warn!("{error}");
    }
    for token in sizes.keys().filter(|t| !images.contains_key(t.as_str())) {
        log::debug!("No image provided for slot '{token}'");
    }
    (images, errors)
}
