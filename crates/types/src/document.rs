use crate::data_uri::DataUri;

/// MIME type of the word-processing packages the renderer produces.
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// The rendered document together with its business counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderResult {
    pub document_bytes: Vec<u8>,
    /// Non-empty text leaves plus successfully substituted images.
    pub replacements_count: usize,
    pub images_replaced_count: usize,
}

impl RenderResult {
    /// The number of replacements contributed by text leaves alone.
    pub fn text_replacements(&self) -> usize {
        self.replacements_count.saturating_sub(self.images_replaced_count)
    }

    pub fn to_data_uri(&self) -> String {
        DataUri::encode(DOCX_MIME, &self.document_bytes)
    }
}
