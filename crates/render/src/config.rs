/// Opening and closing markers around a placeholder name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    pub open: String,
    pub close: String,
}

impl Delimiters {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }
}

/// Selects which archive parts carry substitutable text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PartFilter {
    /// The body, headers, footers, footnotes and endnotes of a Word package.
    #[default]
    Wordprocessing,
    /// Exactly these part names.
    Named(Vec<String>),
}

impl PartFilter {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            PartFilter::Wordprocessing => {
                let Some(file) = name.strip_prefix("word/") else {
                    return false;
                };
                if file.contains('/') || !file.ends_with(".xml") {
                    return false;
                }
                file == "document.xml"
                    || file == "footnotes.xml"
                    || file == "endnotes.xml"
                    || file.starts_with("header")
                    || file.starts_with("footer")
            }
            PartFilter::Named(names) => names.iter().any(|n| n == name),
        }
    }
}

/// Token syntax and layout defaults for the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    pub text_delimiters: Delimiters,
    pub image_delimiters: Delimiters,
    /// Marks an image tag right after the opening image delimiter.
    pub image_sigil: char,
    /// Used when neither the caller nor the image header gives a size.
    pub fallback_image_size: (u32, u32),
    pub text_parts: PartFilter,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            text_delimiters: Delimiters::new("[", "]"),
            image_delimiters: Delimiters::new("{", "}"),
            image_sigil: '%',
            fallback_image_size: (300, 200),
            text_parts: PartFilter::default(),
        }
    }
}

impl RenderConfig {
    /// The full opening marker of an image tag, e.g. `{%`.
    pub fn image_open(&self) -> String {
        format!("{}{}", self.image_delimiters.open, self.image_sigil)
    }
}
