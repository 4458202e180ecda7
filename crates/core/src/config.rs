use valuer_render::RenderConfig;

/// Engine knobs for report assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyConfig {
    pub render: RenderConfig,
    /// Fail when the template uses a token nothing maps. Switch off while
    /// authoring templates to see partial output instead.
    pub strict_unknown_tokens: bool,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            render: RenderConfig::default(),
            strict_unknown_tokens: true,
        }
    }
}
