use thiserror::Error;

/// Template parse error. Offsets are byte positions in the source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// `{{` without a matching `}}`.
    #[error("unclosed tag at offset {offset}")]
    UnclosedTag { offset: usize },

    /// `{{}}` or a tag containing only whitespace.
    #[error("empty tag at offset {offset}")]
    EmptyTag { offset: usize },

    /// A block opened but never closed.
    #[error("unclosed #{block} block opened at offset {offset}")]
    UnclosedBlock { block: &'static str, offset: usize },

    /// A closing tag or `{{else}}` with no matching open block.
    #[error("unexpected {{{{{tag}}}}} at offset {offset}")]
    UnexpectedTag { tag: String, offset: usize },

    /// A block opened inside a block of the same kind.
    #[error("nested #{block} block at offset {offset}")]
    NestedBlock { block: &'static str, offset: usize },

    /// An `#if` whose condition is not `path == literal`.
    #[error("malformed condition '{condition}' at offset {offset}")]
    InvalidCondition { condition: String, offset: usize },

    /// A `#name` block helper this engine does not know.
    #[error("unknown block helper '#{helper}' at offset {offset}")]
    UnknownHelper { helper: String, offset: usize },
}

impl TemplateError {
    /// Returns the byte offset the error was detected at.
    pub fn offset(&self) -> usize {
        match self {
            Self::UnclosedTag { offset }
            | Self::EmptyTag { offset }
            | Self::UnclosedBlock { offset, .. }
            | Self::UnexpectedTag { offset, .. }
            | Self::NestedBlock { offset, .. }
            | Self::InvalidCondition { offset, .. }
            | Self::UnknownHelper { offset, .. } => *offset,
        }
    }
}
