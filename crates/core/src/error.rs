use thiserror::Error;

/// Errors raised while turning a Markdown source file into an [`Article`](crate::Article).
#[derive(Debug, Error)]
pub enum FrontMatterError {
    /// The file does not open with a `---` delimited metadata block.
    #[error("Front matter not found in the markdown file.")]
    Missing,

    /// The metadata block is not valid YAML, or not a mapping.
    #[error("invalid front matter: {0}")]
    Yaml(String),

    /// A date key is present but could not be parsed.
    #[error("invalid {key} value: {value}")]
    InvalidDate {
        /// Front-matter key holding the date.
        key: &'static str,
        /// The raw value as written.
        value: String,
    },
}
