use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("template '{name}' not found")]
    TemplateMissing { name: String },

    #[error("template render failed: {source}")]
    Render {
        #[source]
        source: tera::Error,
    },

    #[error("failed to read '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },
}

pub type Result<T> = std::result::Result<T, Error>;
