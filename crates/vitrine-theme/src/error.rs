use std::io;

use crate::validate::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Archive(#[from] vitrine_archive::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("theme '{id}' already exists")]
    Conflict { id: String },

    #[error("theme '{id}' not found")]
    NotFound { id: String },

    #[error("invalid theme id '{id}': expected lowercase letters, digits and dashes")]
    InvalidId { id: String },

    #[error("theme registry is corrupted: {source}")]
    Registry {
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Render(#[from] vitrine_render::Error),

    #[error(transparent)]
    Fs(#[from] vitrine_fs::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Rejections caused by the archive or its structure; retrying the same
    /// upload can never succeed, unlike an I/O failure.
    pub fn is_permanent_rejection(&self) -> bool {
        match self {
            Self::Archive(e) => e.is_permanent_rejection(),
            Self::Validation(_) | Self::Conflict { .. } | Self::InvalidId { .. } => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
