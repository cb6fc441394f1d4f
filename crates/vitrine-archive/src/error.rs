use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("archive is corrupted")]
    Corrupt,

    #[error("path traversal detected: entry '{entry}' escapes the extraction root")]
    PathTraversal { entry: PathBuf },

    #[error("malicious content detected in '{entry}'")]
    MaliciousContent { entry: PathBuf },

    #[error("entry '{entry}' is not valid UTF-8")]
    EncodingInvalid { entry: PathBuf },

    #[error("entry '{entry}' exceeds the size limit ({size} > {limit} bytes)")]
    EntryTooLarge {
        entry: PathBuf,
        size: u64,
        limit: u64,
    },

    #[error("archive exceeds the total size limit ({size} > {limit} bytes)")]
    ArchiveTooLarge { size: u64, limit: u64 },

    #[error("failed to extract '{path}': {source}")]
    ExtractionFailed { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Content- and structure-related rejections are permanent: the archive
    /// itself is at fault and retrying the same bytes can never succeed.
    pub fn is_permanent_rejection(&self) -> bool {
        matches!(
            self,
            Self::Corrupt
                | Self::PathTraversal { .. }
                | Self::MaliciousContent { .. }
                | Self::EncodingInvalid { .. }
                | Self::EntryTooLarge { .. }
                | Self::ArchiveTooLarge { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
