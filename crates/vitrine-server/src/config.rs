use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Hard cap on a theme upload body. Multipart framing overhead is small,
/// so this is effectively the archive size limit as well.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub themes_root: PathBuf,
    pub bind_addr: SocketAddr,
    pub max_upload_bytes: usize,
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let themes_root = env::var("THEMES_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./themes"));
        let bind_addr = env::var("VITRINE_ADDR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8080)));
        let max_upload_bytes = env_usize("VITRINE_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES);

        Self {
            themes_root,
            bind_addr,
            max_upload_bytes,
        }
    }
}
