/// Limits applied while extracting a theme archive.
///
/// The upload layer caps the compressed size before the pipeline runs;
/// these caps bound the *decompressed* output so a small archive cannot
/// expand into an unbounded write (zip bomb).
#[derive(Clone, Copy, Debug)]
pub struct ExtractOptions {
    pub max_entry_bytes: u64,
    pub max_total_bytes: u64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_entry_bytes: 5 * 1024 * 1024,
            max_total_bytes: 20 * 1024 * 1024,
        }
    }
}

impl ExtractOptions {
    pub fn max_entry_bytes(mut self, bytes: u64) -> Self {
        self.max_entry_bytes = bytes;
        self
    }

    pub fn max_total_bytes(mut self, bytes: u64) -> Self {
        self.max_total_bytes = bytes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_pattern() {
        let options = ExtractOptions::default()
            .max_entry_bytes(1024)
            .max_total_bytes(4096);
        assert_eq!(options.max_entry_bytes, 1024);
        assert_eq!(options.max_total_bytes, 4096);
    }
}
