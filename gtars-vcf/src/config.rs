//! Reader and writer options.
//!
//! With the `serde` feature both option sets can be loaded from a TOML file
//! laid out as
//!
//! ```toml
//! [reader]
//! buffer_capacity = 1048576
//! defer_info = true
//!
//! [writer]
//! vcf_format = "4.1"
//! compression_level = 9
//! ```

use crate::consts::DEFAULT_BUFFER_CAPACITY;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReaderOptions {
    /// Capacity of the buffered reader, in bytes.
    pub buffer_capacity: usize,
    /// Keep single-ALT INFO columns as raw text until a key is read.
    pub defer_info: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            defer_info: true,
        }
    }
}

impl ReaderOptions {
    pub fn with_buffer_capacity(mut self, buffer_capacity: usize) -> Self {
        self.buffer_capacity = buffer_capacity;
        self
    }

    pub fn with_defer_info(mut self, defer_info: bool) -> Self {
        self.defer_info = defer_info;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WriterOptions {
    /// Version written to `##fileformat`; `None` keeps the schema's.
    pub vcf_format: Option<String>,
    /// gzip level (0-9) used for `.gz` outputs.
    pub compression_level: u32,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            vcf_format: None,
            compression_level: 6,
        }
    }
}

impl WriterOptions {
    pub fn with_vcf_format(mut self, vcf_format: impl Into<String>) -> Self {
        self.vcf_format = Some(vcf_format.into());
        self
    }

    pub fn with_compression_level(mut self, compression_level: u32) -> Self {
        self.compression_level = compression_level.min(9);
        self
    }
}

#[cfg(feature = "serde")]
pub use self::file::{ConfigError, VcfConfig};

#[cfg(feature = "serde")]
mod file {
    use std::fs::read_to_string;
    use std::path::Path;

    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    use super::{ReaderOptions, WriterOptions};

    #[derive(Deserialize, Serialize, Debug, Default, PartialEq)]
    #[serde(default)]
    pub struct VcfConfig {
        pub reader: ReaderOptions,
        pub writer: WriterOptions,
    }

    #[derive(Error, Debug)]
    pub enum ConfigError {
        #[error(transparent)]
        Io(#[from] std::io::Error),
        #[error(transparent)]
        Toml(#[from] toml::de::Error),
    }

    impl TryFrom<&Path> for VcfConfig {
        type Error = ConfigError;

        fn try_from(path: &Path) -> Result<Self, Self::Error> {
            let toml_str = read_to_string(path)?;
            let config = toml::from_str(&toml_str)?;
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn test_defaults() {
        let reader = ReaderOptions::default();
        assert_eq!(reader.buffer_capacity, 256 * 1024);
        assert!(reader.defer_info);
        let writer = WriterOptions::default().with_compression_level(12);
        assert_eq!(writer.compression_level, 9);
        assert_eq!(writer.vcf_format, None);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn test_try_from_toml() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[reader]\ndefer_info = false\n\n[writer]\nvcf_format = \"4.1\"").unwrap();
        let config = VcfConfig::try_from(file.path()).unwrap();
        assert_eq!(config.reader, ReaderOptions::default().with_defer_info(false));
        assert_eq!(config.writer.vcf_format.as_deref(), Some("4.1"));
        assert_eq!(config.writer.compression_level, 6);
    }
}
