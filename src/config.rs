use crate::error::{Error, Result};

/// log2 of the default table capacity (131072 slots).
pub const DEFAULT_TABLE_BITS: u32 = 17;
pub const MIN_TABLE_BITS: u32 = 4;
pub const MAX_TABLE_BITS: u32 = 28;

/// Bytes requested per positioned read.
pub const DEFAULT_BLOCK_SIZE: usize = 1024 * 1024;

/// Tunables for one aggregation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub workers: usize,
    pub table_bits: u32,
    pub block_size: usize,
    /// Skip records that fail the fixed-format decoder instead of
    /// retrying them through the lenient parser.
    pub strict: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            table_bits: DEFAULT_TABLE_BITS,
            block_size: DEFAULT_BLOCK_SIZE,
            strict: false,
        }
    }
}

impl EngineConfig {
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    pub fn with_table_bits(mut self, table_bits: u32) -> Self {
        self.table_bits = table_bits;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::Config("worker count must be at least 1".into()));
        }
        if !(MIN_TABLE_BITS..=MAX_TABLE_BITS).contains(&self.table_bits) {
            return Err(Error::Config(format!(
                "table bits must be within {}..={}, got {}",
                MIN_TABLE_BITS, MAX_TABLE_BITS, self.table_bits
            )));
        }
        if self.block_size == 0 {
            return Err(Error::Config("block size must be non-zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        assert!(config.workers >= 1);
        assert_eq!(config.table_bits, DEFAULT_TABLE_BITS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::new(3)
            .with_table_bits(10)
            .with_block_size(64)
            .with_strict(true);
        assert_eq!(config.workers, 3);
        assert_eq!(config.table_bits, 10);
        assert_eq!(config.block_size, 64);
        assert!(config.strict);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            EngineConfig::new(0).validate(),
            Err(Error::Config(_))
        ));
        assert!(EngineConfig::new(1).with_table_bits(3).validate().is_err());
        assert!(EngineConfig::new(1).with_table_bits(29).validate().is_err());
        assert!(EngineConfig::new(1).with_block_size(0).validate().is_err());
    }
}
