use tracing::debug;

use crate::table::Table;

/// Fold every worker table into one, using the same slot walk as the
/// workers. Keys are moved out of the worker tables, never copied.
///
/// The result does not depend on the order of `tables`.
pub fn merge_tables<I>(tables: I, table_bits: u32) -> Table
where
    I: IntoIterator<Item = Table>,
{
    let mut merged = Table::with_bits(table_bits);
    let mut folded = 0usize;
    for table in tables {
        for (key, stats) in table.into_entries() {
            merged.absorb(key, stats);
        }
        folded += 1;
    }
    debug!(tables = folded, keys = merged.len(), "merge finished");
    merged
}
