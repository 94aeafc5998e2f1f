//! # Schema-aware VCF reading and writing
//!
//! This crate reads and writes VCF 4.0-4.2 text (plain or gzipped). It provides:
//!
//! - A typed header model ([`Schema`]) with cardinality-aware INFO/FORMAT descriptors
//! - A streaming reader that yields one [`Record`] per ALT, deferring INFO parsing
//!   until a key is read
//! - A writer that joins per-ALT records of one site back into a single line
//! - Variant, interval and genotype algebra: trimming, MNP splitting,
//!   chromosome-aware ordering, interval coverage
//!
//! Soft problems (undeclared keys, cardinality mismatches, unparseable tokens)
//! are reported as `tracing` warnings; install a subscriber to see them.
//!
//! ```no_run
//! use gtars_vcf::{read_vcf, write_vcf};
//!
//! let (schema, records) = read_vcf("calls.vcf.gz").unwrap();
//! let passing = records.into_iter().filter(|r| r.passes_filter());
//! write_vcf("passing.vcf", schema, passing).unwrap();
//! ```

pub mod alts;
pub mod config;
pub mod consts;
pub mod errors;
pub mod info;
pub mod models;
pub mod normalize;
pub mod reader;
pub mod record;
pub mod sample;
pub mod schema;
pub mod writer;

use std::path::Path;

use anyhow::{Context, Result};

pub use config::{ReaderOptions, WriterOptions};
pub use errors::VcfError;
pub use info::{DeferredInfoData, DeferredInfoValue, InfoData, InfoValue};
pub use models::{
    ChromInterval, ChromosomeOrder, DefaultChromosomeOrder, GenotypeCall, Interval, Variant,
    VariantType, interval_coverage, merge_intervals,
};
pub use normalize::{split_mnp_variant, trimmed_ref_alt, trimmed_vcf_ref_alt};
pub use reader::VcfReader;
pub use record::Record;
pub use sample::{SampleData, SampleValue, gl_to_pl, pl_to_gl};
pub use schema::{
    AdapterMetadata, DataType, FieldKind, FieldMetadata, FieldValue, Number, Schema, SharedSchema,
};
pub use writer::{FileSink, VcfWriter};

///
/// Read a whole VCF file into memory.
///
/// # Arguments
/// - path: path to a `.vcf` or `.vcf.gz` file
///
/// # Returns
/// - the schema, shared with every record, and the records in file order
///
pub fn read_vcf<P: AsRef<Path>>(path: P) -> Result<(SharedSchema, Vec<Record>)> {
    let path = path.as_ref();
    let reader = VcfReader::from_path(path)
        .with_context(|| format!("Failed to open VCF: {}", path.display()))?;
    let schema = reader.schema();
    let records = reader
        .collect::<errors::Result<Vec<_>>>()
        .with_context(|| format!("Failed to parse VCF: {}", path.display()))?;
    Ok((schema, records))
}

///
/// Write a schema and records to `path`, gzip-compressed for `.gz` paths.
///
pub fn write_vcf<P, I>(path: P, schema: SharedSchema, records: I) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = Record>,
{
    let path = path.as_ref();
    let mut writer = VcfWriter::to_path(path, schema)
        .with_context(|| format!("Failed to create VCF: {}", path.display()))?;
    writer
        .write_records(records)
        .with_context(|| format!("Failed to write VCF: {}", path.display()))?;
    writer
        .close()
        .with_context(|| format!("Failed to write VCF: {}", path.display()))?;
    Ok(())
}
