//! Constants shared by the reader and writer: supported versions, column
//! names and the INFO/FORMAT keys the crate gives special meaning to.

pub const DEFAULT_VCF_FORMAT: &str = "4.2";
pub const SUPPORTED_VCF_FORMATS: &[&str] = &["4.0", "4.1", "4.2"];

pub const MANDATORY_COLUMNS: &[&str] = &[
    "#CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO",
];
pub const FORMAT_COLUMN: &str = "FORMAT";

pub const MISSING_VALUE: &str = ".";
pub const PASS_FILTER: &str = "PASS";
pub const NON_REF_ALLELE: &str = "<NON_REF>";

// header line keys
pub const HEADER_INFO: &str = "INFO";
pub const HEADER_FORMAT: &str = "FORMAT";
pub const HEADER_FILTER: &str = "FILTER";
pub const HEADER_CONTIG: &str = "contig";
pub const HEADER_ADAPTER: &str = "ADAPTER";

/// Source recorded on schema entries synthesized for undeclared keys.
pub const INFERRED_SOURCE: &str = "inferred";

// well-known INFO keys

/// Start of a reference-call block.
pub const INFO_BEG: &str = "BEG";
/// End (1-based, inclusive) of a reference-call block.
pub const INFO_END: &str = "END";
/// Length of a reference-call block.
pub const INFO_LEN: &str = "LEN";
/// Flags records whose IDs were derived from a candidate-variant file.
pub const INFO_CV: &str = "CV";

// well-known FORMAT keys
pub const FORMAT_GT: &str = "GT";
pub const FORMAT_GQ: &str = "GQ";
pub const FORMAT_PL: &str = "PL";
pub const FORMAT_GL: &str = "GL";
pub const FORMAT_DP: &str = "DP";
pub const FORMAT_NR: &str = "NR";
pub const FORMAT_AD: &str = "AD";
pub const FORMAT_NV: &str = "NV";
pub const FORMAT_VAF: &str = "VAF";
pub const FORMAT_MIN_DP: &str = "MIN_DP";
pub const FORMAT_PS: &str = "PS";
pub const FORMAT_PQ: &str = "PQ";

/// 256KB read buffer, large VCFs are mostly long sample columns.
pub const DEFAULT_BUFFER_CAPACITY: usize = 256 * 1024;
