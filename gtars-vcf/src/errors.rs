use thiserror::Error;

#[derive(Error, Debug)]
pub enum VcfError {
    #[error("Invalid file format line: {0:?}")]
    InvalidVersionLine(String),

    #[error("Unsupported VCF version: {0:?}")]
    UnsupportedVersion(String),

    #[error("Invalid header line: {0:?}")]
    InvalidHeaderLine(String),

    #[error("Invalid key/value list: {0:?}")]
    InvalidKeyValueList(String),

    #[error("Header entry {entry:?} is missing required field {field}")]
    MissingHeaderField { entry: String, field: &'static str },

    #[error("Invalid column header line: {0:?}")]
    InvalidColumnHeader(String),

    #[error("Sample name must not contain whitespace: {0:?}")]
    InvalidSampleName(String),

    #[error("Invalid VCF encoded string: {0:?}")]
    InvalidEncodedString(String),

    #[error("Invalid Number field: {0:?}")]
    InvalidNumber(String),

    #[error("Invalid Type field: {0:?}")]
    InvalidDataType(String),

    #[error("Invalid ADAPTER date: {0:?}")]
    InvalidDate(String),

    #[error("Reference and alternate alleles must be non-empty")]
    EmptyAllele,

    #[error("Cannot trim monomorphic or symbolic variant {ref_allele}>{alt}")]
    MonomorphicVariant { ref_allele: String, alt: String },

    #[error("Invalid genotype: {0:?}")]
    InvalidGenotype(String),

    #[error("Cannot merge genotypes {lhs} and {rhs}")]
    GenotypeMerge { lhs: String, rhs: String },

    #[error("Field {key} expects {expected} values, found {found}")]
    Cardinality {
        key: String,
        expected: usize,
        found: usize,
    },

    #[error("Unknown sample data key: {0}")]
    UnknownSampleKey(String),

    #[error("Unknown sample: {0}")]
    UnknownSample(String),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Unexpected end of input while reading the header")]
    UnexpectedEof,

    #[error("line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: Box<VcfError>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl VcfError {
    /// Attach the 1-based line number of the offending data line.
    pub fn at_line(self, line: usize) -> Self {
        VcfError::Line {
            line,
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, VcfError>;
