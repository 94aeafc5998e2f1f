//! Streaming VCF reader.
//!
//! [`VcfReader`] parses the header eagerly on construction and then yields
//! one [`Record`] per ALT, reading a single line at a time.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::rc::Rc;

use flate2::read::MultiGzDecoder;
use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::alts::{split_info, split_samples};
use crate::config::ReaderOptions;
use crate::consts::{
    FORMAT_COLUMN, MANDATORY_COLUMNS, MISSING_VALUE, PASS_FILTER, SUPPORTED_VCF_FORMATS,
};
use crate::errors::{Result, VcfError};
use crate::info::{DeferredInfoData, InfoData};
use crate::models::Variant;
use crate::record::Record;
use crate::schema::{Schema, SharedSchema};

static VERSION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^##fileformat=VCFv(?P<version>[\d.]+)$").expect("version line regex is valid")
});

static HEADER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^##(?P<key>[-_~\w\d.]+)=(?P<value>.*)$").expect("header line regex is valid")
});

/// Whether a path names a gzip/bgzf compressed file.
pub fn is_gzipped(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == "gz" || ext == "bgz")
}

pub struct VcfReader<R> {
    reader: R,
    schema: SharedSchema,
    options: ReaderOptions,
    line_number: usize,
    line: String,
    pending: VecDeque<Record>,
    finished: bool,
}

impl VcfReader<Box<dyn BufRead>> {
    /// Open a VCF file, decompressing `.gz`/`.bgz` files on the fly.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_path_with_options(path, ReaderOptions::default())
    }

    pub fn from_path_with_options<P: AsRef<Path>>(path: P, options: ReaderOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader: Box<dyn BufRead> = if is_gzipped(path) {
            Box::new(BufReader::with_capacity(
                options.buffer_capacity,
                MultiGzDecoder::new(file),
            ))
        } else {
            Box::new(BufReader::with_capacity(options.buffer_capacity, file))
        };
        tracing::debug!("Reading VCF from {}", path.display());
        Self::with_options(reader, options)
    }
}

impl<R: BufRead> VcfReader<R> {
    pub fn new(reader: R) -> Result<Self> {
        Self::with_options(reader, ReaderOptions::default())
    }

    /// Wrap `reader` and parse the header up to and including the column line.
    pub fn with_options(reader: R, options: ReaderOptions) -> Result<Self> {
        let mut vcf = VcfReader {
            reader,
            schema: Schema::new().into_shared(),
            options,
            line_number: 0,
            line: String::new(),
            pending: VecDeque::new(),
            finished: false,
        };
        vcf.read_header()?;
        Ok(vcf)
    }

    /// The schema shared with every record read so far.
    pub fn schema(&self) -> SharedSchema {
        self.schema.clone()
    }

    fn next_line(&mut self) -> Result<bool> {
        self.line.clear();
        if self.reader.read_line(&mut self.line)? == 0 {
            return Ok(false);
        }
        self.line_number += 1;
        let trimmed = self.line.trim_end_matches(['\n', '\r']).len();
        self.line.truncate(trimmed);
        Ok(true)
    }

    fn read_header(&mut self) -> Result<()> {
        if !self.next_line()? {
            return Err(VcfError::UnexpectedEof);
        }
        let version = VERSION_LINE
            .captures(&self.line)
            .map(|caps| caps["version"].to_string())
            .ok_or_else(|| VcfError::InvalidVersionLine(self.line.clone()))?;
        if !SUPPORTED_VCF_FORMATS.contains(&version.as_str()) {
            return Err(VcfError::UnsupportedVersion(version));
        }
        self.schema.borrow_mut().vcf_format = version;

        loop {
            if !self.next_line()? {
                return Err(VcfError::UnexpectedEof);
            }
            if !self.line.starts_with("##") {
                let samples = parse_column_header(&self.line)?;
                let mut schema = self.schema.borrow_mut();
                schema.samples = samples;
                tracing::debug!(
                    "Parsed VCF header: {} INFO, {} FORMAT, {} sample(s)",
                    schema.infos.len(),
                    schema.formats.len(),
                    schema.samples.len()
                );
                return Ok(());
            }
            let caps = HEADER_LINE
                .captures(&self.line)
                .ok_or_else(|| VcfError::InvalidHeaderLine(self.line.clone()))?;
            self.schema
                .borrow_mut()
                .add_header_line(&caps["key"], &caps["value"])
                .map_err(|e| e.at_line(self.line_number))?;
        }
    }

    fn read_records(&mut self) -> Option<Result<()>> {
        loop {
            match self.next_line() {
                Ok(false) => return None,
                Ok(true) if self.line.is_empty() => continue,
                Ok(true) => {
                    let parsed = parse_data_line(&self.line, &self.schema, &self.options)
                        .map_err(|e| e.at_line(self.line_number));
                    return Some(parsed.map(|records| self.pending.extend(records)));
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl<R: BufRead> Iterator for VcfReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(Ok(record));
            }
            if self.finished {
                return None;
            }
            match self.read_records() {
                Some(Ok(())) => continue,
                Some(Err(e)) => return Some(Err(e)),
                None => {
                    self.finished = true;
                    return None;
                }
            }
        }
    }
}

///
/// Validate the `#CHROM` line and return the sample names.
///
pub fn parse_column_header(line: &str) -> Result<Vec<String>> {
    let columns: Vec<&str> = line.split('\t').collect();
    let invalid = || VcfError::InvalidColumnHeader(line.to_string());
    if columns.len() < MANDATORY_COLUMNS.len()
        || columns[..MANDATORY_COLUMNS.len()] != *MANDATORY_COLUMNS
    {
        return Err(invalid());
    }
    let rest = &columns[MANDATORY_COLUMNS.len()..];
    match rest.split_first() {
        None => Ok(Vec::new()),
        Some((format, samples)) if *format == FORMAT_COLUMN => samples
            .iter()
            .map(|name| {
                if name.is_empty() || name.chars().any(char::is_whitespace) {
                    Err(VcfError::InvalidSampleName(name.to_string()))
                } else {
                    Ok(name.to_string())
                }
            })
            .collect(),
        Some(_) => Err(invalid()),
    }
}

fn malformed(message: impl Into<String>) -> VcfError {
    VcfError::MalformedRecord(message.into())
}

///
/// Parse one data line into a record per ALT.
///
/// # Arguments
/// - line: the tab-separated line, without its line terminator
/// - schema: the schema of the file; undeclared keys are added to it
/// - options: controls whether single-ALT INFO columns are deferred
///
pub fn parse_data_line(
    line: &str,
    schema: &SharedSchema,
    options: &ReaderOptions,
) -> Result<Vec<Record>> {
    let columns: Vec<&str> = line.split('\t').collect();
    if columns.len() < MANDATORY_COLUMNS.len() {
        return Err(malformed(format!(
            "expected at least {} columns, found {}",
            MANDATORY_COLUMNS.len(),
            columns.len()
        )));
    }
    let chrom = columns[0];
    let pos_from = columns[1]
        .parse::<u64>()
        .ok()
        .and_then(|pos| pos.checked_sub(1))
        .ok_or_else(|| malformed(format!("invalid POS {:?}", columns[1])))?;
    let ids: Vec<String> = match columns[2] {
        MISSING_VALUE => Vec::new(),
        raw => raw.split(';').map(str::to_string).collect(),
    };
    let ref_allele = columns[3];
    let alts: Vec<&str> = columns[4].split(',').collect();
    let quality = match columns[5] {
        MISSING_VALUE => None,
        raw => Some(
            raw.parse::<f64>()
                .map_err(|_| malformed(format!("invalid QUAL {:?}", raw)))?,
        ),
    };
    let filters: IndexSet<String> = match columns[6] {
        MISSING_VALUE | PASS_FILTER => IndexSet::new(),
        raw => raw.split(';').map(str::to_string).collect(),
    };

    let n_alts = alts.len();
    let infos = if n_alts == 1 && options.defer_info {
        vec![InfoData::deferred(DeferredInfoData::new(columns[7], schema.clone()))]
    } else {
        split_info(columns[7], n_alts, schema)?
    };
    let samples = match columns.get(8) {
        Some(format) => split_samples(format, &columns[9..], n_alts, schema)?
            .into_iter()
            .map(Some)
            .collect(),
        None => vec![None; n_alts],
    };

    let site = (n_alts > 1).then(|| Rc::new(()));
    alts.iter()
        .zip(infos)
        .zip(samples)
        .map(|((alt, info), sample_info)| {
            let variant = Variant::new(chrom, pos_from, ref_allele, *alt)?;
            let mut record = Record::new(schema.clone(), variant);
            record.ids = ids.clone();
            record.quality = quality;
            record.filters = filters.clone();
            record.info = info;
            record.sample_info = sample_info;
            record.from_multi_alt = n_alts > 1;
            record.site = site.clone();
            Ok(record)
        })
        .collect()
}
