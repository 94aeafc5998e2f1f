//! VCF writer.
//!
//! Records read from a multi-allelic line are buffered and written back as
//! a single line once the next site starts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::alts::{join_info, join_samples};
use crate::config::WriterOptions;
use crate::consts::{FORMAT_COLUMN, MANDATORY_COLUMNS, MISSING_VALUE, PASS_FILTER};
use crate::errors::{Result, VcfError};
use crate::reader::is_gzipped;
use crate::record::Record;
use crate::sample::SampleData;
use crate::schema::SharedSchema;

pub struct VcfWriter<W: Write> {
    writer: W,
    schema: SharedSchema,
    options: WriterOptions,
    group: Vec<Record>,
    header_written: bool,
}

/// Output file of [`VcfWriter::to_path`].
pub enum FileSink {
    Plain(BufWriter<File>),
    Gzip(BufWriter<GzEncoder<File>>),
}

impl FileSink {
    /// Flush buffered output and, for gzip, write the trailer.
    pub fn finish(self) -> std::io::Result<()> {
        match self {
            FileSink::Plain(mut writer) => writer.flush(),
            FileSink::Gzip(writer) => {
                let encoder = writer.into_inner().map_err(|e| e.into_error())?;
                encoder.finish()?;
                Ok(())
            }
        }
    }
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            FileSink::Plain(writer) => writer.write(buf),
            FileSink::Gzip(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            FileSink::Plain(writer) => writer.flush(),
            FileSink::Gzip(writer) => writer.flush(),
        }
    }
}

impl VcfWriter<FileSink> {
    /// Create `path`, gzip-compressing when it ends in `.gz`/`.bgz`.
    pub fn to_path<P: AsRef<Path>>(path: P, schema: SharedSchema) -> Result<Self> {
        Self::to_path_with_options(path, schema, WriterOptions::default())
    }

    pub fn to_path_with_options<P: AsRef<Path>>(
        path: P,
        schema: SharedSchema,
        options: WriterOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let sink = if is_gzipped(path) {
            let level = Compression::new(options.compression_level);
            FileSink::Gzip(BufWriter::new(GzEncoder::new(file, level)))
        } else {
            FileSink::Plain(BufWriter::new(file))
        };
        tracing::debug!("Writing VCF to {}", path.display());
        Ok(Self::with_options(sink, schema, options))
    }

    /// Write any buffered records and close the file, gzip trailer included.
    pub fn close(self) -> Result<()> {
        self.finish()?.finish()?;
        Ok(())
    }
}

impl<W: Write> VcfWriter<W> {
    pub fn new(writer: W, schema: SharedSchema) -> Self {
        Self::with_options(writer, schema, WriterOptions::default())
    }

    pub fn with_options(writer: W, schema: SharedSchema, options: WriterOptions) -> Self {
        VcfWriter {
            writer,
            schema,
            options,
            group: Vec::new(),
            header_written: false,
        }
    }

    /// Write the meta-information lines and the column header, once.
    pub fn write_header(&mut self) -> Result<()> {
        if self.header_written {
            return Ok(());
        }
        let schema = self.schema.borrow();
        let mut lines = schema.header_lines();
        if let Some(version) = &self.options.vcf_format {
            lines[0] = format!("##fileformat=VCFv{}", version);
        }
        let mut columns: Vec<&str> = MANDATORY_COLUMNS.to_vec();
        if !schema.samples.is_empty() {
            columns.push(FORMAT_COLUMN);
            columns.extend(schema.samples.iter().map(String::as_str));
        }
        lines.push(columns.join("\t"));
        for line in lines {
            writeln!(self.writer, "{}", line)?;
        }
        drop(schema);
        self.header_written = true;
        Ok(())
    }

    fn joins_group(&self, record: &Record) -> bool {
        let Some(first) = self.group.first() else {
            return false;
        };
        first.shares_site(record)
            && self
                .group
                .iter()
                .all(|r| r.variant.alt() != record.variant.alt())
    }

    ///
    /// Queue a record. Consecutive records split from the same multi-ALT
    /// line are held back and written as one line.
    ///
    pub fn write_record(&mut self, record: Record) -> Result<()> {
        self.write_header()?;
        if !self.joins_group(&record) {
            self.flush_group()?;
        }
        self.group.push(record);
        Ok(())
    }

    pub fn write_records<I: IntoIterator<Item = Record>>(&mut self, records: I) -> Result<()> {
        for record in records {
            self.write_record(record)?;
        }
        Ok(())
    }

    fn flush_group(&mut self) -> Result<()> {
        if self.group.is_empty() {
            return Ok(());
        }
        let group: Vec<&Record> = self.group.iter().collect();
        let line = format_record_line(&group, &self.schema)?;
        writeln!(self.writer, "{}", line)?;
        self.group.clear();
        Ok(())
    }

    ///
    /// Write any buffered records and flush. Must be called before dropping;
    /// writers from [`VcfWriter::to_path`] use [`VcfWriter::close`] instead.
    ///
    pub fn finish(mut self) -> Result<W> {
        self.write_header()?;
        self.flush_group()?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

fn join_or_missing<'a, I>(items: I, separator: &str, missing: &str) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let joined: Vec<&str> = items.into_iter().collect();
    if joined.is_empty() {
        missing.to_string()
    } else {
        joined.join(separator)
    }
}

///
/// Render the records of one site as a single data line (no line
/// terminator). Ids, quality and filters come from the first record.
///
pub fn format_record_line(records: &[&Record], schema: &SharedSchema) -> Result<String> {
    let Some(first) = records.first() else {
        return Ok(String::new());
    };
    let variant = &first.variant;
    let mut columns = vec![
        variant.chrom().to_string(),
        (variant.pos_from() + 1).to_string(),
        join_or_missing(first.ids.iter().map(String::as_str), ";", MISSING_VALUE),
        variant.ref_allele().to_string(),
        records
            .iter()
            .map(|r| r.variant.alt())
            .collect::<Vec<_>>()
            .join(","),
        first
            .quality
            .map_or_else(|| MISSING_VALUE.to_string(), |q| q.to_string()),
        join_or_missing(first.filters.iter().map(String::as_str), ";", PASS_FILTER),
    ];

    let infos: Vec<_> = records.iter().map(|r| &r.info).collect();
    columns.push(join_info(&infos, schema)?.to_vcf_string());

    let samples: Vec<&SampleData> = records
        .iter()
        .filter_map(|r| r.sample_info.as_ref())
        .collect();
    if !samples.is_empty() && samples.len() != records.len() {
        return Err(VcfError::MalformedRecord(format!(
            "{} of {} records at {}:{} carry sample data",
            samples.len(),
            records.len(),
            variant.chrom(),
            variant.pos_from() + 1
        )));
    }
    if !samples.is_empty() {
        columns.extend(join_samples(&samples, schema)?.to_vcf_columns());
    }
    Ok(columns.join("\t"))
}
