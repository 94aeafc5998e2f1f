//! Header metadata of a VCF file.
//!
//! The [`Schema`] holds the declared INFO/FORMAT/FILTER/contig entries,
//! the adapter history, free-form metadata lines and the sample order. It
//! is shared between a reader and the records it produces as a
//! [`SharedSchema`], so that entries for undeclared keys can be synthesized
//! while records are being read.

pub mod encoding;
pub mod field;

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;

use crate::consts::{
    DEFAULT_VCF_FORMAT, HEADER_ADAPTER, HEADER_CONTIG, HEADER_FILTER, HEADER_FORMAT, HEADER_INFO,
};
use crate::errors::{Result, VcfError};

pub use self::encoding::{decode_vcf_string, encode_vcf_string};
pub use self::field::{DataType, FieldKind, FieldMetadata, FieldValue, Number, format_values};

use self::encoding::{format_key_value_list, parse_key_value_list, strip_brackets};

/// A schema shared by a reader and every record it yields.
pub type SharedSchema = Rc<RefCell<Schema>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterMetadata {
    pub id: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContigMetadata {
    pub id: String,
    pub length: Option<u64>,
}

///
/// Provenance of a tool pass that rewrote the file: `##ADAPTER=<ID=..,
/// date=..,hash=..>`.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterMetadata {
    pub id: String,
    pub hash: String,
    pub date: NaiveDateTime,
}

impl AdapterMetadata {
    pub fn new(id: impl Into<String>, hash: impl Into<String>, date: NaiveDateTime) -> Self {
        AdapterMetadata {
            id: id.into(),
            hash: hash.into(),
            date,
        }
    }

    /// Accepts `%Y-%m-%d` or an ISO-8601 date-time.
    pub fn parse_date(raw: &str) -> Result<NaiveDateTime> {
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Ok(date.and_time(NaiveTime::MIN));
        }
        if let Ok(datetime) = chrono::DateTime::parse_from_rfc3339(raw) {
            return Ok(datetime.naive_utc());
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
            .map_err(|_| VcfError::InvalidDate(raw.to_string()))
    }

    /// Midnight renders as a plain date.
    pub fn format_date(&self) -> String {
        if self.date.time() == NaiveTime::MIN {
            self.date.format("%Y-%m-%d").to_string()
        } else {
            self.date.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
        }
    }
}

///
/// Parsed VCF header.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub vcf_format: String,
    pub file_metadata: IndexMap<String, Vec<String>>,
    pub infos: IndexMap<String, FieldMetadata>,
    pub formats: IndexMap<String, FieldMetadata>,
    pub filters: IndexMap<String, FilterMetadata>,
    pub contigs: IndexMap<String, ContigMetadata>,
    pub adapters: Vec<AdapterMetadata>,
    pub samples: Vec<String>,
}

impl Default for Schema {
    fn default() -> Self {
        Schema {
            vcf_format: DEFAULT_VCF_FORMAT.to_string(),
            file_metadata: IndexMap::new(),
            infos: IndexMap::new(),
            formats: IndexMap::new(),
            filters: IndexMap::new(),
            contigs: IndexMap::new(),
            adapters: Vec::new(),
            samples: Vec::new(),
        }
    }
}

fn required<'a>(
    pairs: &'a IndexMap<String, String>,
    field: &'static str,
    line: &str,
) -> Result<&'a str> {
    pairs
        .get(field)
        .map(String::as_str)
        .ok_or_else(|| VcfError::MissingHeaderField {
            entry: line.to_string(),
            field,
        })
}

fn optional_string(pairs: &IndexMap<String, String>, field: &str) -> Result<Option<String>> {
    pairs.get(field).map(|raw| decode_vcf_string(raw)).transpose()
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_shared(self) -> SharedSchema {
        Rc::new(RefCell::new(self))
    }

    pub fn add_info(&mut self, metadata: FieldMetadata) {
        self.infos.insert(metadata.id.clone(), metadata);
    }

    pub fn add_format(&mut self, metadata: FieldMetadata) {
        self.formats.insert(metadata.id.clone(), metadata);
    }

    pub fn add_filter(&mut self, id: impl Into<String>, description: impl Into<String>) {
        let id = id.into();
        self.filters.insert(
            id.clone(),
            FilterMetadata {
                id,
                description: description.into(),
            },
        );
    }

    pub fn add_contig(&mut self, id: impl Into<String>, length: Option<u64>) {
        let id = id.into();
        self.contigs.insert(id.clone(), ContigMetadata { id, length });
    }

    pub fn add_adapter(&mut self, adapter: AdapterMetadata) {
        self.adapters.push(adapter);
    }

    pub fn add_file_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.file_metadata.entry(key.into()).or_default().push(value.into());
    }

    pub fn add_sample(&mut self, name: impl Into<String>) {
        self.samples.push(name.into());
    }

    pub fn field(&self, kind: FieldKind, key: &str) -> Option<&FieldMetadata> {
        match kind {
            FieldKind::Info => self.infos.get(key),
            FieldKind::Format => self.formats.get(key),
        }
    }

    ///
    /// Look up a field, synthesizing an inferred `Number=.`/`Type=String`
    /// entry (with a warning) when the key was never declared.
    ///
    pub fn field_or_infer(&mut self, kind: FieldKind, key: &str) -> FieldMetadata {
        let fields = match kind {
            FieldKind::Info => &mut self.infos,
            FieldKind::Format => &mut self.formats,
        };
        if let Some(metadata) = fields.get(key) {
            return metadata.clone();
        }
        warn_undeclared(kind, key);
        let metadata = FieldMetadata::inferred(kind, key);
        fields.insert(key.to_string(), metadata.clone());
        metadata
    }

    ///
    /// Apply one `##key=value` header line (without the leading `##`).
    /// Recognised keys populate the typed maps; anything else is kept
    /// verbatim in `file_metadata`.
    ///
    pub fn add_header_line(&mut self, key: &str, value: &str) -> Result<()> {
        let structured = strip_brackets(value);
        match (key, structured) {
            (HEADER_INFO, Some(body)) => {
                let pairs = parse_key_value_list(body)?;
                let mut metadata = self.parse_field(FieldKind::Info, &pairs, value)?;
                metadata.source = optional_string(&pairs, "Source")?;
                metadata.version = optional_string(&pairs, "Version")?;
                self.add_info(metadata);
            }
            (HEADER_FORMAT, Some(body)) => {
                let pairs = parse_key_value_list(body)?;
                let metadata = self.parse_field(FieldKind::Format, &pairs, value)?;
                self.add_format(metadata);
            }
            (HEADER_FILTER, Some(body)) => {
                let pairs = parse_key_value_list(body)?;
                let id = required(&pairs, "ID", value)?.to_string();
                let description = decode_vcf_string(required(&pairs, "Description", value)?)?;
                self.add_filter(id, description);
            }
            (HEADER_CONTIG, Some(body)) => {
                let pairs = parse_key_value_list(body)?;
                let id = required(&pairs, "ID", value)?.to_string();
                let length = pairs
                    .get("length")
                    .map(|l| {
                        l.parse::<u64>()
                            .map_err(|_| VcfError::InvalidHeaderLine(value.to_string()))
                    })
                    .transpose()?;
                self.add_contig(id, length);
            }
            (HEADER_ADAPTER, Some(body)) => {
                let pairs = parse_key_value_list(body)?;
                // older files wrote adapters=/githash= instead of ID=/hash=
                let id = pairs
                    .get("ID")
                    .or_else(|| pairs.get("adapters"))
                    .ok_or_else(|| VcfError::MissingHeaderField {
                        entry: value.to_string(),
                        field: "ID",
                    })?;
                let hash = pairs
                    .get("hash")
                    .or_else(|| pairs.get("githash"))
                    .ok_or_else(|| VcfError::MissingHeaderField {
                        entry: value.to_string(),
                        field: "hash",
                    })?;
                let date = AdapterMetadata::parse_date(required(&pairs, "date", value)?)?;
                self.add_adapter(AdapterMetadata::new(id.as_str(), hash.as_str(), date));
            }
            _ => self.add_file_metadata(key, value),
        }
        Ok(())
    }

    fn parse_field(
        &self,
        kind: FieldKind,
        pairs: &IndexMap<String, String>,
        line: &str,
    ) -> Result<FieldMetadata> {
        let id = required(pairs, "ID", line)?;
        let number = required(pairs, "Number", line)?.parse::<Number>()?;
        let data_type = required(pairs, "Type", line)?.parse::<DataType>()?;
        let description = decode_vcf_string(required(pairs, "Description", line)?)?;
        Ok(FieldMetadata::new(kind, id, number, data_type, description))
    }

    ///
    /// Header lines in emission order: file format, free-form metadata,
    /// INFO, FORMAT, FILTER, contig, ADAPTER. The column header is not
    /// included.
    ///
    pub fn header_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("##fileformat=VCFv{}", self.vcf_format)];
        for (key, values) in &self.file_metadata {
            lines.extend(values.iter().map(|value| format!("##{}={}", key, value)));
        }
        for metadata in self.infos.values() {
            lines.push(format!("##{}={}", HEADER_INFO, field_line(metadata)));
        }
        for metadata in self.formats.values() {
            lines.push(format!("##{}={}", HEADER_FORMAT, field_line(metadata)));
        }
        for filter in self.filters.values() {
            lines.push(format!(
                "##{}={}",
                HEADER_FILTER,
                format_key_value_list(vec![
                    ("ID", filter.id.clone()),
                    ("Description", encode_vcf_string(&filter.description)),
                ])
            ));
        }
        for contig in self.contigs.values() {
            let mut pairs = vec![("ID", contig.id.clone())];
            if let Some(length) = contig.length {
                pairs.push(("length", length.to_string()));
            }
            lines.push(format!("##{}={}", HEADER_CONTIG, format_key_value_list(pairs)));
        }
        for adapter in &self.adapters {
            lines.push(format!(
                "##{}={}",
                HEADER_ADAPTER,
                format_key_value_list(vec![
                    ("ID", adapter.id.clone()),
                    ("date", adapter.format_date()),
                    ("hash", adapter.hash.clone()),
                ])
            ));
        }
        lines
    }
}

///
/// Look up `key` in a shared schema, synthesizing an inferred entry when it
/// is missing. The mutable borrow is only taken for the synthesis. If the
/// schema is borrowed elsewhere at that point, the inferred entry is
/// returned without being recorded.
///
pub fn resolve_field(schema: &SharedSchema, kind: FieldKind, key: &str) -> FieldMetadata {
    let declared = schema.borrow().field(kind, key).cloned();
    if let Some(metadata) = declared {
        return metadata;
    }
    match schema.try_borrow_mut() {
        Ok(mut schema) => schema.field_or_infer(kind, key),
        Err(_) => {
            warn_undeclared(kind, key);
            FieldMetadata::inferred(kind, key)
        }
    }
}

fn warn_undeclared(kind: FieldKind, key: &str) {
    tracing::warn!(
        "{:?} key {} is not declared in the header; inferring Number=. Type=String",
        kind,
        key
    );
}

fn field_line(metadata: &FieldMetadata) -> String {
    let mut pairs = vec![
        ("ID", metadata.id.clone()),
        ("Number", metadata.number.to_string()),
        ("Type", metadata.data_type.to_string()),
        ("Description", encode_vcf_string(&metadata.description)),
    ];
    if metadata.kind == FieldKind::Info {
        if let Some(source) = &metadata.source {
            pairs.push(("Source", encode_vcf_string(source)));
        }
        if let Some(version) = &metadata.version {
            pairs.push(("Version", encode_vcf_string(version)));
        }
    }
    format_key_value_list(pairs)
}
