//! Per-record INFO data.
//!
//! INFO columns are kept as raw text until a key is actually read. The
//! column is only tokenised on the first access to any key, and each value
//! is only parsed when that key is read; parsed values are cached.

use indexmap::IndexMap;
use once_cell::unsync::OnceCell;

use crate::consts::MISSING_VALUE;
use crate::errors::Result;
use crate::schema::{FieldKind, FieldValue, SharedSchema, format_values, resolve_field};

///
/// The raw text of one INFO value, parsed against the schema on first read.
///
#[derive(Debug, Clone)]
pub struct DeferredInfoValue {
    key: String,
    raw: Option<String>,
    n_alts: usize,
    alt_index: usize,
    schema: SharedSchema,
    parsed: OnceCell<Vec<FieldValue>>,
}

impl DeferredInfoValue {
    pub fn new(key: impl Into<String>, raw: Option<String>, schema: SharedSchema) -> Self {
        Self::for_alt(key, raw, schema, 1, 0)
    }

    /// Value of the `alt_index`-th ALT of a line with `n_alts` ALTs.
    pub fn for_alt(
        key: impl Into<String>,
        raw: Option<String>,
        schema: SharedSchema,
        n_alts: usize,
        alt_index: usize,
    ) -> Self {
        DeferredInfoValue {
            key: key.into(),
            raw,
            n_alts,
            alt_index,
            schema,
            parsed: OnceCell::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The unparsed text, `None` for a bare flag.
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn is_parsed(&self) -> bool {
        self.parsed.get().is_some()
    }

    pub fn value(&self) -> Result<&[FieldValue]> {
        let values = self.parsed.get_or_try_init(|| {
            let metadata = resolve_field(&self.schema, FieldKind::Info, &self.key);
            let mut per_alt = metadata.extract_data(self.raw.as_deref(), self.n_alts, None)?;
            let values = if self.alt_index < per_alt.len() {
                per_alt.swap_remove(self.alt_index)
            } else {
                vec![FieldValue::Missing]
            };
            Ok::<_, crate::errors::VcfError>(values)
        })?;
        Ok(values)
    }
}

///
/// Raw INFO column plus the schema to parse it with. Tokenising yields
/// `(key, DeferredInfoValue)` pairs in column order.
///
#[derive(Debug, Clone)]
pub struct DeferredInfoData {
    raw: String,
    schema: SharedSchema,
}

impl DeferredInfoData {
    pub fn new(raw: impl Into<String>, schema: SharedSchema) -> Self {
        DeferredInfoData {
            raw: raw.into(),
            schema,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn values(&self) -> impl Iterator<Item = (String, DeferredInfoValue)> + '_ {
        split_info_column(&self.raw).map(|(key, raw)| {
            let value = DeferredInfoValue::new(key, raw.map(str::to_string), self.schema.clone());
            (key.to_string(), value)
        })
    }
}

/// Split an INFO column into `(key, raw value)` pairs; `.` is empty.
pub fn split_info_column(raw: &str) -> impl Iterator<Item = (&str, Option<&str>)> {
    let column = if raw == MISSING_VALUE { "" } else { raw };
    column
        .split(';')
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) => (key, Some(value)),
            None => (entry, None),
        })
}

#[derive(Debug, Clone)]
pub enum InfoValue {
    Parsed(Vec<FieldValue>),
    Deferred(DeferredInfoValue),
}

impl InfoValue {
    pub fn value(&self) -> Result<&[FieldValue]> {
        match self {
            InfoValue::Parsed(values) => Ok(values),
            InfoValue::Deferred(deferred) => deferred.value(),
        }
    }

    /// `None` renders a bare key (a set flag); `Some("")` means "omit".
    fn render(&self) -> Option<String> {
        match self {
            InfoValue::Deferred(deferred) => deferred.raw().map(str::to_string),
            InfoValue::Parsed(values) => match values.as_slice() {
                [FieldValue::Flag(true)] => None,
                [FieldValue::Flag(false)] => Some(String::new()),
                _ => Some(format_values(values)),
            },
        }
    }
}

///
/// Ordered INFO key → values of one record.
///
#[derive(Debug, Clone, Default)]
pub struct InfoData {
    deferred: Option<DeferredInfoData>,
    entries: OnceCell<IndexMap<String, InfoValue>>,
}

impl InfoData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deferred(data: DeferredInfoData) -> Self {
        InfoData {
            deferred: Some(data),
            entries: OnceCell::new(),
        }
    }

    pub fn from_entries(entries: IndexMap<String, InfoValue>) -> Self {
        InfoData {
            deferred: None,
            entries: OnceCell::with_value(entries),
        }
    }

    pub fn from_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<FieldValue>)>,
        K: Into<String>,
    {
        Self::from_entries(
            values
                .into_iter()
                .map(|(key, v)| (key.into(), InfoValue::Parsed(v)))
                .collect(),
        )
    }

    /// Whether the column is still untouched raw text.
    pub fn is_deferred(&self) -> bool {
        self.deferred.is_some() && self.entries.get().is_none()
    }

    fn entries(&self) -> &IndexMap<String, InfoValue> {
        self.entries.get_or_init(|| match &self.deferred {
            Some(data) => data
                .values()
                .map(|(key, value)| (key, InfoValue::Deferred(value)))
                .collect(),
            None => IndexMap::new(),
        })
    }

    fn materialize(&mut self) -> Option<&mut IndexMap<String, InfoValue>> {
        self.entries();
        self.deferred = None;
        self.entries.get_mut()
    }

    pub fn entry(&self, key: &str) -> Option<&InfoValue> {
        self.entries().get(key)
    }

    /// Values of `key`, parsed on first read.
    pub fn get(&self, key: &str) -> Result<Option<&[FieldValue]>> {
        self.entry(key).map(InfoValue::value).transpose()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries().contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries().keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn insert(&mut self, key: impl Into<String>, values: Vec<FieldValue>) {
        if let Some(entries) = self.materialize() {
            entries.insert(key.into(), InfoValue::Parsed(values));
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<InfoValue> {
        self.materialize()
            .and_then(|entries| entries.shift_remove(key))
    }

    /// Parse every value.
    pub fn to_map(&self) -> Result<IndexMap<String, Vec<FieldValue>>> {
        self.entries()
            .iter()
            .map(|(key, value)| Ok((key.clone(), value.value()?.to_vec())))
            .collect()
    }

    ///
    /// Render the INFO column. Untouched columns and unparsed values are
    /// written back verbatim.
    ///
    pub fn to_vcf_string(&self) -> String {
        if self.is_deferred() {
            if let Some(data) = &self.deferred {
                return if data.raw().is_empty() {
                    MISSING_VALUE.to_string()
                } else {
                    data.raw().to_string()
                };
            }
        }
        let rendered: Vec<String> = self
            .entries()
            .iter()
            .filter_map(|(key, value)| match value.render() {
                None => Some(key.clone()),
                Some(text) if text.is_empty() => None,
                Some(text) => Some(format!("{}={}", key, text)),
            })
            .collect();
        if rendered.is_empty() {
            MISSING_VALUE.to_string()
        } else {
            rendered.join(";")
        }
    }
}

impl PartialEq for InfoData {
    fn eq(&self, other: &Self) -> bool {
        match (self.to_map(), other.to_map()) {
            (Ok(lhs), Ok(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::schema::{DataType, FieldMetadata, Number, Schema};

    fn schema() -> SharedSchema {
        let mut schema = Schema::new();
        schema.add_info(FieldMetadata::info("DP", Number::Fixed(1), DataType::Integer, "Depth"));
        schema.add_info(FieldMetadata::info("AF", Number::A, DataType::Float, "Frequency"));
        schema.add_info(FieldMetadata::info("DB", Number::Fixed(0), DataType::Flag, "dbSNP"));
        schema.add_info(FieldMetadata::info("AD", Number::R, DataType::Integer, "Depths"));
        schema.into_shared()
    }

    #[rstest]
    fn test_deferred_values_parse_on_read() {
        let info = InfoData::deferred(DeferredInfoData::new("DP=14;AF=0.5;DB", schema()));
        assert!(info.is_deferred());
        assert_eq!(info.len(), 3);
        assert!(!info.is_deferred());

        let Some(InfoValue::Deferred(dp)) = info.entry("DP") else {
            panic!("DP should still be deferred");
        };
        assert!(!dp.is_parsed());
        assert_eq!(info.get("DP").unwrap(), Some(&[FieldValue::Integer(14)][..]));
        let Some(InfoValue::Deferred(dp)) = info.entry("DP") else {
            panic!("DP should still be deferred");
        };
        assert!(dp.is_parsed());
        assert_eq!(info.get("DB").unwrap(), Some(&[FieldValue::Flag(true)][..]));
        assert_eq!(info.get("missing").unwrap(), None);
    }

    #[rstest]
    fn test_cardinality_errors_surface_on_read() {
        let info = InfoData::deferred(DeferredInfoData::new("AD=1,2,3", schema()));
        assert!(info.get("AD").is_err());
    }

    #[rstest]
    fn test_unknown_key_is_inferred_on_read() {
        let shared = schema();
        let info = InfoData::deferred(DeferredInfoData::new("NEW_KEY=value", shared.clone()));
        assert!(!shared.borrow().infos.contains_key("NEW_KEY"));
        assert_eq!(
            info.get("NEW_KEY").unwrap(),
            Some(&[FieldValue::String("value".to_string())][..])
        );
        let schema = shared.borrow();
        assert_eq!(schema.infos["NEW_KEY"].number, Number::Unknown);
        assert_eq!(schema.infos["NEW_KEY"].data_type, DataType::String);
    }

    #[rstest]
    #[case("DP=14;AF=0.50;DB")]
    #[case(".")]
    fn test_untouched_column_renders_verbatim(#[case] raw: &str) {
        let info = InfoData::deferred(DeferredInfoData::new(raw, schema()));
        assert_eq!(info.to_vcf_string(), raw);
    }

    #[rstest]
    fn test_mutation_and_rendering() {
        let mut info = InfoData::deferred(DeferredInfoData::new("DP=14;AF=0.50", schema()));
        info.insert("DB", vec![FieldValue::Flag(true)]);
        info.insert("DP", vec![FieldValue::Integer(20)]);
        assert_eq!(info.to_vcf_string(), "DP=20;AF=0.50;DB");
        info.remove("AF");
        info.insert("DB", vec![FieldValue::Flag(false)]);
        assert_eq!(info.to_vcf_string(), "DP=20");
        assert_eq!(InfoData::new().to_vcf_string(), ".");
    }

    #[rstest]
    fn test_equality_by_value() {
        let deferred = InfoData::deferred(DeferredInfoData::new("DP=14;AF=0.50", schema()));
        let parsed = InfoData::from_values(vec![
            ("DP", vec![FieldValue::Integer(14)]),
            ("AF", vec![FieldValue::Float(0.5)]),
        ]);
        assert_eq!(deferred, parsed);
    }
}
