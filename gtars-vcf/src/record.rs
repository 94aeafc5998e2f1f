use std::cmp::Ordering;
use std::rc::Rc;

use indexmap::IndexSet;

use crate::consts::{INFO_BEG, INFO_CV, INFO_END, INFO_LEN};
use crate::errors::Result;
use crate::info::InfoData;
use crate::models::Variant;
use crate::sample::SampleData;
use crate::schema::{FieldValue, SharedSchema};

///
/// One VCF record: a single REF/ALT pair with its ids, quality, filters,
/// INFO and sample data.
///
/// Lines with several ALTs are read as one record per ALT, with
/// `from_multi_alt` set; the writer joins such records back together.
///
#[derive(Debug, Clone)]
pub struct Record {
    schema: SharedSchema,
    pub variant: Variant,
    pub ids: Vec<String>,
    pub quality: Option<f64>,
    /// Failed filters; empty means PASS.
    pub filters: IndexSet<String>,
    pub info: InfoData,
    pub sample_info: Option<SampleData>,
    pub from_multi_alt: bool,
    /// Shared by every record split from the same input line.
    pub(crate) site: Option<Rc<()>>,
}

impl Record {
    pub fn new(schema: SharedSchema, variant: Variant) -> Self {
        Record {
            schema,
            variant,
            ids: Vec::new(),
            quality: None,
            filters: IndexSet::new(),
            info: InfoData::new(),
            sample_info: None,
            from_multi_alt: false,
            site: None,
        }
    }

    pub fn schema(&self) -> &SharedSchema {
        &self.schema
    }

    pub fn passes_filter(&self) -> bool {
        self.filters.is_empty()
    }

    /// Sample names of the schema this record belongs to.
    pub fn samples(&self) -> Vec<String> {
        self.schema.borrow().samples.clone()
    }

    fn info_integer(&self, key: &str) -> Result<Option<i64>> {
        Ok(self
            .info
            .get(key)?
            .and_then(|values| values.first())
            .and_then(FieldValue::as_i64))
    }

    /// 0-based exclusive end: INFO `END` when present, else the end of REF.
    pub fn end_position(&self) -> Result<u64> {
        match self.info_integer(INFO_END)? {
            Some(end) if end >= 0 => Ok(end as u64),
            _ => Ok(self.variant.pos_to()),
        }
    }

    /// Reference call, or a record carrying block bounds (`BEG`/`LEN`).
    pub fn is_ref_block(&self) -> bool {
        self.variant.is_ref()
            || self.info.contains_key(INFO_BEG)
            || self.info.contains_key(INFO_LEN)
    }

    /// Whether the ids were taken from a candidate-variant file (`CV`).
    pub fn from_candidate_file(&self) -> Result<bool> {
        Ok(matches!(
            self.info.get(INFO_CV)?,
            Some([FieldValue::Flag(true), ..])
        ))
    }

    ///
    /// Whether `other` can be written on the same line as this record: both
    /// come from one multi-ALT site, were split from the same input line (or
    /// were built by hand) and agree on ids, quality and filters.
    ///
    pub fn shares_site(&self, other: &Record) -> bool {
        let same_line = match (&self.site, &other.site) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_line
            && self.from_multi_alt
            && other.from_multi_alt
            && self.variant.chrom() == other.variant.chrom()
            && self.variant.pos_from() == other.variant.pos_from()
            && self.variant.ref_allele() == other.variant.ref_allele()
            && self.ids == other.ids
            && self.quality == other.quality
            && self.filters == other.filters
    }

    fn same_fields(&self, other: &Record) -> bool {
        self.ids == other.ids
            && self.quality == other.quality
            && self.filters == other.filters
            && self.info == other.info
            && self.sample_info == other.sample_info
            && self.from_multi_alt == other.from_multi_alt
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.variant == other.variant && self.same_fields(other)
    }
}

///
/// Records order by their variant. Records at the same variant that
/// differ elsewhere are unordered.
///
impl PartialOrd for Record {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.variant.cmp(&other.variant) {
            Ordering::Equal if self.same_fields(other) => Some(Ordering::Equal),
            Ordering::Equal => None,
            ordering => Some(ordering),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    use crate::info::DeferredInfoData;
    use crate::schema::{DataType, FieldMetadata, Number, Schema};

    #[fixture]
    fn schema() -> SharedSchema {
        let mut schema = Schema::new();
        schema.add_info(FieldMetadata::info("END", Number::Fixed(1), DataType::Integer, "End"));
        schema.add_info(FieldMetadata::info("CV", Number::Fixed(0), DataType::Flag, "Candidate"));
        schema.add_sample("NA001");
        schema.into_shared()
    }

    fn record(schema: &SharedSchema, pos: u64, alt: &str) -> Record {
        Record::new(schema.clone(), Variant::new("1", pos, "A", alt).unwrap())
    }

    #[rstest]
    fn test_defaults(schema: SharedSchema) {
        let r = record(&schema, 10, "C");
        assert!(r.passes_filter());
        assert_eq!(r.samples(), vec!["NA001".to_string()]);
        assert_eq!(r.end_position().unwrap(), 11);
        assert!(!r.is_ref_block());
        assert!(!r.from_candidate_file().unwrap());
    }

    #[rstest]
    fn test_well_known_info(schema: SharedSchema) {
        let mut r = record(&schema, 10, "<NON_REF>");
        r.info = InfoData::deferred(DeferredInfoData::new("END=120;CV", schema.clone()));
        assert_eq!(r.end_position().unwrap(), 120);
        assert!(r.is_ref_block());
        assert!(r.from_candidate_file().unwrap());
    }

    #[rstest]
    fn test_ordering(schema: SharedSchema) {
        let a = record(&schema, 10, "C");
        let b = record(&schema, 12, "C");
        let mut c = record(&schema, 10, "C");
        assert!(a < b);
        assert_eq!(a.partial_cmp(&c), Some(Ordering::Equal));
        c.filters.insert("q10".to_string());
        assert_ne!(a, c);
        assert_eq!(a.partial_cmp(&c), None);
    }
}
