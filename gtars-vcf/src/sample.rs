//! Per-record FORMAT/sample data.

use std::fmt::{self, Display};

use indexmap::IndexMap;

use crate::consts::{
    FORMAT_AD, FORMAT_DP, FORMAT_GL, FORMAT_GQ, FORMAT_GT, FORMAT_NR, FORMAT_NV, FORMAT_PL,
    FORMAT_VAF,
};
use crate::errors::{Result, VcfError};
use crate::models::GenotypeCall;
use crate::schema::{FieldValue, format_values};

/// One cell of the sample table: the GT call or a FORMAT value list.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    Genotype(GenotypeCall),
    Values(Vec<FieldValue>),
}

impl SampleValue {
    fn default_for(key: &str) -> Self {
        if key == FORMAT_GT {
            SampleValue::Genotype(GenotypeCall::default())
        } else {
            SampleValue::Values(Vec::new())
        }
    }

    pub fn as_genotype(&self) -> Option<&GenotypeCall> {
        match self {
            SampleValue::Genotype(call) => Some(call),
            SampleValue::Values(_) => None,
        }
    }

    pub fn as_values(&self) -> Option<&[FieldValue]> {
        match self {
            SampleValue::Values(values) => Some(values),
            SampleValue::Genotype(_) => None,
        }
    }
}

impl Display for SampleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleValue::Genotype(call) => write!(f, "{}", call),
            SampleValue::Values(values) => write!(f, "{}", format_values(values)),
        }
    }
}

///
/// Column-major sample table of one record: for every FORMAT key, one
/// slot per sample.
///
/// A new key starts with `./.` for GT and an empty list for anything else.
///
#[derive(Debug, Clone, PartialEq)]
pub struct SampleData {
    samples: Vec<String>,
    key_to_sample_values: IndexMap<String, Vec<SampleValue>>,
}

impl SampleData {
    ///
    /// Empty table for the given FORMAT keys and sample names.
    ///
    /// # Arguments
    /// - keys: FORMAT keys, in column order
    /// - samples: sample names, in column order
    ///
    pub fn new<I, K>(keys: I, samples: Vec<String>) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let mut data = SampleData {
            samples,
            key_to_sample_values: IndexMap::new(),
        };
        for key in keys {
            data.add_key(key);
        }
        data
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.key_to_sample_values.keys().map(String::as_str)
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.key_to_sample_values.contains_key(key)
    }

    /// Add a FORMAT key with default slots; existing keys are left untouched.
    pub fn add_key(&mut self, key: impl Into<String>) {
        let key = key.into();
        let n_samples = self.samples.len();
        self.key_to_sample_values
            .entry(key)
            .or_insert_with_key(|key| vec![SampleValue::default_for(key); n_samples]);
    }

    fn sample_index(&self, sample: &str) -> Result<usize> {
        self.samples
            .iter()
            .position(|name| name == sample)
            .ok_or_else(|| VcfError::UnknownSample(sample.to_string()))
    }

    fn slots(&self, key: &str) -> Result<&Vec<SampleValue>> {
        self.key_to_sample_values
            .get(key)
            .ok_or_else(|| VcfError::UnknownSampleKey(key.to_string()))
    }

    pub fn get(&self, key: &str, sample: &str) -> Result<&SampleValue> {
        let index = self.sample_index(sample)?;
        Ok(&self.slots(key)?[index])
    }

    /// Cell at `sample_index`, for callers walking samples in column order.
    pub fn get_at(&self, key: &str, sample_index: usize) -> Result<&SampleValue> {
        self.slots(key)?
            .get(sample_index)
            .ok_or_else(|| VcfError::UnknownSample(sample_index.to_string()))
    }

    pub fn genotype(&self, sample: &str) -> Result<&GenotypeCall> {
        match self.get(FORMAT_GT, sample)? {
            SampleValue::Genotype(call) => Ok(call),
            SampleValue::Values(_) => Err(VcfError::UnknownSampleKey(FORMAT_GT.to_string())),
        }
    }

    /// Values of a non-GT key; GT has no value list and reads as empty.
    pub fn values(&self, key: &str, sample: &str) -> Result<&[FieldValue]> {
        Ok(self.get(key, sample)?.as_values().unwrap_or(&[]))
    }

    pub fn set(&mut self, key: &str, sample: &str, value: SampleValue) -> Result<()> {
        let index = self.sample_index(sample)?;
        let slots = self
            .key_to_sample_values
            .get_mut(key)
            .ok_or_else(|| VcfError::UnknownSampleKey(key.to_string()))?;
        slots[index] = value;
        Ok(())
    }

    pub fn set_at(&mut self, key: &str, sample_index: usize, value: SampleValue) -> Result<()> {
        let slot = self
            .key_to_sample_values
            .get_mut(key)
            .ok_or_else(|| VcfError::UnknownSampleKey(key.to_string()))?
            .get_mut(sample_index)
            .ok_or_else(|| VcfError::UnknownSample(sample_index.to_string()))?;
        *slot = value;
        Ok(())
    }

    pub fn set_genotype(&mut self, sample: &str, call: GenotypeCall) -> Result<()> {
        self.set(FORMAT_GT, sample, SampleValue::Genotype(call))
    }

    pub fn set_values(&mut self, key: &str, sample: &str, values: Vec<FieldValue>) -> Result<()> {
        self.set(key, sample, SampleValue::Values(values))
    }

    ///
    /// Merge the GT calls of `other` into this table, sample by sample.
    /// Both tables must describe the same samples.
    ///
    pub fn merge_genotypes(&mut self, other: &SampleData) -> Result<()> {
        self.add_key(FORMAT_GT);
        for index in 0..self.samples.len() {
            let name = &self.samples[index];
            let theirs = other.genotype(name)?;
            let merged = match self.get_at(FORMAT_GT, index)? {
                SampleValue::Genotype(ours) => ours.merge(theirs)?,
                SampleValue::Values(_) => theirs.clone(),
            };
            self.set_at(FORMAT_GT, index, SampleValue::Genotype(merged))?;
        }
        Ok(())
    }

    fn first_number(&self, key: &str, sample: &str) -> Result<Option<f64>> {
        if !self.contains_key(key) {
            return Ok(None);
        }
        Ok(self
            .values(key, sample)?
            .first()
            .and_then(FieldValue::as_f64))
    }

    /// Read depth: DP, else NR, else the sum of AD.
    pub fn read_depth(&self, sample: &str) -> Result<Option<i64>> {
        for key in [FORMAT_DP, FORMAT_NR] {
            if let Some(depth) = self.first_number(key, sample)? {
                return Ok(Some(depth as i64));
            }
        }
        if !self.contains_key(FORMAT_AD) {
            return Ok(None);
        }
        let depths: Option<Vec<i64>> = self
            .values(FORMAT_AD, sample)?
            .iter()
            .map(FieldValue::as_i64)
            .collect();
        Ok(depths.filter(|d| !d.is_empty()).map(|d| d.iter().sum()))
    }

    /// Reads supporting the ALT: second AD entry, else NV.
    pub fn variant_support(&self, sample: &str) -> Result<Option<i64>> {
        if self.contains_key(FORMAT_AD) {
            let support = self
                .values(FORMAT_AD, sample)?
                .get(1)
                .and_then(FieldValue::as_i64);
            if let Some(support) = support {
                return Ok(Some(support));
            }
        }
        Ok(self.first_number(FORMAT_NV, sample)?.map(|v| v as i64))
    }

    /// VAF, else support over depth.
    pub fn variant_allele_frequency(&self, sample: &str) -> Result<Option<f64>> {
        if let Some(vaf) = self.first_number(FORMAT_VAF, sample)? {
            return Ok(Some(vaf));
        }
        match (self.variant_support(sample)?, self.read_depth(sample)?) {
            (Some(support), Some(depth)) if depth > 0 => Ok(Some(support as f64 / depth as f64)),
            _ => Ok(None),
        }
    }

    /// log10 likelihoods: GL as stored, else PL converted.
    pub fn genotype_likelihoods(&self, sample: &str) -> Result<Option<Vec<FieldValue>>> {
        if self.contains_key(FORMAT_GL) {
            let gl = self.values(FORMAT_GL, sample)?;
            if !gl.is_empty() {
                return Ok(Some(gl.to_vec()));
            }
        }
        if self.contains_key(FORMAT_PL) {
            let pl = self.values(FORMAT_PL, sample)?;
            if !pl.is_empty() {
                return Ok(Some(pl_to_gl(pl)));
            }
        }
        Ok(None)
    }

    pub fn genotype_quality(&self, sample: &str) -> Result<Option<i64>> {
        Ok(self.first_number(FORMAT_GQ, sample)?.map(|v| v as i64))
    }

    ///
    /// Render the FORMAT column followed by one column per sample, each
    /// `:`-joined in FORMAT key order.
    ///
    pub fn to_vcf_columns(&self) -> Vec<String> {
        let mut columns = Vec::with_capacity(self.samples.len() + 1);
        columns.push(self.keys().collect::<Vec<_>>().join(":"));
        for index in 0..self.samples.len() {
            let row: Vec<String> = self
                .key_to_sample_values
                .values()
                .map(|slots| slots[index].to_string())
                .collect();
            columns.push(row.join(":"));
        }
        columns
    }
}

/// Phred-scaled likelihoods to log10 (`PL / -10`); missing stays missing.
pub fn pl_to_gl(values: &[FieldValue]) -> Vec<FieldValue> {
    values
        .iter()
        .map(|v| match v.as_f64() {
            // adding 0.0 turns -0.0 into 0.0
            Some(pl) => FieldValue::Float(pl / -10.0 + 0.0),
            None => FieldValue::Missing,
        })
        .collect()
}

/// log10 likelihoods to phred scale (`GL * -10`, rounded).
pub fn gl_to_pl(values: &[FieldValue]) -> Vec<FieldValue> {
    values
        .iter()
        .map(|v| match v.as_f64() {
            Some(gl) => FieldValue::Integer((gl * -10.0).round() as i64),
            None => FieldValue::Missing,
        })
        .collect()
}
