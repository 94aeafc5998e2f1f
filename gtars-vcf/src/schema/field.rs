//! INFO/FORMAT field descriptors and typed field values.
//!
//! A [`FieldMetadata`] knows how to turn the raw comma-separated text of a
//! field into typed values, and how to distribute those values over the
//! ALTs of a multi-allelic record according to the field's cardinality.

use std::fmt::{self, Display};
use std::str::FromStr;

use crate::consts::{INFERRED_SOURCE, MISSING_VALUE};
use crate::errors::{Result, VcfError};
use crate::models::genotype::{GenotypeCall, genotype_count, gl_index};

/// The `Number=` cardinality of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Number {
    /// One value per ALT.
    A,
    /// One value per allele, REF included.
    R,
    /// One value per possible genotype.
    G,
    /// `.`: unknown, shared by every ALT.
    Unknown,
    /// Exactly k values, shared by every ALT.
    Fixed(usize),
}

impl FromStr for Number {
    type Err = VcfError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "A" => Ok(Number::A),
            "R" => Ok(Number::R),
            "G" => Ok(Number::G),
            "." => Ok(Number::Unknown),
            _ => s
                .parse::<usize>()
                .map(Number::Fixed)
                .map_err(|_| VcfError::InvalidNumber(s.to_string())),
        }
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::A => write!(f, "A"),
            Number::R => write!(f, "R"),
            Number::G => write!(f, "G"),
            Number::Unknown => write!(f, "."),
            Number::Fixed(k) => write!(f, "{}", k),
        }
    }
}

/// The `Type=` of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Integer,
    Float,
    Flag,
    Character,
    String,
}

impl FromStr for DataType {
    type Err = VcfError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Integer" => Ok(DataType::Integer),
            "Float" => Ok(DataType::Float),
            "Flag" => Ok(DataType::Flag),
            "Character" => Ok(DataType::Character),
            "String" => Ok(DataType::String),
            _ => Err(VcfError::InvalidDataType(s.to_string())),
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Integer => "Integer",
            DataType::Float => "Float",
            DataType::Flag => "Flag",
            DataType::Character => "Character",
            DataType::String => "String",
        };
        write!(f, "{}", name)
    }
}

/// Whether a descriptor was declared by `##INFO` or `##FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Info,
    Format,
}

/// A single typed value; `Missing` stands for `.`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Flag(bool),
    Character(char),
    String(String),
    Missing,
}

impl FieldValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            FieldValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Missing, Into::into)
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Flag(b) => write!(f, "{}", u8::from(*b)),
            FieldValue::Character(c) => write!(f, "{}", c),
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Missing => write!(f, "{}", MISSING_VALUE),
        }
    }
}

/// Render a value list as a comma-joined token; empty renders as `.`.
pub fn format_values(values: &[FieldValue]) -> String {
    if values.is_empty() {
        return MISSING_VALUE.to_string();
    }
    values
        .iter()
        .map(FieldValue::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_flag(token: &str) -> Option<bool> {
    match token.to_ascii_uppercase().as_str() {
        "1" | "YES" | "TRUE" => Some(true),
        "0" | "NO" | "FALSE" => Some(false),
        _ => None,
    }
}

impl DataType {
    ///
    /// Parse one raw token. `.` is `Missing`; a token that does not parse
    /// as this type is reported and treated as missing.
    ///
    pub fn parse_token(&self, key: &str, token: &str) -> FieldValue {
        if token == MISSING_VALUE {
            return FieldValue::Missing;
        }
        let parsed = match self {
            DataType::Integer => token.parse::<i64>().ok().map(FieldValue::Integer),
            DataType::Float => token.parse::<f64>().ok().map(FieldValue::Float),
            DataType::Flag => parse_flag(token).map(FieldValue::Flag),
            DataType::Character => {
                let mut chars = token.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(FieldValue::Character(c)),
                    _ => None,
                }
            }
            DataType::String => Some(FieldValue::String(token.to_string())),
        };
        parsed.unwrap_or_else(|| {
            tracing::warn!(
                "Could not parse {:?} as {} for field {}; using missing value",
                token,
                self,
                key
            );
            FieldValue::Missing
        })
    }
}

///
/// Descriptor of one INFO or FORMAT field: cardinality, type and the
/// header text.
///
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMetadata {
    pub id: String,
    pub number: Number,
    pub data_type: DataType,
    pub description: String,
    pub source: Option<String>,
    pub version: Option<String>,
    pub kind: FieldKind,
}

impl FieldMetadata {
    pub fn new(
        kind: FieldKind,
        id: impl Into<String>,
        number: Number,
        data_type: DataType,
        description: impl Into<String>,
    ) -> Self {
        FieldMetadata {
            id: id.into(),
            number,
            data_type,
            description: description.into(),
            source: None,
            version: None,
            kind,
        }
    }

    pub fn info(
        id: impl Into<String>,
        number: Number,
        data_type: DataType,
        description: impl Into<String>,
    ) -> Self {
        Self::new(FieldKind::Info, id, number, data_type, description)
    }

    pub fn format(
        id: impl Into<String>,
        number: Number,
        data_type: DataType,
        description: impl Into<String>,
    ) -> Self {
        Self::new(FieldKind::Format, id, number, data_type, description)
    }

    /// Entry synthesized for a key used on a data line but never declared.
    pub fn inferred(kind: FieldKind, id: impl Into<String>) -> Self {
        let mut metadata = Self::new(kind, id, Number::Unknown, DataType::String, "");
        metadata.source = Some(INFERRED_SOURCE.to_string());
        metadata
    }

    pub fn is_inferred(&self) -> bool {
        self.source.as_deref() == Some(INFERRED_SOURCE)
    }

    ///
    /// Parse the raw text of a field into typed values. `None` is a key
    /// without `=`, which only makes sense for flags.
    ///
    pub fn parse_values(&self, raw: Option<&str>) -> Vec<FieldValue> {
        match raw {
            None => vec![FieldValue::Flag(true)],
            Some(raw) if self.data_type == DataType::Flag && raw.is_empty() => {
                vec![FieldValue::Flag(true)]
            }
            Some(raw) => raw
                .split(',')
                .map(|token| self.data_type.parse_token(&self.id, token))
                .collect(),
        }
    }

    ///
    /// Parse `raw` and split it into one value list per ALT.
    ///
    /// # Arguments
    /// - raw: the field text, `None` for a bare flag
    /// - n_alts: number of ALTs of the record
    /// - genotype: the sample's call, consulted for FORMAT fields of `G` cardinality
    ///
    pub fn extract_data(
        &self,
        raw: Option<&str>,
        n_alts: usize,
        genotype: Option<&GenotypeCall>,
    ) -> Result<Vec<Vec<FieldValue>>> {
        self.split_alts(self.parse_values(raw), n_alts, genotype)
    }

    /// Distribute parsed values over `n_alts` ALTs according to the cardinality.
    pub fn split_alts(
        &self,
        values: Vec<FieldValue>,
        n_alts: usize,
        genotype: Option<&GenotypeCall>,
    ) -> Result<Vec<Vec<FieldValue>>> {
        match (self.number, self.kind) {
            (Number::A, _) => Ok(self.split_per_alt(values, n_alts)),
            (Number::R, _) => self.split_per_allele(values, n_alts),
            (Number::G, FieldKind::Format) => Ok(self.split_likelihoods(values, n_alts, genotype)),
            (Number::Fixed(k), _) => {
                let flag = self.data_type == DataType::Flag;
                if !flag && values.len() != k && !(values.len() == 1 && values[0].is_missing()) {
                    tracing::warn!(
                        "Field {} declares {} values but {} were found",
                        self.id,
                        k,
                        values.len()
                    );
                }
                Ok(vec![values; n_alts])
            }
            _ => Ok(vec![values; n_alts]),
        }
    }

    fn split_per_alt(&self, values: Vec<FieldValue>, n_alts: usize) -> Vec<Vec<FieldValue>> {
        if values.len() > n_alts {
            tracing::warn!(
                "Field {} has {} values for {} ALT(s); extra values are dropped",
                self.id,
                values.len(),
                n_alts
            );
        } else if values.len() < n_alts {
            tracing::warn!(
                "Field {} has {} values for {} ALT(s); padding with missing values",
                self.id,
                values.len(),
                n_alts
            );
        }
        let mut per_alt: Vec<Vec<FieldValue>> =
            values.into_iter().take(n_alts).map(|v| vec![v]).collect();
        per_alt.resize(n_alts, vec![FieldValue::Missing]);
        per_alt
    }

    fn split_per_allele(
        &self,
        values: Vec<FieldValue>,
        n_alts: usize,
    ) -> Result<Vec<Vec<FieldValue>>> {
        if values.len() != n_alts + 1 {
            return Err(VcfError::Cardinality {
                key: self.id.clone(),
                expected: n_alts + 1,
                found: values.len(),
            });
        }
        let reference = &values[0];
        Ok(values[1..]
            .iter()
            .map(|alt| vec![reference.clone(), alt.clone()])
            .collect())
    }

    ///
    /// Re-index genotype likelihoods for each ALT: haploid calls keep
    /// `[R, A_k]`, diploid calls keep `[RR, RA_k, A_kA_k]`. Anything that
    /// does not match the ploidy of the call degrades to empty lists.
    ///
    fn split_likelihoods(
        &self,
        values: Vec<FieldValue>,
        n_alts: usize,
        genotype: Option<&GenotypeCall>,
    ) -> Vec<Vec<FieldValue>> {
        let degraded = vec![Vec::new(); n_alts];
        if values.len() == 1 && values[0].is_missing() {
            return vec![values; n_alts];
        }
        let ploidy = match genotype.map(GenotypeCall::ploidy) {
            Some(p @ (1 | 2)) => p,
            other => {
                tracing::warn!(
                    "Cannot split {} without a haploid or diploid genotype (ploidy {:?})",
                    self.id,
                    other
                );
                return degraded;
            }
        };
        let expected = genotype_count(ploidy, n_alts);
        if values.len() != expected {
            tracing::warn!(
                "Field {} has {} likelihoods, expected {} for ploidy {} and {} ALT(s)",
                self.id,
                values.len(),
                expected,
                ploidy,
                n_alts
            );
            return degraded;
        }
        (1..=n_alts)
            .map(|k| match ploidy {
                1 => vec![values[0].clone(), values[k].clone()],
                _ => vec![
                    values[gl_index(0, 0)].clone(),
                    values[gl_index(0, k)].clone(),
                    values[gl_index(k, k)].clone(),
                ],
            })
            .collect()
    }
}
