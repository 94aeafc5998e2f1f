//! Per-ALT views of multi-allelic lines.
//!
//! A line with several ALTs is read as one record per ALT: every INFO and
//! FORMAT field is distributed over the ALTs according to its declared
//! cardinality. The join functions rebuild the single-line form from such a
//! group of records when writing.

use indexmap::{IndexMap, IndexSet};

use crate::consts::FORMAT_GT;
use crate::errors::{Result, VcfError};
use crate::info::{DeferredInfoValue, InfoData, InfoValue, split_info_column};
use crate::models::{GenotypeCall, genotype_count, gl_index};
use crate::sample::{SampleData, SampleValue};
use crate::schema::{FieldKind, FieldMetadata, FieldValue, Number, SharedSchema, resolve_field};

///
/// Split a raw INFO column into one [`InfoData`] per ALT.
///
/// Declared keys are parsed right away; undeclared keys become deferred
/// values that infer their schema entry when first read.
///
pub fn split_info(raw: &str, n_alts: usize, schema: &SharedSchema) -> Result<Vec<InfoData>> {
    let mut per_alt: Vec<IndexMap<String, InfoValue>> = vec![IndexMap::new(); n_alts];
    for (key, value) in split_info_column(raw) {
        let declared = schema.borrow().field(FieldKind::Info, key).cloned();
        match declared {
            Some(metadata) => {
                let split = metadata.extract_data(value, n_alts, None)?;
                for (entries, values) in per_alt.iter_mut().zip(split) {
                    entries.insert(key.to_string(), InfoValue::Parsed(values));
                }
            }
            None => {
                for (alt_index, entries) in per_alt.iter_mut().enumerate() {
                    let deferred = DeferredInfoValue::for_alt(
                        key,
                        value.map(str::to_string),
                        schema.clone(),
                        n_alts,
                        alt_index,
                    );
                    entries.insert(key.to_string(), InfoValue::Deferred(deferred));
                }
            }
        }
    }
    Ok(per_alt.into_iter().map(InfoData::from_entries).collect())
}

///
/// Parse the FORMAT column and the sample columns of a line into one
/// [`SampleData`] per ALT.
///
/// # Arguments
/// - format: the raw FORMAT column
/// - columns: one raw column per sample, in header order
/// - n_alts: number of ALTs on the line
/// - schema: schema holding the FORMAT declarations and the sample names
///
pub fn split_samples(
    format: &str,
    columns: &[&str],
    n_alts: usize,
    schema: &SharedSchema,
) -> Result<Vec<SampleData>> {
    let samples = schema.borrow().samples.clone();
    if columns.len() != samples.len() {
        return Err(VcfError::MalformedRecord(format!(
            "expected {} sample column(s), found {}",
            samples.len(),
            columns.len()
        )));
    }
    let keys: Vec<&str> = format.split(':').collect();
    let metadata: Vec<Option<FieldMetadata>> = keys
        .iter()
        .map(|key| (*key != FORMAT_GT).then(|| resolve_field(schema, FieldKind::Format, key)))
        .collect();
    let gt_index = keys.iter().position(|key| *key == FORMAT_GT);

    let mut tables = vec![SampleData::new(keys.iter().copied(), samples); n_alts];
    for (sample_index, column) in columns.iter().enumerate() {
        let tokens: Vec<&str> = column.split(':').collect();
        if tokens.len() > keys.len() {
            return Err(VcfError::MalformedRecord(format!(
                "sample column {:?} has more fields than FORMAT {:?}",
                column, format
            )));
        }

        let genotype = match gt_index.and_then(|i| tokens.get(i)) {
            Some(token) => Some(token.parse::<GenotypeCall>()?),
            None => None,
        };
        if let Some(call) = &genotype {
            let projections = if n_alts == 1 {
                vec![call.clone()]
            } else {
                call.split_alts(n_alts)
            };
            for (table, projection) in tables.iter_mut().zip(projections) {
                table.set_at(FORMAT_GT, sample_index, SampleValue::Genotype(projection))?;
            }
        }

        for ((key, token), metadata) in keys.iter().zip(&tokens).zip(&metadata) {
            let Some(metadata) = metadata else {
                continue;
            };
            let split = if n_alts == 1 {
                vec![metadata.parse_values(Some(*token))]
            } else {
                metadata.extract_data(Some(*token), n_alts, genotype.as_ref())?
            };
            for (table, values) in tables.iter_mut().zip(split) {
                table.set_at(key, sample_index, SampleValue::Values(values))?;
            }
        }
    }
    Ok(tables)
}

fn first_or_missing(values: &[FieldValue]) -> FieldValue {
    values.first().cloned().unwrap_or(FieldValue::Missing)
}

fn nth_or_missing(values: &[FieldValue], n: usize) -> FieldValue {
    values.get(n).cloned().unwrap_or(FieldValue::Missing)
}

fn join_per_alt(lists: &[&[FieldValue]]) -> Vec<FieldValue> {
    lists.iter().map(|values| first_or_missing(values)).collect()
}

fn join_per_allele(lists: &[&[FieldValue]]) -> Vec<FieldValue> {
    let reference = lists
        .first()
        .map_or(FieldValue::Missing, |values| first_or_missing(values));
    std::iter::once(reference)
        .chain(lists.iter().map(|values| nth_or_missing(values, 1)))
        .collect()
}

///
/// Rebuild a G-cardinality list from per-ALT likelihoods. Entries for
/// genotypes mixing two different ALTs are not kept by the split and come
/// back as missing.
///
fn join_likelihoods(lists: &[&[FieldValue]], call: &GenotypeCall) -> Vec<FieldValue> {
    if lists.iter().any(|values| values.is_empty()) {
        return Vec::new();
    }
    if lists.iter().all(|values| *values == [FieldValue::Missing]) {
        return vec![FieldValue::Missing];
    }
    let n_alts = lists.len();
    match call.ploidy() {
        1 if lists.iter().all(|values| values.len() == 2) => std::iter::once(lists[0][0].clone())
            .chain(lists.iter().map(|values| values[1].clone()))
            .collect(),
        2 if lists.iter().all(|values| values.len() == 3) => {
            let mut joined = vec![FieldValue::Missing; genotype_count(2, n_alts)];
            joined[gl_index(0, 0)] = lists[0][0].clone();
            for (k, values) in (1..=n_alts).zip(lists) {
                joined[gl_index(0, k)] = values[1].clone();
                joined[gl_index(k, k)] = values[2].clone();
            }
            joined
        }
        _ => Vec::new(),
    }
}

fn ordered_keys<'a, I>(key_lists: I) -> IndexSet<String>
where
    I: IntoIterator,
    I::Item: IntoIterator<Item = &'a str>,
{
    key_lists
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect()
}

///
/// Join the per-ALT INFO data of one site back into a single column:
/// `A` fields are concatenated, `R` fields get the shared REF value
/// followed by each ALT value, anything else keeps the first ALT's value.
///
pub fn join_info(parts: &[&InfoData], schema: &SharedSchema) -> Result<InfoData> {
    if let [single] = parts {
        return Ok((*single).clone());
    }
    let keys = ordered_keys(parts.iter().map(|info| info.keys()));
    let mut entries = IndexMap::new();
    for key in keys {
        let number = schema
            .borrow()
            .field(FieldKind::Info, &key)
            .map(|metadata| metadata.number);
        let value = match number {
            Some(number @ (Number::A | Number::R)) => {
                let lists = parts
                    .iter()
                    .map(|info| Ok(info.get(&key)?.unwrap_or(&[])))
                    .collect::<Result<Vec<&[FieldValue]>>>()?;
                let joined = if number == Number::A {
                    join_per_alt(&lists)
                } else {
                    join_per_allele(&lists)
                };
                InfoValue::Parsed(joined)
            }
            _ => match parts.iter().find_map(|info| info.entry(&key)) {
                Some(value) => value.clone(),
                None => continue,
            },
        };
        entries.insert(key, value);
    }
    Ok(InfoData::from_entries(entries))
}

///
/// Join the per-ALT sample tables of one site back into a single table.
/// GT calls are rebuilt from their projections; FORMAT fields follow the
/// same rules as [`join_info`], with `G` fields rebuilt by ploidy.
///
pub fn join_samples(parts: &[&SampleData], schema: &SharedSchema) -> Result<SampleData> {
    let Some(first) = parts.first() else {
        return Err(VcfError::MalformedRecord("no sample data to join".to_string()));
    };
    if parts.len() == 1 {
        return Ok((*first).clone());
    }
    let keys = ordered_keys(parts.iter().map(|table| table.keys()));
    let mut joined = SampleData::new(keys.iter().cloned(), first.samples().to_vec());

    for sample_index in 0..first.samples().len() {
        let projections: Vec<GenotypeCall> = parts
            .iter()
            .map(|table| match table.get_at(FORMAT_GT, sample_index) {
                Ok(SampleValue::Genotype(call)) => call.clone(),
                _ => GenotypeCall::default(),
            })
            .collect();
        let call = GenotypeCall::from_alt_projections(&projections);

        for key in &keys {
            if key == FORMAT_GT {
                continue;
            }
            let lists: Vec<&[FieldValue]> = parts
                .iter()
                .map(|table| match table.get_at(key, sample_index) {
                    Ok(SampleValue::Values(values)) => values.as_slice(),
                    _ => &[][..],
                })
                .collect();
            let number = schema
                .borrow()
                .field(FieldKind::Format, key)
                .map(|metadata| metadata.number);
            let values = match number {
                Some(Number::A) => join_per_alt(&lists),
                Some(Number::R) => join_per_allele(&lists),
                Some(Number::G) => join_likelihoods(&lists, &call),
                _ => lists[0].to_vec(),
            };
            joined.set_at(key, sample_index, SampleValue::Values(values))?;
        }
        if keys.contains(FORMAT_GT) {
            joined.set_at(FORMAT_GT, sample_index, SampleValue::Genotype(call))?;
        }
    }
    Ok(joined)
}
