//! Variant normalisation.
//!
//! Common prefix/suffix trimming of ref/alt pairs, rebuilding of VCF-legal
//! alleles with one context base, and splitting of MNPs into SNPs.

use crate::consts::MISSING_VALUE;
use crate::errors::{Result, VcfError};
use crate::models::Variant;

/// Length of the common prefix of two alleles.
pub fn common_prefix_length(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

/// Length of the common suffix of two alleles.
pub fn common_suffix_length(a: &str, b: &str) -> usize {
    a.chars()
        .rev()
        .zip(b.chars().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

///
/// Remove the common suffix, then the common prefix of `ref_allele` and
/// `alt`.
///
/// Returns `(start_offset, trimmed_ref, trimmed_alt)`; either allele may be
/// empty afterwards.
///
pub fn trimmed_ref_alt(ref_allele: &str, alt: &str) -> (usize, String, String) {
    let ref_bases: Vec<char> = ref_allele.chars().collect();
    let alt_bases: Vec<char> = alt.chars().collect();
    let suffix = common_suffix_length(ref_allele, alt);
    let ref_core = &ref_bases[..ref_bases.len() - suffix];
    let alt_core = &alt_bases[..alt_bases.len() - suffix];

    let prefix = ref_core
        .iter()
        .zip(alt_core)
        .take_while(|(x, y)| x == y)
        .count();
    (
        prefix,
        ref_core[prefix..].iter().collect(),
        alt_core[prefix..].iter().collect(),
    )
}

///
/// Trim a ref/alt pair and rebuild a VCF-legal representation.
///
/// When the trimmed alleles differ in length one flanking reference base is
/// re-attached: on the right when nothing was trimmed from the left,
/// otherwise on the left. Equal-length alleles are returned trimmed.
///
/// # Errors
/// Empty, missing (`.`), symbolic and multi-base monomorphic inputs are
/// rejected.
///
pub fn trimmed_vcf_ref_alt(ref_allele: &str, alt: &str) -> Result<(usize, String, String)> {
    let monomorphic = || VcfError::MonomorphicVariant {
        ref_allele: ref_allele.to_string(),
        alt: alt.to_string(),
    };
    if ref_allele.is_empty() || alt.is_empty() {
        return Err(VcfError::EmptyAllele);
    }
    if ref_allele == MISSING_VALUE
        || alt == MISSING_VALUE
        || alt.starts_with('<')
        || (ref_allele == alt && ref_allele.chars().count() > 1)
    {
        return Err(monomorphic());
    }

    let (offset, new_ref, new_alt) = trimmed_ref_alt(ref_allele, alt);
    let (ref_len, alt_len) = (new_ref.chars().count(), new_alt.chars().count());
    if ref_len == alt_len && ref_len > 0 {
        return Ok((offset, new_ref, new_alt));
    }

    let ref_bases: Vec<char> = ref_allele.chars().collect();
    let trimmed_end = offset + ref_len;
    if offset > 0 {
        let anchor = ref_bases[offset - 1];
        Ok((
            offset - 1,
            format!("{}{}", anchor, new_ref),
            format!("{}{}", anchor, new_alt),
        ))
    } else if trimmed_end < ref_bases.len() {
        let anchor = ref_bases[trimmed_end];
        Ok((
            offset,
            format!("{}{}", new_ref, anchor),
            format!("{}{}", new_alt, anchor),
        ))
    } else {
        // no shared base to anchor on: the pair is already minimal
        Ok((offset, new_ref, new_alt))
    }
}

impl Variant {
    /// The same variant with ref/alt trimmed to their VCF-legal minimum.
    pub fn trimmed(&self) -> Result<Variant> {
        let (offset, new_ref, new_alt) = trimmed_vcf_ref_alt(self.ref_allele(), self.alt())?;
        Variant::new(
            self.chrom(),
            self.pos_from() + offset as u64,
            new_ref,
            new_alt,
        )
    }
}

///
/// Split an equal-length multi-base variant into single-base variants, one
/// per differing position. With `include_ref_calls` the matching positions
/// are emitted too, as reference calls. Any other variant is returned as is.
///
pub fn split_mnp_variant(variant: &Variant, include_ref_calls: bool) -> Vec<Variant> {
    let (r, a) = (variant.ref_allele(), variant.alt());
    let length = r.chars().count();
    if length != a.chars().count() || length < 2 || variant.is_symbolic() || a == MISSING_VALUE {
        return vec![variant.clone()];
    }
    r.chars()
        .enumerate()
        .zip(a.chars())
        .filter(|((_, rb), ab)| include_ref_calls || rb != ab)
        .filter_map(|((i, rb), ab)| {
            Variant::new(
                variant.chrom(),
                variant.pos_from() + i as u64,
                rb.to_string(),
                ab.to_string(),
            )
            .ok()
        })
        .collect()
}
