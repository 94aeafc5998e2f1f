use std::cmp::Ordering;
use std::fmt::{self, Display};

use crate::consts::{MISSING_VALUE, NON_REF_ALLELE};
use crate::errors::{Result, VcfError};
use crate::models::chrom::{ChromosomeOrder, DefaultChromosomeOrder};
use crate::models::interval::ChromInterval;

/// Classification of a ref/alt pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(clippy::upper_case_acronyms)]
pub enum VariantType {
    REF,
    SNP,
    INS,
    DEL,
    MNP,
    SYM,
}

impl Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariantType::REF => "REF",
            VariantType::SNP => "SNP",
            VariantType::INS => "INS",
            VariantType::DEL => "DEL",
            VariantType::MNP => "MNP",
            VariantType::SYM => "SYM",
        };
        write!(f, "{}", name)
    }
}

///
/// One reference/alternate allele pair at a 0-based position.
///
/// Variants are immutable value objects: equality and hashing cover
/// `(chrom, pos_from, ref, alt)` (and therefore the derived `pos_to`).
///
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variant {
    chrom: String,
    pos_from: u64,
    ref_allele: String,
    alt: String,
}

impl Variant {
    pub fn new(
        chrom: impl Into<String>,
        pos_from: u64,
        ref_allele: impl Into<String>,
        alt: impl Into<String>,
    ) -> Result<Self> {
        let ref_allele = ref_allele.into();
        let alt = alt.into();
        if ref_allele.is_empty() || alt.is_empty() {
            return Err(VcfError::EmptyAllele);
        }
        Ok(Variant {
            chrom: chrom.into(),
            pos_from,
            ref_allele,
            alt,
        })
    }

    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    /// 0-based inclusive start.
    pub fn pos_from(&self) -> u64 {
        self.pos_from
    }

    /// 0-based exclusive end, `pos_from + len(ref)`.
    pub fn pos_to(&self) -> u64 {
        self.pos_from + self.ref_allele.len() as u64
    }

    pub fn ref_allele(&self) -> &str {
        &self.ref_allele
    }

    pub fn alt(&self) -> &str {
        &self.alt
    }

    pub fn length(&self) -> usize {
        self.ref_allele.len()
    }

    pub fn insert_size(&self) -> i64 {
        self.alt.len() as i64 - self.ref_allele.len() as i64
    }

    pub fn variant_type(&self) -> VariantType {
        let (r, a) = (self.ref_allele.as_str(), self.alt.as_str());
        if r == a || a == MISSING_VALUE || a == NON_REF_ALLELE {
            return VariantType::REF;
        }
        if a.starts_with('<') {
            return VariantType::SYM;
        }
        match r.len().cmp(&a.len()) {
            Ordering::Less => VariantType::INS,
            Ordering::Greater => VariantType::DEL,
            Ordering::Equal if r.len() == 1 => VariantType::SNP,
            Ordering::Equal => {
                let differing = r.bytes().zip(a.bytes()).filter(|(x, y)| x != y).count();
                if differing == 1 {
                    VariantType::SNP
                } else {
                    VariantType::MNP
                }
            }
        }
    }

    pub fn is_ref(&self) -> bool {
        self.variant_type() == VariantType::REF
    }

    pub fn is_snp(&self) -> bool {
        self.variant_type() == VariantType::SNP
    }

    pub fn is_indel(&self) -> bool {
        matches!(self.variant_type(), VariantType::INS | VariantType::DEL)
    }

    pub fn is_symbolic(&self) -> bool {
        self.variant_type() == VariantType::SYM
    }

    /// Reference span of this variant.
    pub fn interval(&self) -> ChromInterval {
        ChromInterval::new(self.chrom.clone(), self.pos_from, self.pos_to())
    }

    /// Compare using a caller-provided chromosome order.
    pub fn cmp_with<O: ChromosomeOrder + ?Sized>(&self, other: &Variant, order: &O) -> Ordering {
        order
            .compare(&self.chrom, &other.chrom)
            .then_with(|| self.pos_from.cmp(&other.pos_from))
            .then_with(|| self.pos_to().cmp(&other.pos_to()))
            .then_with(|| self.ref_allele.cmp(&other.ref_allele))
            .then_with(|| self.alt.cmp(&other.alt))
    }
}

impl Ord for Variant {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_with(other, &DefaultChromosomeOrder)
    }
}

impl PartialOrd for Variant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} {}>{}",
            self.chrom,
            self.pos_from + 1,
            self.ref_allele,
            self.alt
        )
    }
}

/// Sort variants in place with an injected chromosome order.
pub fn sort_variants_by<O: ChromosomeOrder + ?Sized>(variants: &mut [Variant], order: &O) {
    variants.sort_by(|a, b| a.cmp_with(b, order));
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::collections::HashSet;

    fn var(chrom: &str, pos: u64, r: &str, a: &str) -> Variant {
        Variant::new(chrom, pos, r, a).unwrap()
    }

    #[rstest]
    #[case("A", "A", VariantType::REF)]
    #[case("A", ".", VariantType::REF)]
    #[case("A", "<NON_REF>", VariantType::REF)]
    #[case("A", "<DEL>", VariantType::SYM)]
    #[case("A", "C", VariantType::SNP)]
    #[case("A", "AC", VariantType::INS)]
    #[case("AC", "A", VariantType::DEL)]
    #[case("ACG", "ATG", VariantType::SNP)]
    #[case("ACG", "TCA", VariantType::MNP)]
    fn test_variant_type(#[case] r: &str, #[case] a: &str, #[case] expected: VariantType) {
        assert_eq!(var("1", 10, r, a).variant_type(), expected);
    }

    #[rstest]
    fn test_derived_coordinates() {
        let v = var("1", 10, "ACG", "A");
        assert_eq!(v.pos_to(), 13);
        assert_eq!(v.length(), 3);
        assert_eq!(v.insert_size(), -2);
        assert_eq!(v.to_string(), "1:11 ACG>A");
    }

    #[rstest]
    fn test_empty_alleles_are_rejected() {
        assert!(Variant::new("1", 0, "", "A").is_err());
        assert!(Variant::new("1", 0, "A", "").is_err());
    }

    #[rstest]
    fn test_hash_and_equality() {
        let set: HashSet<Variant> = [var("1", 1, "A", "C"), var("1", 1, "A", "C")]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 1);
        assert_ne!(var("1", 1, "A", "C"), var("1", 1, "A", "G"));
        assert!(Some(&var("1", 1, "A", "C")) != None);
    }

    #[rstest]
    fn test_sorting_shuffled_variants() {
        let expected = vec![
            var("1", 5, "A", "C"),
            var("1", 5, "AT", "A"),
            var("1", 7, "G", "T"),
            var("2", 1, "C", "A"),
            var("10", 0, "T", "G"),
            var("X", 3, "A", "G"),
            var("MT", 3, "A", "G"),
            var("chrUn", 0, "A", "G"),
        ];
        let mut shuffled = expected.clone();
        shuffled.reverse();
        shuffled.swap(1, 4);
        shuffled.sort();
        assert_eq!(shuffled, expected);
    }

    #[rstest]
    fn test_order_is_consistent_with_equality() {
        let a = var("1", 5, "A", "C");
        let b = var("1", 5, "A", "C");
        assert_eq!(a.cmp(&b), Ordering::Equal);
        assert!(a <= b && b <= a);
    }

    #[rstest]
    fn test_injected_order() {
        let mut variants = vec![var("1", 0, "A", "C"), var("2", 0, "A", "C")];
        sort_variants_by(&mut variants, &|a: &str, b: &str| b.cmp(a));
        assert_eq!(variants[0].chrom(), "2");
    }
}
