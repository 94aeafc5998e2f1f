use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::{Result, VcfError};

///
/// A genotype call: allele indices (0 = REF, k = k-th ALT, `None` = `.`)
/// with a phasing flag.
///
/// Unphased calls keep their alleles sorted (missing first) so that any
/// permutation of an unphased genotype compares equal.
///
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenotypeCall {
    alleles: Vec<Option<usize>>,
    phased: bool,
}

impl GenotypeCall {
    pub fn new(alleles: Vec<Option<usize>>, phased: bool) -> Self {
        let mut call = GenotypeCall { alleles, phased };
        call.canonicalize();
        call
    }

    /// All-missing call of the given ploidy, e.g. `./.` for 2.
    pub fn unknown(ploidy: usize) -> Self {
        GenotypeCall {
            alleles: vec![None; ploidy],
            phased: false,
        }
    }

    fn canonicalize(&mut self) {
        if !self.phased {
            // Option orders None before Some, matching None == -1
            self.alleles.sort();
        }
    }

    pub fn alleles(&self) -> &[Option<usize>] {
        &self.alleles
    }

    pub fn phased(&self) -> bool {
        self.phased
    }

    pub fn ploidy(&self) -> usize {
        self.alleles.len()
    }

    pub fn is_haploid(&self) -> bool {
        self.ploidy() == 1
    }

    pub fn is_diploid(&self) -> bool {
        self.ploidy() == 2
    }

    /// At least one allele that is neither REF nor missing.
    pub fn is_called(&self) -> bool {
        self.alleles.iter().any(|a| matches!(a, Some(k) if *k != 0))
    }

    pub fn is_unknown(&self) -> bool {
        self.alleles.iter().all(Option::is_none)
    }

    pub fn is_heterozygous(&self) -> bool {
        if self.alleles.iter().any(Option::is_none) {
            return false;
        }
        let mut distinct = self.alleles.clone();
        distinct.sort();
        distinct.dedup();
        distinct.len() == 2
    }

    pub fn is_homozygous_ref(&self) -> bool {
        !self.alleles.is_empty() && self.alleles.iter().all(|a| *a == Some(0))
    }

    pub fn is_homozygous_alt(&self) -> bool {
        match self.alleles.first() {
            Some(Some(first)) if *first != 0 => self.alleles.iter().all(|a| *a == Some(*first)),
            _ => false,
        }
    }

    ///
    /// Sorted multiplicities of each allele reduced by their gcd, with a
    /// missing allele counted as REF. `0/1` gives `[1, 1]`, `1/1/1/2`
    /// gives `[1, 3]`, `2/2` gives `[1]`.
    ///
    pub fn normalized_allele_count(&self) -> Vec<usize> {
        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for allele in &self.alleles {
            *counts.entry(allele.unwrap_or(0)).or_default() += 1;
        }
        let mut multiplicities: Vec<usize> = counts.into_values().collect();
        let divisor = multiplicities.iter().copied().fold(0, gcd);
        if divisor > 1 {
            multiplicities.iter_mut().for_each(|m| *m /= divisor);
        }
        multiplicities.sort_unstable();
        multiplicities
    }

    ///
    /// Project this call onto each ALT of a multi-allelic site: for the
    /// k-th ALT an allele equal to k becomes 1, any other ALT becomes 0 and
    /// missing alleles stay missing. Phasing is preserved.
    ///
    pub fn split_alts(&self, n_alts: usize) -> Vec<GenotypeCall> {
        (1..=n_alts)
            .map(|k| {
                let alleles = self
                    .alleles
                    .iter()
                    .map(|a| a.map(|idx| usize::from(idx == k)))
                    .collect();
                GenotypeCall::new(alleles, self.phased)
            })
            .collect()
    }

    ///
    /// Inverse of [`GenotypeCall::split_alts`]: rebuild the multi-allelic
    /// call from its per-ALT projections.
    ///
    pub fn from_alt_projections(projections: &[GenotypeCall]) -> GenotypeCall {
        if projections.is_empty() {
            return GenotypeCall::unknown(2);
        }
        let ploidy = projections.iter().map(GenotypeCall::ploidy).max().unwrap_or(0);
        let phased = projections.iter().all(GenotypeCall::phased);

        if phased {
            let alleles = (0..ploidy)
                .map(|slot| {
                    let column: Vec<Option<usize>> = projections
                        .iter()
                        .map(|p| p.alleles.get(slot).copied().flatten())
                        .collect();
                    if let Some(k) = column.iter().position(|a| *a == Some(1)) {
                        Some(k + 1)
                    } else if column.iter().all(Option::is_none) {
                        None
                    } else {
                        Some(0)
                    }
                })
                .collect();
            return GenotypeCall::new(alleles, true);
        }

        let missing = projections
            .iter()
            .map(|p| p.alleles.iter().filter(|a| a.is_none()).count())
            .max()
            .unwrap_or(0);
        let mut alleles: Vec<Option<usize>> = vec![None; missing];
        for (k, projection) in projections.iter().enumerate() {
            let alt_copies = projection.alleles.iter().filter(|a| **a == Some(1)).count();
            alleles.extend(std::iter::repeat_n(Some(k + 1), alt_copies));
        }
        while alleles.len() < ploidy {
            alleles.push(Some(0));
        }
        alleles.truncate(ploidy.max(1));
        GenotypeCall::new(alleles, false)
    }

    ///
    /// Merge two diploid calls describing different ALTs of the same site.
    ///
    /// REF calls yield the other side, equal phased calls are kept, two
    /// heterozygous calls become homozygous ALT. A homozygous ALT against a
    /// heterozygous call is a contradiction.
    ///
    pub fn merge(&self, other: &GenotypeCall) -> Result<GenotypeCall> {
        let conflict = || VcfError::GenotypeMerge {
            lhs: self.to_string(),
            rhs: other.to_string(),
        };
        if !self.is_diploid() || !other.is_diploid() {
            return Err(conflict());
        }
        if self.phased && other.phased && self == other {
            return Ok(self.clone());
        }
        if self.is_homozygous_ref() || self.is_unknown() {
            return Ok(other.clone());
        }
        if other.is_homozygous_ref() || other.is_unknown() {
            return Ok(self.clone());
        }
        if self.is_homozygous_alt() && other.is_homozygous_alt() {
            return Ok(self.clone());
        }
        if self.is_heterozygous() && other.is_heterozygous() {
            return Ok(GenotypeCall::new(
                vec![Some(1), Some(1)],
                self.phased && other.phased,
            ));
        }
        Err(conflict())
    }
}

impl Default for GenotypeCall {
    fn default() -> Self {
        GenotypeCall::unknown(2)
    }
}

impl FromStr for GenotypeCall {
    type Err = VcfError;

    fn from_str(s: &str) -> Result<Self> {
        let phased = s.contains('|');
        if phased && s.contains('/') {
            return Err(VcfError::InvalidGenotype(s.to_string()));
        }
        let separator = if phased { '|' } else { '/' };
        let alleles = s
            .split(separator)
            .map(|token| match token {
                "." => Ok(None),
                _ => token
                    .parse::<usize>()
                    .map(Some)
                    .map_err(|_| VcfError::InvalidGenotype(s.to_string())),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(GenotypeCall::new(alleles, phased))
    }
}

impl Display for GenotypeCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = if self.phased { "|" } else { "/" };
        let rendered: Vec<String> = self
            .alleles
            .iter()
            .map(|a| a.map_or_else(|| ".".to_string(), |k| k.to_string()))
            .collect();
        write!(f, "{}", rendered.join(separator))
    }
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// Index of the genotype `a1/a2` (a1 <= a2) in a G-cardinality list.
#[inline]
pub fn gl_index(a1: usize, a2: usize) -> usize {
    let (lo, hi) = if a1 <= a2 { (a1, a2) } else { (a2, a1) };
    hi * (hi + 1) / 2 + lo
}

/// Number of unordered genotypes, `C(ploidy + n_alts, n_alts)`.
pub fn genotype_count(ploidy: usize, n_alts: usize) -> usize {
    let n = ploidy + n_alts;
    let k = n_alts.min(ploidy);
    (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn gt(s: &str) -> GenotypeCall {
        s.parse().unwrap()
    }

    #[rstest]
    fn test_parse_and_display() {
        assert_eq!(gt("1/0").to_string(), "0/1");
        assert_eq!(gt("1|0").to_string(), "1|0");
        assert_eq!(gt("./1").to_string(), "./1");
        assert_eq!(gt("1/.").to_string(), "./1");
        assert_eq!(gt(".").to_string(), ".");
        assert_eq!(GenotypeCall::default().to_string(), "./.");
        assert!("1/x".parse::<GenotypeCall>().is_err());
        assert!("1/2|0".parse::<GenotypeCall>().is_err());
    }

    #[rstest]
    fn test_unphased_permutations_are_equal() {
        assert_eq!(gt("0/1"), gt("1/0"));
        assert_eq!(gt("2/1/0"), gt("0/2/1"));
        assert_ne!(gt("0|1"), gt("1|0"));
    }

    #[rstest]
    #[case("0/0", false, false, true, false)]
    #[case("0/1", true, true, false, false)]
    #[case("1/1", true, false, false, true)]
    #[case("1/2", true, true, false, false)]
    #[case("./1", true, false, false, false)]
    #[case("./.", false, false, false, false)]
    fn test_predicates(
        #[case] call: &str,
        #[case] called: bool,
        #[case] het: bool,
        #[case] hom_ref: bool,
        #[case] hom_alt: bool,
    ) {
        let call = gt(call);
        assert_eq!(call.is_called(), called);
        assert_eq!(call.is_heterozygous(), het);
        assert_eq!(call.is_homozygous_ref(), hom_ref);
        assert_eq!(call.is_homozygous_alt(), hom_alt);
    }

    #[rstest]
    fn test_ploidy() {
        assert!(gt("1").is_haploid());
        assert!(gt("0/1").is_diploid());
        assert_eq!(gt("0/1/1").ploidy(), 3);
        assert!(gt("./.").is_unknown());
    }

    #[rstest]
    #[case("0/1", vec![1, 1])]
    #[case("1/1", vec![1])]
    #[case("0/0/1/1", vec![1, 1])]
    #[case("0/1/1/1", vec![1, 3])]
    #[case("./1", vec![1, 1])]
    fn test_normalized_allele_count(#[case] call: &str, #[case] expected: Vec<usize>) {
        assert_eq!(gt(call).normalized_allele_count(), expected);
    }

    #[rstest]
    #[case("1/2", 3, vec!["0/1", "0/1", "0/0"])]
    #[case("1|2", 3, vec!["1|0", "0|1", "0|0"])]
    #[case("2/2", 2, vec!["0/0", "1/1"])]
    #[case("./1", 2, vec!["./1", "./0"])]
    #[case("0|1", 1, vec!["0|1"])]
    fn test_split_alts(#[case] call: &str, #[case] n_alts: usize, #[case] expected: Vec<&str>) {
        let split: Vec<String> = gt(call)
            .split_alts(n_alts)
            .iter()
            .map(|g| g.to_string())
            .collect();
        assert_eq!(split, expected);
    }

    #[rstest]
    #[case("1/2", 3)]
    #[case("1|2", 3)]
    #[case("2|0", 2)]
    #[case("2/2", 2)]
    #[case("./1", 2)]
    #[case("1", 2)]
    #[case("0/0", 2)]
    fn test_alt_projections_round_trip(#[case] call: &str, #[case] n_alts: usize) {
        let original = gt(call);
        let rebuilt = GenotypeCall::from_alt_projections(&original.split_alts(n_alts));
        assert_eq!(rebuilt, original);
    }

    #[rstest]
    #[case("0/0", "0/1", Some("0/1"))]
    #[case("1/1", "0/0", Some("1/1"))]
    #[case("1/1", "1/1", Some("1/1"))]
    #[case("0/1", "0/1", Some("1/1"))]
    #[case("1|0", "0|1", Some("1|1"))]
    #[case("1|0", "1|0", Some("1|0"))]
    #[case("1/1", "0/1", None)]
    #[case("0/1", "1/1", None)]
    fn test_merge(#[case] lhs: &str, #[case] rhs: &str, #[case] expected: Option<&str>) {
        let merged = gt(lhs).merge(&gt(rhs)).ok().map(|g| g.to_string());
        assert_eq!(merged.as_deref(), expected);
    }

    #[rstest]
    fn test_gl_index() {
        assert_eq!(gl_index(0, 0), 0);
        assert_eq!(gl_index(0, 1), 1);
        assert_eq!(gl_index(1, 1), 2);
        assert_eq!(gl_index(0, 2), 3);
        assert_eq!(gl_index(2, 1), 4);
        assert_eq!(gl_index(2, 2), 5);
    }

    #[rstest]
    #[case(1, 1, 2)]
    #[case(1, 3, 4)]
    #[case(2, 1, 3)]
    #[case(2, 2, 6)]
    #[case(3, 2, 10)]
    fn test_genotype_count(#[case] ploidy: usize, #[case] n_alts: usize, #[case] expected: usize) {
        assert_eq!(genotype_count(ploidy, n_alts), expected);
    }
}
