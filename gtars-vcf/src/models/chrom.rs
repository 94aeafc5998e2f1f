use std::cmp::Ordering;

/// Ordering of chromosome names used when sorting variants and intervals.
pub trait ChromosomeOrder {
    fn compare(&self, lhs: &str, rhs: &str) -> Ordering;
}

///
/// The project-wide chromosome table: autosomes 1..22, then X, Y and MT,
/// then every other name in lexicographic order. A leading `chr` is ignored
/// and `M` is treated as `MT`.
///
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultChromosomeOrder;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum ChromKey<'a> {
    Known(u8),
    Other(&'a str),
}

fn chrom_key(chrom: &str) -> ChromKey<'_> {
    let name = chrom.strip_prefix("chr").unwrap_or(chrom);
    match name {
        "X" => ChromKey::Known(23),
        "Y" => ChromKey::Known(24),
        "M" | "MT" => ChromKey::Known(25),
        _ => match name.parse::<u8>() {
            Ok(n) if (1..=22).contains(&n) && !name.starts_with('0') => ChromKey::Known(n),
            _ => ChromKey::Other(chrom),
        },
    }
}

///
/// Position of a chromosome in the default table, `None` for names sorted
/// lexicographically after the known ones.
///
pub fn chrom_index(chrom: &str) -> Option<usize> {
    match chrom_key(chrom) {
        ChromKey::Known(n) => Some(n as usize - 1),
        ChromKey::Other(_) => None,
    }
}

impl ChromosomeOrder for DefaultChromosomeOrder {
    fn compare(&self, lhs: &str, rhs: &str) -> Ordering {
        chrom_key(lhs)
            .cmp(&chrom_key(rhs))
            // "1" and "chr1" share a key; fall back to the raw name so the order stays total
            .then_with(|| lhs.cmp(rhs))
    }
}

impl<F> ChromosomeOrder for F
where
    F: Fn(&str, &str) -> Ordering,
{
    fn compare(&self, lhs: &str, rhs: &str) -> Ordering {
        self(lhs, rhs)
    }
}
