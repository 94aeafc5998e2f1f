pub mod chrom;
pub mod genotype;
pub mod interval;
pub mod variant;

// re-export for cleaner imports
pub use self::chrom::{ChromosomeOrder, DefaultChromosomeOrder, chrom_index};
pub use self::genotype::{GenotypeCall, genotype_count, gl_index};
pub use self::interval::{ChromInterval, Interval, interval_coverage, merge_intervals};
pub use self::variant::{Variant, VariantType, sort_variants_by};
