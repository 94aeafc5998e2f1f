#[cfg(feature = "vcf")]
#[doc(inline)]
pub use gtars_vcf as vcf;
