#[cfg(feature = "vcf")]
mod vcf {
    use gtars::vcf::{Variant, VariantType, trimmed_vcf_ref_alt};

    #[test]
    fn test_vcf_is_reexported() {
        let variant = Variant::new("1", 100, "CAA", "CA").unwrap();
        assert_eq!(variant.variant_type(), VariantType::DEL);
        let (offset, r, a) = trimmed_vcf_ref_alt(variant.ref_allele(), variant.alt()).unwrap();
        assert_eq!((offset, r.as_str(), a.as_str()), (0, "CA", "C"));
    }
}
