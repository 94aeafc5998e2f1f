//! Text encodings used inside `##KEY=<...>` header lines.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{Result, VcfError};

/// One `key=value` pair at the start of the remaining input, followed by
/// a comma or the end. Values are either a quoted string with `\\`/`\"`
/// escapes, or a bare token that has no comma and does not open a quote.
static KEY_VALUE_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?P<key>[^=,"]+)=(?P<value>"(?:[^"\\]|\\.)*"|[^",][^,]*|)(?:,|$)"#)
        .expect("key/value pair regex is valid")
});

///
/// Encode a string the way VCF headers expect: wrapped in double quotes
/// with backslashes and double quotes escaped.
///
pub fn encode_vcf_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

///
/// Inverse of [`encode_vcf_string`]. The token must start and end with a
/// double quote; any backslash must escape `\` or `"`.
///
pub fn decode_vcf_string(token: &str) -> Result<String> {
    let invalid = || VcfError::InvalidEncodedString(token.to_string());
    let inner = token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .filter(|_| token.len() >= 2)
        .ok_or_else(invalid)?;

    let mut decoded = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped @ ('\\' | '"')) => decoded.push(escaped),
                _ => return Err(invalid()),
            },
            '"' => return Err(invalid()),
            _ => decoded.push(c),
        }
    }
    Ok(decoded)
}

///
/// Parse the inside of a `<...>` header value into ordered raw pairs.
/// Quoted values are returned still encoded.
///
pub fn parse_key_value_list(input: &str) -> Result<IndexMap<String, String>> {
    let mut pairs = IndexMap::new();
    let mut rest = input;
    while !rest.is_empty() {
        let caps = KEY_VALUE_PAIR
            .captures(rest)
            .ok_or_else(|| VcfError::InvalidKeyValueList(input.to_string()))?;
        pairs.insert(caps["key"].to_string(), caps["value"].to_string());
        rest = &rest[caps[0].len()..];
        if caps[0].ends_with(',') && rest.is_empty() {
            return Err(VcfError::InvalidKeyValueList(input.to_string()));
        }
    }
    Ok(pairs)
}

/// Strip the surrounding `<` and `>` of a structured header value.
pub fn strip_brackets(value: &str) -> Option<&str> {
    value.strip_prefix('<').and_then(|v| v.strip_suffix('>'))
}

///
/// Render `key=value` pairs as a `<...>` header value. Values are written
/// verbatim, callers encode strings beforehand.
///
pub fn format_key_value_list<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    let body: Vec<String> = pairs
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();
    format!("<{}>", body.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("plain", "\"plain\"")]
    #[case("say \"hi\"", "\"say \\\"hi\\\"\"")]
    #[case("back\\slash", "\"back\\\\slash\"")]
    #[case("", "\"\"")]
    fn test_encode_decode(#[case] raw: &str, #[case] encoded: &str) {
        assert_eq!(encode_vcf_string(raw), encoded);
        assert_eq!(decode_vcf_string(encoded).unwrap(), raw);
    }

    #[rstest]
    #[case("no quotes")]
    #[case("\"unterminated")]
    #[case("\"")]
    #[case("\"stray \\ backslash\"")]
    #[case("\"inner \" quote\"")]
    fn test_decode_rejects(#[case] token: &str) {
        assert!(decode_vcf_string(token).is_err());
    }

    #[rstest]
    fn test_parse_key_value_list() {
        let pairs = parse_key_value_list(
            r#"ID=AF,Number=A,Type=Float,Description="Allele, \"frequency\"""#,
        )
        .unwrap();
        assert_eq!(pairs.len(), 4);
        assert_eq!(pairs["ID"], "AF");
        assert_eq!(pairs["Number"], "A");
        assert_eq!(pairs["Description"], r#""Allele, \"frequency\"""#);
        let keys: Vec<&str> = pairs.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["ID", "Number", "Type", "Description"]);
    }

    #[rstest]
    #[case("ID=AF,Number")]
    #[case("ID=AF,")]
    #[case("ID=\"open")]
    #[case("=x")]
    fn test_parse_key_value_list_rejects(#[case] input: &str) {
        assert!(parse_key_value_list(input).is_err());
    }

    #[rstest]
    fn test_format_key_value_list() {
        let rendered = format_key_value_list(vec![
            ("ID", "q10".to_string()),
            ("Description", encode_vcf_string("Quality below 10")),
        ]);
        assert_eq!(rendered, r#"<ID=q10,Description="Quality below 10">"#);
        assert_eq!(strip_brackets(&rendered), Some(r#"ID=q10,Description="Quality below 10""#));
    }
}
