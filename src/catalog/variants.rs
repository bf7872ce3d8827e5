//! Parser for the variants array embedded in product page script blocks.
//!
//! Product pages carry a script with a JavaScript-ish object literal whose
//! `'variants'` member lists the purchasable size options. It is not JSON:
//! keys and values may be single-quoted and the block spans several lines.
//! A regex locates the array literal; a small recursive-descent parser for
//! the array-of-objects grammar does the rest, failing explicitly on
//! malformed input.

use crate::catalog::models::VariantDescriptor;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static VARIANTS_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"]variants['"]\s*:\s*(\[[\s\S]*?\])"#).unwrap());

/// Failure parsing the embedded variants block.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VariantsError {
    #[error("no variants array found in script block")]
    BlockNotFound,
    #[error("malformed variants array at byte {offset}: {reason}")]
    Malformed { offset: usize, reason: &'static str },
    #[error("variant object is missing the `{0}` member")]
    MissingMember(&'static str),
}

/// Extracts and parses the variants array from raw script text.
pub fn parse_variants(script: &str) -> Result<Vec<VariantDescriptor>, VariantsError> {
    let caps = VARIANTS_BLOCK.captures(script).ok_or(VariantsError::BlockNotFound)?;
    parse_array(caps.get(1).map(|m| m.as_str()).unwrap_or_default())
}

/// Parses the array literal itself:
/// `[ { 'variantCode' : '…', 'sizeName' : '…' }, … ]`.
///
/// Unknown object members are skipped; both `variantCode` and `sizeName`
/// must be present in every object. Order and duplicates are preserved.
pub fn parse_array(input: &str) -> Result<Vec<VariantDescriptor>, VariantsError> {
    let mut cur = Cursor::new(input);
    let mut out = Vec::new();

    cur.skip_ws();
    cur.expect('[')?;
    cur.skip_ws();

    if cur.eat(']') {
        return Ok(out);
    }

    loop {
        out.push(parse_object(&mut cur)?);
        cur.skip_ws();

        if cur.eat(',') {
            cur.skip_ws();
            continue;
        }
        cur.expect(']')?;
        break;
    }

    Ok(out)
}

fn parse_object(cur: &mut Cursor) -> Result<VariantDescriptor, VariantsError> {
    cur.expect('{')?;

    let mut code = None;
    let mut size = None;

    loop {
        cur.skip_ws();
        if cur.eat('}') {
            break;
        }

        let key = cur.parse_string()?;
        cur.skip_ws();
        cur.expect(':')?;
        cur.skip_ws();

        let value = match cur.peek() {
            Some('\'') | Some('"') => cur.parse_string()?,
            _ => cur.parse_bare_scalar()?,
        };

        match key.as_str() {
            "variantCode" => code = Some(value),
            "sizeName" => size = Some(value),
            _ => {}
        }

        cur.skip_ws();
        if cur.eat(',') {
            continue;
        }
        cur.expect('}')?;
        break;
    }

    Ok(VariantDescriptor {
        code: code.ok_or(VariantsError::MissingMember("variantCode"))?,
        size: size.ok_or(VariantsError::MissingMember("sizeName"))?,
    })
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Consumes `c` if it is next; returns whether it did.
    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), VariantsError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.malformed(match c {
                '[' => "expected `[`",
                ']' => "expected `]` or `,`",
                '{' => "expected `{`",
                '}' => "expected `}` or `,`",
                ':' => "expected `:`",
                _ => "unexpected character",
            }))
        }
    }

    /// Parses a single- or double-quoted string.
    fn parse_string(&mut self) -> Result<String, VariantsError> {
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.malformed("expected a quoted string")),
        };
        self.bump();

        let mut out = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    Some(escaped) => out.push(escaped),
                    None => return Err(self.malformed("unterminated string")),
                },
                Some(c) => out.push(c),
                None => return Err(self.malformed("unterminated string")),
            }
        }
    }

    /// Parses an unquoted scalar (number, true/false); consumed only to be
    /// skipped for unknown members.
    fn parse_bare_scalar(&mut self) -> Result<String, VariantsError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-'))
        {
            self.bump();
        }
        if self.pos == start {
            return Err(self.malformed("expected a value"));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn malformed(&self, reason: &'static str) -> VariantsError {
        VariantsError::Malformed { offset: self.pos, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"
        var productArticleDetails = {
            'articleNumber' : '0711618001001',
            'variants' : [
                { 'variantCode' : '0711618001002', 'sizeName' : 'S' },
                { 'variantCode' : '0711618001003', 'sizeName' : 'M' },
                { 'variantCode' : '0711618001004', 'sizeName' : 'L' }
            ],
            'somethingElse' : true
        };
    "#;

    #[test]
    fn test_parse_variants_from_script() {
        let variants = parse_variants(SCRIPT).unwrap();
        assert_eq!(variants.len(), 3);
        assert_eq!(variants[0].code, "0711618001002");
        assert_eq!(variants[0].size, "S");
        assert_eq!(variants[2].size, "L");
    }

    #[test]
    fn test_parse_variants_double_quotes() {
        let script = r#"'variants' : [{ "variantCode" : "A1", "sizeName" : "XS" }]"#;
        let variants = parse_variants(script).unwrap();
        assert_eq!(variants, vec![VariantDescriptor { code: "A1".into(), size: "XS".into() }]);
    }

    #[test]
    fn test_parse_variants_member_order_irrelevant() {
        let script = r#"'variants' : [{ 'sizeName' : 'M', 'variantCode' : 'B2' }]"#;
        let variants = parse_variants(script).unwrap();
        assert_eq!(variants[0].code, "B2");
        assert_eq!(variants[0].size, "M");
    }

    #[test]
    fn test_parse_variants_unknown_members_skipped() {
        let script = r#"'variants' : [
            { 'variantCode' : 'C3', 'quantity' : 12, 'sizeName' : 'L', 'available' : true }
        ]"#;
        let variants = parse_variants(script).unwrap();
        assert_eq!(variants[0].code, "C3");
        assert_eq!(variants[0].size, "L");
    }

    #[test]
    fn test_parse_variants_preserves_order_and_duplicates() {
        let script = r#"'variants' : [
            { 'variantCode' : 'D4', 'sizeName' : 'S' },
            { 'variantCode' : 'D4', 'sizeName' : 'S' }
        ]"#;
        let variants = parse_variants(script).unwrap();
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0], variants[1]);
    }

    #[test]
    fn test_parse_variants_empty_array() {
        let variants = parse_variants("'variants' : []").unwrap();
        assert!(variants.is_empty());
    }

    #[test]
    fn test_parse_variants_block_not_found() {
        let err = parse_variants("var x = { 'sizes' : [] };").unwrap_err();
        assert_eq!(err, VariantsError::BlockNotFound);
    }

    #[test]
    fn test_parse_variants_missing_member() {
        let script = r#"'variants' : [{ 'variantCode' : 'E5' }]"#;
        let err = parse_variants(script).unwrap_err();
        assert_eq!(err, VariantsError::MissingMember("sizeName"));
    }

    #[test]
    fn test_parse_array_malformed_missing_colon() {
        let err = parse_array("[{ 'variantCode' 'F6' }]").unwrap_err();
        assert!(matches!(err, VariantsError::Malformed { .. }));
    }

    #[test]
    fn test_parse_array_malformed_unterminated_string() {
        let err = parse_array("[{ 'variantCode' : 'G7 }]").unwrap_err();
        assert!(matches!(err, VariantsError::Malformed { .. }));
    }

    #[test]
    fn test_parse_array_malformed_not_an_array() {
        let err = parse_array("{ 'variantCode' : 'H8' }").unwrap_err();
        assert!(matches!(err, VariantsError::Malformed { .. }));
    }

    #[test]
    fn test_parse_string_escapes() {
        let script = r#"'variants' : [{ 'variantCode' : 'I\'9', 'sizeName' : 'One\\Size' }]"#;
        let variants = parse_variants(script).unwrap();
        assert_eq!(variants[0].code, "I'9");
        assert_eq!(variants[0].size, "One\\Size");
    }
}
