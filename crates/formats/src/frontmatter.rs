//! Frontmatter extraction.
//!
//! A document may open with a `---` delimited block. The block is parsed by
//! an injected structured parser (YAML by default); when that parser rejects
//! the block, a line-oriented parser recovers plain `key: value` pairs and
//! never fails.

use {
    serde_json::{Map, Value},
    tracing::debug,
};

/// Parsed frontmatter keys.
pub type Frontmatter = Map<String, Value>;

/// Structured block parser, injected into [`FrontmatterExtractor`].
pub type StructuredParser = fn(&str) -> Result<Frontmatter, String>;

const DELIMITER: &str = "---";

/// Output of [`FrontmatterExtractor::extract`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    pub frontmatter: Frontmatter,
    pub body: String,
}

/// Splits a document into frontmatter and body.
#[derive(Debug, Clone, Copy)]
pub struct FrontmatterExtractor {
    structured: StructuredParser,
}

impl Default for FrontmatterExtractor {
    fn default() -> Self {
        Self::new(parse_yaml)
    }
}

impl FrontmatterExtractor {
    #[must_use]
    pub fn new(structured: StructuredParser) -> Self {
        Self { structured }
    }

    /// Extract frontmatter and body.
    ///
    /// Without a complete delimited block the body is the input unchanged.
    #[must_use]
    pub fn extract(&self, raw: &str) -> Extracted {
        let Some((block, body)) = split_block(raw) else {
            return Extracted {
                frontmatter: Frontmatter::new(),
                body: raw.to_string(),
            };
        };

        let frontmatter = match (self.structured)(block) {
            Ok(frontmatter) => frontmatter,
            Err(error) => {
                debug!(%error, "structured frontmatter rejected, using line parser");
                parse_lines(block)
            },
        };

        Extracted {
            frontmatter,
            body: body.to_string(),
        }
    }
}

/// Extract with the default YAML parser.
#[must_use]
pub fn extract(raw: &str) -> Extracted {
    FrontmatterExtractor::default().extract(raw)
}

/// Locate the opening and closing delimiter lines.
///
/// Returns `(block, body)` where `block` excludes both delimiters and `body`
/// is everything after the closing delimiter line.
fn split_block(raw: &str) -> Option<(&str, &str)> {
    let mut lines = raw.split_inclusive('\n');
    let opening = lines.next()?;
    if opening.trim_end() != DELIMITER {
        return None;
    }

    let block_start = opening.len();
    let mut offset = block_start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            return Some((&raw[block_start..offset], &raw[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// Structured YAML parser. Only mappings (or an empty block) are accepted.
pub fn parse_yaml(block: &str) -> Result<Frontmatter, String> {
    let value: serde_yaml::Value = serde_yaml::from_str(block).map_err(|e| e.to_string())?;
    match value {
        serde_yaml::Value::Null => Ok(Frontmatter::new()),
        serde_yaml::Value::Mapping(_) => match serde_json::to_value(value) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err("frontmatter is not a mapping".to_string()),
            Err(e) => Err(e.to_string()),
        },
        _ => Err("frontmatter is not a mapping".to_string()),
    }
}

/// Line-oriented fallback: top-level `key: value` pairs only.
///
/// Lines without a colon, indented lines, list items and comments are ignored.
#[must_use]
pub fn parse_lines(block: &str) -> Frontmatter {
    let mut map = Frontmatter::new();
    for line in block.lines() {
        if line.trim().is_empty() || line.starts_with([' ', '\t', '#', '-']) {
            continue;
        }
        let Some(colon) = find_unquoted_colon(line) else {
            continue;
        };
        let key = unquote(line[..colon].trim());
        let value = line[colon + 1..].trim();
        if key.is_empty() || value.is_empty() {
            continue;
        }
        map.insert(key.to_string(), scalar_or_inline_list(value));
    }
    map
}

fn find_unquoted_colon(line: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in line.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {},
            (None, '"' | '\'') => quote = Some(c),
            (None, ':') => return Some(i),
            (None, _) => {},
        }
    }
    None
}

fn unquote(value: &str) -> &str {
    for q in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(q) && value.ends_with(q) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn scalar_or_inline_list(value: &str) -> Value {
    if let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        let items = inner
            .split(',')
            .map(|item| unquote(item.trim()))
            .filter(|item| !item.is_empty())
            .map(|item| Value::String(item.to_string()))
            .collect();
        return Value::Array(items);
    }
    Value::String(unquote(value).to_string())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, serde_json::json};

    #[test]
    fn splits_frontmatter_and_body() {
        let out = extract("---\nname: x\ndescription: y\n---\n\n# Title\n\nBody text");
        assert_eq!(out.frontmatter["name"], "x");
        assert_eq!(out.frontmatter["description"], "y");
        assert_eq!(out.body, "\n# Title\n\nBody text");
    }

    #[rstest]
    #[case("# Just markdown\n\nNo frontmatter.\n")]
    #[case("  \n---\nname: x\n---\nbody")]
    #[case("---\nname: never closed\n")]
    #[case("")]
    fn missing_block_returns_original_text(#[case] raw: &str) {
        let out = extract(raw);
        assert!(out.frontmatter.is_empty());
        assert_eq!(out.body, raw);
    }

    #[test]
    fn empty_block_isolates_body() {
        let out = extract("---\n---\nBody only");
        assert!(out.frontmatter.is_empty());
        assert_eq!(out.body, "Body only");

        let out = extract("---\n---");
        assert!(out.frontmatter.is_empty());
        assert_eq!(out.body, "");
    }

    #[test]
    fn handles_crlf_delimiters() {
        let out = extract("---\r\nname: x\r\n---\r\nbody");
        assert_eq!(out.frontmatter["name"], "x");
        assert_eq!(out.body, "body");
    }

    #[test]
    fn quoted_values_keep_colons() {
        let out = extract("---\ndescription: \"Use when: reviewing\"\n---\n");
        assert_eq!(out.frontmatter["description"], "Use when: reviewing");
    }

    #[test]
    fn nested_and_list_values_survive_structured_parse() {
        let out = extract("---\ntools:\n  - Read\n  - Grep\nhooks:\n  pre: lint\n---\nbody");
        assert_eq!(out.frontmatter["tools"], json!(["Read", "Grep"]));
        assert_eq!(out.frontmatter["hooks"]["pre"], "lint");
    }

    #[test]
    fn malformed_yaml_falls_back_to_line_parser() {
        let raw = "---\nname: helper\ndescription: Use when: the user asks\n  bad: indent\nno colon here\n---\nBody";
        let out = extract(raw);
        assert_eq!(out.frontmatter["name"], "helper");
        assert_eq!(out.frontmatter["description"], "Use when: the user asks");
        assert!(out.frontmatter.get("bad").is_none());
        assert_eq!(out.body, "Body");
    }

    #[test]
    fn scalar_block_falls_back_to_line_parser() {
        let out = extract("---\njust a string\n---\nBody");
        assert!(out.frontmatter.is_empty());
        assert_eq!(out.body, "Body");
    }

    #[test]
    fn line_parser_reads_inline_lists_and_quoted_keys() {
        let map = parse_lines("globs: [\"*.ts\", '*.tsx']\n\"odd key\": 'v: 1'\n- stray\n# comment");
        assert_eq!(map["globs"], json!(["*.ts", "*.tsx"]));
        assert_eq!(map["odd key"], "v: 1");
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn injected_parser_is_used() {
        fn always_fails(_: &str) -> Result<Frontmatter, String> {
            Err("nope".into())
        }
        let extractor = FrontmatterExtractor::new(always_fails);
        let out = extractor.extract("---\nname: fallback\n---\nx");
        assert_eq!(out.frontmatter["name"], "fallback");
    }
}
