use regex::Regex;

use super::CacheError;

/// Wildcard key matcher: `*` matches any run of characters (including none),
/// `?` exactly one, everything else is literal.
#[derive(Debug, Clone)]
pub struct CachePattern {
    source: String,
    regex: Regex,
}

impl CachePattern {
    pub fn new(pattern: &str) -> Result<Self, CacheError> {
        let mut expr = String::with_capacity(pattern.len() + 8);
        expr.push('^');
        for c in pattern.chars() {
            match c {
                '*' => expr.push_str(".*"),
                '?' => expr.push('.'),
                other => {
                    let mut buf = [0u8; 4];
                    expr.push_str(&regex::escape(other.encode_utf8(&mut buf)));
                }
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|e| CacheError::Pattern(e.to_string()))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn is_pattern(key: &str) -> bool {
        key.contains(['*', '?'])
    }

    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Glob understood by Redis `SCAN MATCH`, with its extra metacharacters escaped.
    pub fn to_redis_glob(&self, prefix: &str) -> String {
        let mut glob = String::with_capacity(prefix.len() + self.source.len());
        for c in prefix.chars() {
            push_literal(&mut glob, c);
        }
        for c in self.source.chars() {
            match c {
                '*' | '?' => glob.push(c),
                other => push_literal(&mut glob, other),
            }
        }
        glob
    }
}

fn push_literal(glob: &mut String, c: char) {
    if matches!(c, '[' | ']' | '\\' | '*' | '?' | '^') {
        glob.push('\\');
    }
    glob.push(c);
}
