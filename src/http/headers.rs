use serde::Deserialize;

/// How a header name is matched against the stored raw lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderMatch {
    /// Split each line at its first `:` and compare the trimmed name exactly.
    #[default]
    Exact,
    /// Match any line whose raw text begins with the name. The value is the
    /// text after the first space. `Content-Length-Extra: 1` matches a
    /// lookup for `Content-Length` under this policy.
    Prefix,
}

/// Ordered raw header lines of one request with lookup by name.
///
/// Lines are kept exactly as received (minus the CRLF). Lookups are
/// case-sensitive and return the first match only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderIndex {
    lines: Vec<String>,
    policy: HeaderMatch,
}

impl HeaderIndex {
    /// Builds an index from raw header lines. Empty lines are dropped.
    pub fn new<I, S>(lines: I, policy: HeaderMatch) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines = lines
            .into_iter()
            .map(Into::into)
            .filter(|l: &String| !l.is_empty())
            .collect();

        Self { lines, policy }
    }

    /// Parses a header block (the bytes between the request line and the
    /// blank line) into an index.
    pub fn from_block(block: &str, policy: HeaderMatch) -> Self {
        Self::new(block.split("\r\n"), policy)
    }

    /// Returns the trimmed value of the first header matching `name`.
    ///
    /// # Example
    ///
    /// ```
    /// # use rawhttp::http::headers::{HeaderIndex, HeaderMatch};
    /// let idx = HeaderIndex::from_block("Host: a\r\nContent-Length: 5", HeaderMatch::Exact);
    /// assert_eq!(idx.lookup("Content-Length"), Some("5"));
    /// assert_eq!(idx.lookup("content-length"), None);
    /// ```
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match self.policy {
            HeaderMatch::Exact => {
                let (key, value) = line.split_once(':')?;
                (key.trim() == name).then(|| value.trim())
            }
            HeaderMatch::Prefix => {
                if !line.starts_with(name) {
                    return None;
                }
                let rest = &line[name.len()..];
                Some(rest.split_once(' ').map_or("", |(_, v)| v.trim()))
            }
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Raw header lines in the order they were received.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn policy(&self) -> HeaderMatch {
        self.policy
    }
}
