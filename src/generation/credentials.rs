use std::env;
use std::fmt;

pub const MULTI_KEY_VAR: &str = "STABILITY_API_KEYS";
pub const SINGLE_KEY_VAR: &str = "STABILITY_API_KEY";

/// Separators tried in order; the first one present in the value wins.
const SEPARATORS: [char; 3] = [',', ';', ' '];

/// An opaque bearer secret. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First four characters followed by an ellipsis, for log lines.
    pub fn masked(&self) -> String {
        let prefix: String = self.0.chars().take(4).collect();
        format!("{}…", prefix)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", self.masked())
    }
}

/// Ordered list of credentials. Order is failover priority.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialPool {
    credentials: Vec<Credential>,
}

impl CredentialPool {
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self { credentials }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Multi-key variable first, then the single-key variable, else empty.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(multi) = lookup(MULTI_KEY_VAR) {
            let multi = multi.trim();
            if !multi.is_empty() {
                return Self::parse(multi);
            }
        }

        match lookup(SINGLE_KEY_VAR) {
            Some(single) if !single.trim().is_empty() => {
                Self::new(vec![Credential::new(single.trim())])
            }
            _ => Self::default(),
        }
    }

    /// Splits a separator-delimited list of keys.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::default();
        }

        if let Some(sep) = SEPARATORS.iter().copied().find(|sep| raw.contains(*sep)) {
            let parts: Vec<Credential> = raw
                .split(sep)
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(Credential::new)
                .collect();
            if !parts.is_empty() {
                return Self::new(parts);
            }
        }

        Self::new(vec![Credential::new(raw)])
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Credential> {
        self.credentials.iter()
    }
}

impl<'a> IntoIterator for &'a CredentialPool {
    type Item = &'a Credential;
    type IntoIter = std::slice::Iter<'a, Credential>;

    fn into_iter(self) -> Self::IntoIter {
        self.credentials.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn secrets(pool: &CredentialPool) -> Vec<&str> {
        pool.iter().map(Credential::expose).collect()
    }

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_parse_comma_separated() {
        let pool = CredentialPool::parse("a,b,c");
        assert_eq!(secrets(&pool), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_semicolon_with_whitespace() {
        let pool = CredentialPool::parse("a; b ;c");
        assert_eq!(secrets(&pool), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_space_separated() {
        let pool = CredentialPool::parse("a  b c");
        assert_eq!(secrets(&pool), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_first_present_separator_wins() {
        // Comma is present, so the space stays inside the fragments.
        let pool = CredentialPool::parse("a b,c");
        assert_eq!(secrets(&pool), vec!["a b", "c"]);
    }

    #[test]
    fn test_parse_single_value() {
        let pool = CredentialPool::parse("onlyone");
        assert_eq!(secrets(&pool), vec!["onlyone"]);
    }

    #[test]
    fn test_parse_drops_empty_fragments() {
        let pool = CredentialPool::parse(",a,,b,");
        assert_eq!(secrets(&pool), vec!["a", "b"]);
    }

    #[test]
    fn test_parse_only_separators_keeps_whole_string() {
        let pool = CredentialPool::parse(",,,");
        assert_eq!(secrets(&pool), vec![",,,"]);
    }

    #[test]
    fn test_lookup_prefers_multi_variable() {
        let pool = CredentialPool::from_lookup(lookup_from(&[
            (MULTI_KEY_VAR, "k1,k2"),
            (SINGLE_KEY_VAR, "single"),
        ]));
        assert_eq!(secrets(&pool), vec!["k1", "k2"]);
    }

    #[test]
    fn test_lookup_falls_back_to_single_variable() {
        let pool = CredentialPool::from_lookup(lookup_from(&[(SINGLE_KEY_VAR, "x")]));
        assert_eq!(secrets(&pool), vec!["x"]);
    }

    #[test]
    fn test_lookup_blank_multi_uses_single() {
        let pool = CredentialPool::from_lookup(lookup_from(&[
            (MULTI_KEY_VAR, "   "),
            (SINGLE_KEY_VAR, "x"),
        ]));
        assert_eq!(secrets(&pool), vec!["x"]);
    }

    #[test]
    fn test_lookup_nothing_set() {
        let pool = CredentialPool::from_lookup(lookup_from(&[]));
        assert!(pool.is_empty());
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn test_debug_output_is_masked() {
        let credential = Credential::new("sk-very-secret-value");
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("sk-v"));
    }
}
