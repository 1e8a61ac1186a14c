use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::{FetchError, Result};

/// Request or response headers.
///
/// A thin wrapper over [`HeaderMap`]: names are case-insensitive and a name
/// may carry several values (`Set-Cookie`, `Vary`, ...). String-based setters
/// validate names and values up front.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers(HeaderMap);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `(name, value)` pairs into a map; later pairs replace earlier
    /// ones with the same name.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut headers = Self::new();
        for (name, value) in pairs {
            headers.set(name.as_ref(), value.as_ref())?;
        }
        Ok(headers)
    }

    /// Sets `name` to a single `value`, dropping every value stored before.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        let (name, value) = parse_header(name, value)?;
        self.0.insert(name, value);
        Ok(())
    }

    /// Adds `value` under `name`, keeping existing values.
    pub fn append(&mut self, name: &str, value: &str) -> Result<()> {
        let (name, value) = parse_header(name, value)?;
        self.0.append(name, value);
        Ok(())
    }

    /// Typed variant of [`Headers::set`].
    pub fn insert(&mut self, name: HeaderName, value: HeaderValue) -> Option<HeaderValue> {
        self.0.insert(name, value)
    }

    /// First value stored under `name`, if it is visible ASCII.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|value| value.to_str().ok())
    }

    /// Every value stored under `name`, in insertion order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.0
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<HeaderValue> {
        self.0.remove(name)
    }

    /// Overlays `other` onto `self`: every name present in `other` replaces
    /// all of its values in `self`.
    pub fn extend(&mut self, other: &Headers) {
        for name in other.0.keys() {
            self.0.remove(name);
            for value in other.0.get_all(name) {
                self.0.append(name.clone(), value.clone());
            }
        }
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.0.keys_len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &HeaderMap {
        &self.0
    }

    pub fn into_map(self) -> HeaderMap {
        self.0
    }
}

impl From<HeaderMap> for Headers {
    fn from(map: HeaderMap) -> Self {
        Self(map)
    }
}

impl From<Headers> for HeaderMap {
    fn from(headers: Headers) -> Self {
        headers.0
    }
}

pub(crate) fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let name = name.trim();
    let parsed_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|err| FetchError::Unknown(format!("invalid header name '{name}': {err}")))?;
    let parsed_value = HeaderValue::from_str(value)
        .map_err(|err| FetchError::Unknown(format!("invalid value for header '{name}': {err}")))?;
    Ok((parsed_name, parsed_value))
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderMap, HeaderValue, SET_COOKIE};

    use crate::{ErrorKind, Headers};

    fn pairs(items: &[(&str, &str)]) -> Headers {
        Headers::from_pairs(items.iter().copied()).expect("must be valid headers")
    }

    #[test]
    fn lookup_ignores_case() {
        let headers = pairs(&[("Content-Type", "text/plain")]);
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert!(headers.contains("CONTENT-TYPE"));
    }

    #[test]
    fn set_replaces_differently_cased_name() {
        let mut headers = pairs(&[("X-Trace", "a")]);
        headers.append("x-trace", "b").expect("must append");
        headers.set("x-trace", "c").expect("must set");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get_all("X-TRACE"), vec!["c"]);
    }

    #[test]
    fn repeated_values_are_kept() {
        let mut map = HeaderMap::new();
        map.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        map.append(SET_COOKIE, HeaderValue::from_static("b=2"));

        let headers = Headers::from(map);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get_all("set-cookie"), vec!["a=1", "b=2"]);
        assert_eq!(headers.get("Set-Cookie"), Some("a=1"));
    }

    #[test]
    fn extend_replaces_whole_name_from_right_side() {
        let mut base = pairs(&[("accept", "text/plain"), ("x-a", "1")]);
        base.append("accept", "text/html").expect("must append");

        let mut overlay = Headers::new();
        overlay.append("Accept", "application/json").expect("must append");
        overlay.append("Accept", "application/cbor").expect("must append");
        base.extend(&overlay);

        assert_eq!(
            base.get_all("accept"),
            vec!["application/json", "application/cbor"]
        );
        assert_eq!(base.get("x-a"), Some("1"));
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn invalid_names_and_values_are_rejected() {
        let mut headers = Headers::new();
        let err = headers.set("bad name", "v").expect_err("space in name must fail");
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert!(headers.set("x-bad", "line\nbreak").is_err());
        assert!(Headers::from_pairs([("x-ok", "1"), ("", "2")]).is_err());
        assert!(headers.is_empty());
    }
}
