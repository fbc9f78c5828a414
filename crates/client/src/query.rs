//! Ordered query-string builder.

/// Query parameters in insertion order.
///
/// Optional parameters that are absent (or empty strings) are skipped, so
/// the encoded string only carries what the caller actually set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(&'static str, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a required parameter.
    pub fn push(mut self, key: &'static str, value: impl ToString) -> Self {
        self.0.push((key, value.to_string()));
        self
    }

    /// Append an optional parameter, skipping `None` and empty values.
    pub fn push_opt<V: ToString>(self, key: &'static str, value: Option<V>) -> Self {
        match value.map(|v| v.to_string()) {
            Some(v) if !v.is_empty() => self.push(key, v),
            _ => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.0
    }

    /// `application/x-www-form-urlencoded` encoding, in insertion order.
    pub fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter().map(|(k, v)| (*k, v.as_str())))
            .finish()
    }
}

/// Percent-encode one path segment so `/`, `?` and `#` stay inside it.
pub fn encode_segment(segment: &str) -> String {
    // Form encoding escapes a literal `+`, so any `+` left is a space.
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_in_insertion_order() {
        let params = QueryParams::new()
            .push_opt("signal_code", Some("C1.api_qps"))
            .push_opt("status", Some("OPEN"))
            .push("limit", 100);
        assert_eq!(params.encode(), "signal_code=C1.api_qps&status=OPEN&limit=100");
    }

    #[test]
    fn omits_absent_and_empty_optionals() {
        let params = QueryParams::new()
            .push_opt::<&str>("signal_code", None)
            .push_opt("status", Some(""))
            .push("limit", 500);
        assert_eq!(params.encode(), "limit=500");
    }

    #[test]
    fn segments_keep_reserved_characters_inside() {
        assert_eq!(encode_segment("C1"), "C1");
        assert_eq!(encode_segment("C1.api_qps"), "C1.api_qps");
        assert_eq!(encode_segment("C1/../admin?x#y"), "C1%2F..%2Fadmin%3Fx%23y");
        assert_eq!(encode_segment("a b+c"), "a%20b%2Bc");
    }

    #[test]
    fn escapes_reserved_characters() {
        let params = QueryParams::new().push("signals", "C1.a,C1.b").push("note", "a b&c");
        assert_eq!(params.encode(), "signals=C1.a%2CC1.b&note=a+b%26c");
    }
}
