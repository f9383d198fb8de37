//! Identity claims asserted by an OAuth2/OIDC provider.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Email claim name.
pub const EMAIL: &str = "email";

/// OIDC claim stating whether the provider verified the email.
pub const EMAIL_VERIFIED: &str = "email_verified";

/// Display-name claim name.
pub const NAME: &str = "name";

/// An immutable set of claims.
///
/// Operations that add or merge claims return a new set; the provider's
/// original claims are never changed in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(BTreeMap<String, Value>);

impl ClaimSet {
    /// Builds a claim set from a JSON object. Returns `None` for any other
    /// JSON value.
    #[must_use]
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(map.into_iter().collect()),
            _ => None,
        }
    }

    /// Returns the raw value of a claim.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns a claim as a string.
    ///
    /// Numbers are rendered in decimal (GitHub's `id` is numeric). Blank
    /// strings, nulls and structured values count as absent.
    #[must_use]
    pub fn get_string(&self, name: &str) -> Option<String> {
        match self.0.get(name)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Returns the email claim, if present and non-blank.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        self.get_string(EMAIL)
    }

    /// Returns the `email_verified` claim. Some providers send it as the
    /// string `"true"` or `"false"`.
    #[must_use]
    pub fn email_verified(&self) -> Option<bool> {
        match self.0.get(EMAIL_VERIFIED)? {
            Value::Bool(verified) => Some(*verified),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Returns a copy of this set with one claim added or replaced.
    #[must_use]
    pub fn with_claim(&self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut claims = self.0.clone();
        claims.insert(name.into(), value.into());
        Self(claims)
    }

    /// Returns a copy of this set overlaid with `other`; `other` wins on
    /// conflicting names.
    #[must_use]
    pub fn merged_with(&self, other: &ClaimSet) -> Self {
        let mut claims = self.0.clone();
        claims.extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self(claims)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ClaimSet {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ClaimSet {
        ClaimSet::from_json(json!({
            "sub": "12345",
            "email": "u@example.com",
            "name": "Test User"
        }))
        .expect("object")
    }

    #[test]
    fn from_json_rejects_non_objects() {
        assert!(ClaimSet::from_json(json!(["a"])).is_none());
        assert!(ClaimSet::from_json(json!("a")).is_none());
    }

    #[test]
    fn email_accessor() {
        assert_eq!(sample().email().as_deref(), Some("u@example.com"));
    }

    #[test]
    fn email_verified_accepts_bool_and_string() {
        assert_eq!(sample().email_verified(), None);
        assert_eq!(
            sample().with_claim(EMAIL_VERIFIED, false).email_verified(),
            Some(false)
        );
        assert_eq!(
            sample().with_claim(EMAIL_VERIFIED, "true").email_verified(),
            Some(true)
        );
        assert_eq!(
            sample().with_claim(EMAIL_VERIFIED, 1).email_verified(),
            None
        );
    }

    #[test]
    fn blank_and_null_email_count_as_absent() {
        let blank = ClaimSet::from_json(json!({"email": "  "})).expect("object");
        let null = ClaimSet::from_json(json!({"email": null})).expect("object");
        assert!(blank.email().is_none());
        assert!(null.email().is_none());
    }

    #[test]
    fn numeric_claims_render_as_strings() {
        let claims = ClaimSet::from_json(json!({"id": 583231})).expect("object");
        assert_eq!(claims.get_string("id").as_deref(), Some("583231"));
    }

    #[test]
    fn with_claim_leaves_original_untouched() {
        let original = sample();
        let enriched = original.with_claim("custom_claim", "value");

        assert!(original.get("custom_claim").is_none());
        assert_eq!(enriched.get("custom_claim"), Some(&json!("value")));
        assert_eq!(enriched.len(), original.len() + 1);
    }

    #[test]
    fn merged_with_prefers_other() {
        let base = sample();
        let overlay = ClaimSet::from_json(json!({"name": "Other", "picture": "p.png"}))
            .expect("object");

        let merged = base.merged_with(&overlay);

        assert_eq!(merged.get_string("name").as_deref(), Some("Other"));
        assert_eq!(merged.get_string("picture").as_deref(), Some("p.png"));
        assert_eq!(merged.get_string("sub").as_deref(), Some("12345"));
        assert_eq!(base.get_string("name").as_deref(), Some("Test User"));
    }
}
