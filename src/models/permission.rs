//! Permission set domain model

use std::collections::BTreeMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::AccessError;

/// An immutable mapping from permission key to granted flag.
///
/// Keys are opaque, usually namespaced identifiers such as
/// `"platform.index"`. A key that is absent is not granted; there is no
/// implicit grant. New sets are produced by [`PermissionSet::merge`], a
/// shared instance is never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
    entries: BTreeMap<String, bool>,
}

impl PermissionSet {
    /// Create an empty permission set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style grant: returns a new set with the key added.
    ///
    /// Rejects empty keys and keys containing whitespace or control
    /// characters.
    pub fn grant(mut self, key: impl Into<String>, granted: bool) -> Result<Self, AccessError> {
        let key = key.into();
        validate_key(&key)?;
        self.entries.insert(key, granted);
        Ok(self)
    }

    /// Build a set from key/flag pairs, validating every key
    pub fn try_from_iter<I>(pairs: I) -> Result<Self, AccessError>
    where
        I: IntoIterator<Item = (String, bool)>,
    {
        let mut entries = BTreeMap::new();
        for (key, granted) in pairs {
            validate_key(&key)?;
            entries.insert(key, granted);
        }
        Ok(Self { entries })
    }

    /// True iff the key is present and mapped to `true`
    pub fn has(&self, key: &str) -> bool {
        self.entries.get(key).copied().unwrap_or(false)
    }

    /// Union of both sets; a key shared by both is granted if either
    /// input grants it. Commutative and associative.
    pub fn merge(&self, other: &Self) -> Self {
        let mut entries = self.entries.clone();
        for (key, granted) in &other.entries {
            entries
                .entry(key.clone())
                .and_modify(|existing| *existing = *existing || *granted)
                .or_insert(*granted);
        }
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over (key, granted) pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Encode every key for transport in contexts where raw keys are
    /// unsafe (e.g. HTML form field names). Inverted by [`decode_key`].
    pub fn to_encoded(&self) -> BTreeMap<String, bool> {
        self.entries
            .iter()
            .map(|(key, granted)| (encode_key(key), *granted))
            .collect()
    }
}

/// URL 安全的 base64 编码（无填充）
pub fn encode_key(key: &str) -> String {
    URL_SAFE_NO_PAD.encode(key.as_bytes())
}

/// 解码权限键，必须精确还原编码前的键
pub fn decode_key(encoded: &str) -> Result<String, AccessError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded.as_bytes())
        .map_err(|e| AccessError::InvalidPermissionKey(format!("{encoded}: {e}")))?;

    String::from_utf8(bytes)
        .map_err(|e| AccessError::InvalidPermissionKey(format!("{encoded}: {e}")))
}

/// 校验权限键：拒绝空键、空白字符和控制字符
fn validate_key(key: &str) -> Result<(), AccessError> {
    if key.is_empty() {
        return Err(AccessError::InvalidPermissionKey("empty key".to_string()));
    }

    if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(AccessError::InvalidPermissionKey(key.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_key_is_not_granted() {
        let set = PermissionSet::new();
        assert!(!set.has("platform.index"));
    }

    #[test]
    fn test_false_entry_is_not_granted() {
        let set = PermissionSet::new().grant("platform.index", false).unwrap();
        assert!(!set.has("platform.index"));
    }

    #[test]
    fn test_granted_key() {
        let set = PermissionSet::new().grant("platform.index", true).unwrap();
        assert!(set.has("platform.index"));
    }

    #[test]
    fn test_merge_is_or_combined() {
        let a = PermissionSet::new()
            .grant("platform.index", false)
            .unwrap()
            .grant("platform.systems", true)
            .unwrap();
        let b = PermissionSet::new()
            .grant("platform.index", true)
            .unwrap()
            .grant("platform.users", false)
            .unwrap();

        let merged = a.merge(&b);
        assert!(merged.has("platform.index"));
        assert!(merged.has("platform.systems"));
        assert!(!merged.has("platform.users"));
        assert_eq!(merged.len(), 3);

        // merge 不修改输入
        assert!(!a.has("platform.index"));
    }

    #[test]
    fn test_merge_never_revokes() {
        let granted = PermissionSet::new().grant("edit", true).unwrap();
        let denied = PermissionSet::new().grant("edit", false).unwrap();

        assert!(granted.merge(&denied).has("edit"));
        assert!(denied.merge(&granted).has("edit"));
    }

    #[test]
    fn test_rejects_empty_key() {
        let result = PermissionSet::new().grant("", true);
        assert!(matches!(result, Err(AccessError::InvalidPermissionKey(_))));
    }

    #[test]
    fn test_rejects_whitespace_key() {
        let result = PermissionSet::new().grant("platform index", true);
        assert!(matches!(result, Err(AccessError::InvalidPermissionKey(_))));

        let result = PermissionSet::new().grant("platform\tindex", true);
        assert!(matches!(result, Err(AccessError::InvalidPermissionKey(_))));
    }

    #[test]
    fn test_rejects_control_character_key() {
        let result = PermissionSet::try_from_iter([("bad\u{1}key".to_string(), true)]);
        assert!(matches!(result, Err(AccessError::InvalidPermissionKey(_))));
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let keys = ["platform.index", "platform.systems.roles", "日志.查看", "a"];
        for key in keys {
            let encoded = encode_key(key);
            assert_eq!(decode_key(&encoded).unwrap(), key);
        }
    }

    #[test]
    fn test_encoded_keys_are_field_safe() {
        let set = PermissionSet::new().grant("platform.index", true).unwrap();
        for key in set.to_encoded().keys() {
            assert!(key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_key("not base64!!").is_err());
    }

    #[test]
    fn test_serde_round_trip_as_plain_object() {
        let set = PermissionSet::new()
            .grant("platform.index", true)
            .unwrap()
            .grant("platform.users", false)
            .unwrap();

        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"platform.index":true,"platform.users":false}"#);

        let back: PermissionSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
