use std::fmt::{Display, Formatter};

use derive_more::Deref;
use indexmap::IndexMap;
use log::trace;
use orion_error::{ErrorOwe, ErrorWith, ToStructError};
use serde_derive::{Deserialize, Serialize};

use super::{
    EnvStore,
    error::{EnvironReason, EnvironResult},
};

/// The value a variable is reset to when the diff is applied.
///
/// Encoded as a JSON string, or `null` when the variable was not set at
/// freeze time and must be removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum FrozenValue {
    Present(String),
    Absent,
}

impl FrozenValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FrozenValue::Present(v) => Some(v.as_str()),
            FrozenValue::Absent => None,
        }
    }
    pub fn is_absent(&self) -> bool {
        matches!(self, FrozenValue::Absent)
    }
}

impl From<Option<String>> for FrozenValue {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(v) => FrozenValue::Present(v),
            None => FrozenValue::Absent,
        }
    }
}

impl From<FrozenValue> for Option<String> {
    fn from(value: FrozenValue) -> Self {
        match value {
            FrozenValue::Present(v) => Some(v),
            FrozenValue::Absent => None,
        }
    }
}

impl From<&str> for FrozenValue {
    fn from(value: &str) -> Self {
        FrozenValue::Present(value.to_string())
    }
}

impl Display for FrozenValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FrozenValue::Present(v) => write!(f, "\"{v}\""),
            FrozenValue::Absent => write!(f, "<unset>"),
        }
    }
}

pub type DiffMap = IndexMap<String, FrozenValue>;

/// Variable name to the value it must be reset to, in freeze order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Deref)]
#[serde(transparent)]
pub struct EnvironDiff {
    entries: DiffMap,
}

impl EnvironDiff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value` for `name`, replacing any earlier entry.
    pub fn record<S: Into<String>>(
        &mut self,
        name: S,
        value: FrozenValue,
    ) -> Option<FrozenValue> {
        self.entries.insert(name.into(), value)
    }

    /// Records the current value of `name` in `store`.
    pub fn capture<E: EnvStore + ?Sized>(
        &mut self,
        store: &E,
        name: &str,
    ) -> EnvironResult<()> {
        let value = store.get_var(name)?;
        self.record(name, FrozenValue::from(value));
        Ok(())
    }

    /// Fails on the first entry the process environment would refuse.
    pub fn validate(&self) -> EnvironResult<()> {
        for (name, value) in self.entries.iter() {
            check_name(name)?;
            match value {
                FrozenValue::Present(v) if v.contains('\0') => {
                    return EnvironReason::InvalidEntry(format!("value of `{name}` contains NUL"))
                        .err_result();
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// An empty blob decodes to an empty diff.
    pub fn decode(blob: &str) -> EnvironResult<Self> {
        if blob.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str::<Self>(blob)
            .owe_data()
            .want("decode environ diff")
    }

    pub fn encode(&self) -> EnvironResult<String> {
        serde_json::to_string(self)
            .owe_data()
            .want("encode environ diff")
    }

    /// Writes every entry into `store`: present values are set, absent ones
    /// removed. All entries are validated first, so on error `store` is left
    /// as it was.
    pub fn apply_to<E: EnvStore + ?Sized>(&self, store: &mut E) -> EnvironResult<()> {
        self.validate()?;
        for (name, value) in self.entries.iter() {
            trace!("{name}={value}");
            match value {
                FrozenValue::Present(v) => store.set_var(name, v),
                FrozenValue::Absent => store.unset_var(name),
            }
        }
        Ok(())
    }
}

/// 变量名不能为空，不能含有 `=` 或 NUL
pub(crate) fn check_name(name: &str) -> EnvironResult<()> {
    let bad = if name.is_empty() {
        Some("name is empty".to_string())
    } else if name.contains('=') {
        Some(format!("name `{name}` contains '='"))
    } else if name.contains('\0') {
        Some(format!("name `{name}` contains NUL"))
    } else {
        None
    };
    match bad {
        Some(msg) => EnvironReason::InvalidEntry(msg).err_result(),
        None => Ok(()),
    }
}

impl<K: Into<String>> FromIterator<(K, FrozenValue)> for EnvironDiff {
    fn from_iter<T: IntoIterator<Item = (K, FrozenValue)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(r#"{"A":"1"}"#, "A", FrozenValue::from("1"))]
    #[case(r#"{"A":null}"#, "A", FrozenValue::Absent)]
    #[case(r#"{"A":""}"#, "A", FrozenValue::from(""))]
    fn test_decode_value(
        #[case] blob: &str,
        #[case] name: &str,
        #[case] expect: FrozenValue,
    ) {
        let diff = EnvironDiff::decode(blob).unwrap();
        assert_eq!(diff.get(name), Some(&expect));
    }

    #[test]
    fn test_decode_empty_blob() {
        let diff = EnvironDiff::decode("").unwrap();
        assert!(diff.is_empty());
    }

    #[rstest]
    #[case("not json")]
    #[case("[1, 2]")]
    #[case(r#"{"A": 1}"#)]
    #[case(r#"{"A": "1""#)]
    fn test_decode_malformed(#[case] blob: &str) {
        assert!(EnvironDiff::decode(blob).is_err());
    }

    #[test]
    fn test_encode_null_and_string() {
        let mut diff = EnvironDiff::new();
        diff.record("B", FrozenValue::from("two"));
        diff.record("A", FrozenValue::Absent);
        assert_eq!(diff.encode().unwrap(), r#"{"B":"two","A":null}"#);
    }

    #[test]
    fn test_record_last_write_wins() {
        let mut diff = EnvironDiff::new();
        assert_eq!(diff.record("A", FrozenValue::from("1")), None);
        assert_eq!(
            diff.record("A", FrozenValue::from("2")),
            Some(FrozenValue::from("1"))
        );
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.get("A").and_then(FrozenValue::as_str), Some("2"));
    }

    #[test]
    fn test_apply_to_sets_and_removes() {
        let diff: EnvironDiff = [
            ("KEEP", FrozenValue::from("old")),
            ("DROP", FrozenValue::Absent),
            ("GONE", FrozenValue::Absent),
        ]
        .into_iter()
        .collect();
        let mut store = HashMap::new();
        store.insert("KEEP".to_string(), "new".to_string());
        store.insert("DROP".to_string(), "x".to_string());
        store.insert("OTHER".to_string(), "y".to_string());

        diff.apply_to(&mut store).unwrap();

        assert_eq!(store.get("KEEP").map(String::as_str), Some("old"));
        assert!(!store.contains_key("DROP"));
        assert!(!store.contains_key("GONE"));
        assert_eq!(store.get("OTHER").map(String::as_str), Some("y"));
    }

    #[rstest]
    #[case("", FrozenValue::Absent)]
    #[case("A=B", FrozenValue::from("1"))]
    #[case("A\0B", FrozenValue::Absent)]
    #[case("B", FrozenValue::from("a\0b"))]
    fn test_apply_to_rejects_invalid_entry(#[case] name: &str, #[case] value: FrozenValue) {
        // 前面的合法条目也不能被写入
        let diff: EnvironDiff = [("A", FrozenValue::from("orig")), (name, value)]
            .into_iter()
            .collect();
        let mut store = HashMap::new();
        store.insert("A".to_string(), "boot".to_string());

        let err = diff.apply_to(&mut store).unwrap_err();
        assert!(matches!(err.reason(), EnvironReason::InvalidEntry(_)));
        assert_eq!(store.get("A").map(String::as_str), Some("boot"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_check_name() {
        assert!(check_name("LD_LIBRARY_PATH").is_ok());
        assert!(check_name("").is_err());
        assert!(check_name("A=B").is_err());
        assert!(check_name("A\0").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(FrozenValue::from("v").to_string(), "\"v\"");
        assert_eq!(FrozenValue::Absent.to_string(), "<unset>");
        assert!(FrozenValue::Absent.is_absent());
    }
}
