use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;

use super::error::EnvironResult;

/// A mutable view over a set of environment variables.
///
/// The diff logic only talks to this trait, so it can run against a plain map
/// that will be handed to a child process, or against the live process
/// environment through [`ProcessEnv`](super::ProcessEnv).
pub trait EnvStore {
    /// `Ok(None)` when unset; an error when the value cannot be read as text.
    fn get_var(&self, name: &str) -> EnvironResult<Option<String>>;
    fn set_var(&mut self, name: &str, value: &str);
    /// 变量不存在时什么也不做
    fn unset_var(&mut self, name: &str);

    /// Reads `name` and unsets it. The variable is gone even when reading
    /// its value fails.
    fn remove_var(&mut self, name: &str) -> EnvironResult<Option<String>> {
        let old = self.get_var(name);
        self.unset_var(name);
        old
    }
}

impl EnvStore for HashMap<String, String> {
    fn get_var(&self, name: &str) -> EnvironResult<Option<String>> {
        Ok(self.get(name).cloned())
    }

    fn set_var(&mut self, name: &str, value: &str) {
        self.insert(name.to_string(), value.to_string());
    }

    fn unset_var(&mut self, name: &str) {
        self.remove(name);
    }
}

impl EnvStore for BTreeMap<String, String> {
    fn get_var(&self, name: &str) -> EnvironResult<Option<String>> {
        Ok(self.get(name).cloned())
    }

    fn set_var(&mut self, name: &str, value: &str) {
        self.insert(name.to_string(), value.to_string());
    }

    fn unset_var(&mut self, name: &str) {
        self.remove(name);
    }
}

impl EnvStore for IndexMap<String, String> {
    fn get_var(&self, name: &str) -> EnvironResult<Option<String>> {
        Ok(self.get(name).cloned())
    }

    fn set_var(&mut self, name: &str, value: &str) {
        self.insert(name.to_string(), value.to_string());
    }

    // 保持剩余条目的顺序
    fn unset_var(&mut self, name: &str) {
        self.shift_remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise<S: EnvStore + Default>() {
        let mut store = S::default();
        assert_eq!(store.get_var("A").unwrap(), None);
        store.set_var("A", "1");
        assert_eq!(store.get_var("A").unwrap(), Some("1".to_string()));
        store.set_var("A", "2");
        assert_eq!(store.remove_var("A").unwrap(), Some("2".to_string()));
        assert_eq!(store.remove_var("A").unwrap(), None);
        // 重复删除不报错
        store.unset_var("A");
        assert_eq!(store.get_var("A").unwrap(), None);
    }

    #[test]
    fn test_map_stores() {
        exercise::<HashMap<String, String>>();
        exercise::<BTreeMap<String, String>>();
        exercise::<IndexMap<String, String>>();
    }

    #[test]
    fn test_index_store_keeps_order() {
        let mut store: IndexMap<String, String> = IndexMap::new();
        store.set_var("A", "1");
        store.set_var("B", "2");
        store.set_var("C", "3");
        store.unset_var("B");
        let keys: Vec<&str> = store.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["A", "C"]);
    }
}
