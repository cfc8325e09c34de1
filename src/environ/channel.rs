use derive_getters::Getters;
use log::{debug, trace};
use orion_error::ToStructError;

use super::{
    EnvStore,
    error::{EnvironReason, EnvironResult},
    types::{EnvironDiff, check_name},
};

/// Name of the variable that carries the encoded diff to the child process.
///
/// Do not read or write it directly, the encoding is private to this crate.
pub const DIFF_VAR_NAME: &str = "PYTHONENVIRONDIFF";

/// The environment key a diff travels through.
#[derive(Getters, Clone, Debug, PartialEq, Eq)]
pub struct DiffChannel {
    key: String,
}

impl Default for DiffChannel {
    fn default() -> Self {
        Self::new(DIFF_VAR_NAME)
    }
}

impl DiffChannel {
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self { key: key.into() }
    }

    /// Reads the diff already stored in `environ` without consuming it.
    pub fn load<E: EnvStore + ?Sized>(&self, environ: &E) -> EnvironResult<EnvironDiff> {
        match environ.get_var(&self.key)? {
            Some(blob) => EnvironDiff::decode(&blob),
            None => Ok(EnvironDiff::default()),
        }
    }

    /// Flags `names` to be reset to their current value in `environ` when the
    /// next process starts.
    ///
    /// Entries from earlier calls are kept; a name frozen again takes the
    /// latest value. Nothing is written if the stored diff is malformed, if a
    /// name is not a valid variable name or is the channel key, or if a
    /// current value cannot be read as text.
    pub fn freeze<E, I, S>(&self, environ: &mut E, names: I) -> EnvironResult<()>
    where
        E: EnvStore + ?Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = names
            .into_iter()
            .map(|n| n.as_ref().to_string())
            .collect();
        check_name(&self.key)?;
        for name in names.iter() {
            if *name == self.key {
                return EnvironReason::ReservedKey(name.clone()).err_result();
            }
            check_name(name)?;
        }
        // 同名变量以最后一次冻结为准
        let mut diff = self.load(&*environ)?;
        for name in names.iter() {
            diff.capture(&*environ, name)?;
        }
        debug!("freeze {} vars into {}", diff.len(), self.key);
        environ.set_var(&self.key, &diff.encode()?);
        Ok(())
    }

    /// Pops the diff out of `environ` and restores every recorded variable.
    ///
    /// The whole diff is decoded and validated before any variable changes, so
    /// a malformed blob or an entry the environment would refuse leaves the
    /// variables untouched. The channel key is consumed either way.
    pub fn apply<E: EnvStore + ?Sized>(&self, environ: &mut E) -> EnvironResult<EnvironDiff> {
        let diff = match environ.remove_var(&self.key)? {
            Some(blob) => EnvironDiff::decode(&blob)?,
            None => EnvironDiff::default(),
        };
        if diff.is_empty() {
            trace!("nothing to apply");
        } else {
            diff.apply_to(environ)?;
        }
        Ok(diff)
    }
}

/// [`DiffChannel::freeze`] through the default channel.
///
/// ```
/// use std::collections::HashMap;
/// use environ_freeze::{apply_diff_to, freeze};
///
/// let mut env: HashMap<String, String> = HashMap::new();
/// env.insert("DEMO".into(), "one".into());
/// freeze(&mut env, ["DEMO"]).unwrap();
/// env.insert("DEMO".into(), "two".into());
///
/// apply_diff_to(&mut env).unwrap();
/// assert_eq!(env["DEMO"], "one");
/// ```
pub fn freeze<E, I, S>(environ: &mut E, names: I) -> EnvironResult<()>
where
    E: EnvStore + ?Sized,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    DiffChannel::default().freeze(environ, names)
}

/// [`DiffChannel::apply`] through the default channel on an injected store.
pub fn apply_diff_to<E: EnvStore + ?Sized>(environ: &mut E) -> EnvironResult<EnvironDiff> {
    DiffChannel::default().apply(environ)
}
