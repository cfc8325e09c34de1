use std::{env, sync::Once};

use log::error;
use orion_error::ToStructError;

use super::{
    EnvStore,
    channel::apply_diff_to,
    error::{EnvironReason, EnvironResult},
    types::EnvironDiff,
};

/// The live environment of the current process.
///
/// Writes go through [`std::env::set_var`] and [`std::env::remove_var`], which
/// are only sound while no other thread reads the environment. Use it at
/// startup, before spawning threads. Values that are not valid unicode are
/// reported as [`EnvironReason::NotUnicode`], never as unset.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnv;

impl EnvStore for ProcessEnv {
    fn get_var(&self, name: &str) -> EnvironResult<Option<String>> {
        match env::var_os(name) {
            None => Ok(None),
            Some(raw) => match raw.into_string() {
                Ok(value) => Ok(Some(value)),
                Err(_) => EnvironReason::NotUnicode(name.to_string()).err_result(),
            },
        }
    }

    fn set_var(&mut self, name: &str, value: &str) {
        unsafe { env::set_var(name, value) };
    }

    fn unset_var(&mut self, name: &str) {
        unsafe { env::remove_var(name) };
    }
}

/// Restores the variables frozen by the parent process into this process.
pub fn apply_diff() -> EnvironResult<EnvironDiff> {
    apply_diff_to(&mut ProcessEnv)
}

// 与 try_setup 共用
static SETUP: Once = Once::new();

/// Startup hook: applies the inherited diff once per process.
///
/// Call it first thing in `main`. A malformed diff is logged; use
/// [`try_setup`] to handle it instead.
pub fn setup() {
    SETUP.call_once(|| {
        if let Err(e) = apply_diff() {
            error!("apply environ diff failed: {e}");
        }
    });
}

/// Like [`setup`] but returns the decoding failure. Runs at most once per
/// process together with [`setup`]; later calls return `Ok`.
pub fn try_setup() -> EnvironResult<()> {
    let mut out = Ok(());
    SETUP.call_once(|| {
        out = apply_diff().map(|_| ());
    });
    out
}
