//! Keep launcher bootstrap variables from leaking into grandchildren.
//!
//! A launcher calls [`freeze`] on the environment it hands to a child, then
//! tweaks that environment as needed to start the child. The child calls
//! [`setup`] at startup, which resets every frozen variable to the value it
//! had at freeze time, or removes it when it was unset.

pub mod environ;

pub use environ::{
    DIFF_VAR_NAME, DiffChannel, DiffMap, EnvStore, EnvironDiff, EnvironError, EnvironReason,
    EnvironResult, FrozenValue, ProcessEnv, apply_diff, apply_diff_to, freeze, setup, try_setup,
};
