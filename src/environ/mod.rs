mod channel;
mod error;
mod global;
mod store;
mod types;
pub use channel::{DIFF_VAR_NAME, DiffChannel, apply_diff_to, freeze};
pub use error::{EnvironError, EnvironReason, EnvironResult};
pub use global::{ProcessEnv, apply_diff, setup, try_setup};
pub use store::EnvStore;
pub use types::{DiffMap, EnvironDiff, FrozenValue};
