pub use tgrelay_common::{Error, Result};

tgrelay_common::impl_context!();
