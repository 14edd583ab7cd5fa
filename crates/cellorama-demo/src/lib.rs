#![forbid(unsafe_code)]

pub mod cli;

pub use cellorama_runtime::{CelloramaError, Result};
pub use cli::run_from_env;
