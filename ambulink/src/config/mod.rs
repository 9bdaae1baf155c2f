//! Configuration for the AmbuLink client.
//!
//! Configuration lives in `~/.ambulink/config.ini`. A missing file yields
//! defaults; every value present in the file overlays the default.
//!
//! - [`settings`] - one struct per `[section]`
//! - [`defaults`] - `DEFAULT_*` constants and `ConfigFile::default()`
//! - [`parser`] - INI → `ConfigFile`
//! - [`writer`] - `ConfigFile` → commented INI
//! - [`keys`] - dotted `section.key` access for the `config` CLI command

mod defaults;
mod file;
mod keys;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use keys::{ConfigKey, ConfigKeyError};
pub use settings::*;
