use std::{io, path::PathBuf};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Cannot read linktrace config at {path:?}.")]
	ReadConfig { path: PathBuf, source: io::Error },
	#[error("Linktrace config at {path:?} is not valid TOML.")]
	ParseConfig { path: PathBuf, source: toml::de::Error },
	/// `key` is the dotted TOML path of the rejected setting.
	#[error("Invalid `{key}`: {message}")]
	Validation { key: &'static str, message: String },
}
