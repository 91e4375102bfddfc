use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to load image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid settings file {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize descriptor: {0}")]
    Serialize(String),

    #[error("invalid color '{0}', expected #RRGGBB")]
    Color(String),

    #[error("invalid sample '{0}', expected NAME=COUNT")]
    Samples(String),

    #[error("unknown key '{0}'")]
    UnknownKey(String),
}

pub type Result<T> = std::result::Result<T, Error>;
