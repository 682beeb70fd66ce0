use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{Result, Chainable, Error};

/// A structured text format that deserializes into any `T`, most often
/// [`Value`](crate::value::Value).
pub trait Format: Sized {
    /// The data format's error type.
    type Error: serde::de::Error + Into<Error> + 'static;

    /// File extension, without the leading dot, of files in this format.
    const EXTENSION: &'static str;

    /// Parses `string` as the data format `Self` as a `T` or returns an error
    /// if the `string` is an invalid `T`.
    fn from_str<T: DeserializeOwned>(string: &str) -> Result<T, Self::Error>;

    fn read<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
        let path = path.as_ref();
        let string = std::fs::read_to_string(path).chain_with(|| error! {
            "failed to read data file",
            "file path" => path.display(),
        })?;

        Self::from_str(&string).chain_with(|| error! {
            format!("invalid {} data", Self::EXTENSION),
            "file path" => path.display(),
        })
    }
}

macro_rules! impl_format {
    ($name:ident [$ext:literal] : $func:expr, $E:ty) => (
        #[derive(Debug, Default, Copy, Clone)]
        pub struct $name;

        impl Format for $name {
            type Error = $E;

            const EXTENSION: &'static str = $ext;

            fn from_str<T: DeserializeOwned>(s: &str) -> Result<T, $E> {
                $func(s)
            }
        }
    );
}

impl_format!(Json ["json"]: serde_json::from_str, serde_json::error::Error);
impl_format!(Toml ["toml"]: toml::from_str, toml::de::Error);
impl_format!(Yaml ["yaml"]: serde_yaml::from_str, serde_yaml::Error);
