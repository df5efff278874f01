//! The interface_name module contains the definition of a valid network interface name, and the
//! code to support serialization and deserialization of the structure.
//!
//! Validation follows the criteria in the linux kernel: names must be between 1 and 15 characters,
//! must not contain whitespace or `/`, and must not be `.` or `..`.
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use snafu::ensure;
use std::convert::TryFrom;
use std::fmt::Display;
use std::ops::Deref;

lazy_static! {
    static ref NAME_REGEX: Regex = Regex::new(r"^[^\s/]{1,15}$").unwrap();
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct InterfaceName {
    inner: String,
}

impl TryFrom<&str> for InterfaceName {
    type Error = error::Error;

    fn try_from(input: &str) -> Result<Self, Self::Error> {
        ensure!(
            NAME_REGEX.is_match(input) && input != "." && input != "..",
            error::InvalidInterfaceNameSnafu { input }
        );

        Ok(Self {
            inner: input.to_string(),
        })
    }
}

impl TryFrom<String> for InterfaceName {
    type Error = error::Error;

    fn try_from(input: String) -> Result<Self, Self::Error> {
        Self::try_from(input.as_ref())
    }
}

impl Deref for InterfaceName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Display for InterfaceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl<'de> Deserialize<'de> for InterfaceName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let original = String::deserialize(deserializer)?;
        InterfaceName::try_from(original).map_err(|e| D::Error::custom(e.to_string()))
    }
}

impl Serialize for InterfaceName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.inner)
    }
}

mod error {
    use snafu::Snafu;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub(crate)))]
    pub(crate) enum Error {
        #[snafu(display(
            "Invalid interface name '{}': must be 1-15 characters, with no whitespace or '/'",
            input
        ))]
        InvalidInterfaceName { input: String },
    }
}
pub(crate) use error::Error;
