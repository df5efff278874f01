//! The vlan_id module contains the definition of a valid VLAN ID, and the code to support
//! serialization and deserialization of the structure.  A valid VLAN ID must fall between the
//! range of 1-4094; 0 is reserved for priority tagging and 4095 for implementation use.
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::TryFrom;
use std::fmt::Display;
use std::ops::Deref;

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct VlanId {
    inner: u16,
}

impl TryFrom<u16> for VlanId {
    type Error = error::Error;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        if !(1..=4094).contains(&id) {
            return error::InvalidVlanIdSnafu { id }.fail();
        }

        Ok(Self { inner: id })
    }
}

impl<'de> Deserialize<'de> for VlanId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let id: u16 = Deserialize::deserialize(deserializer)?;
        VlanId::try_from(id).map_err(|e| D::Error::custom(e.to_string()))
    }
}

impl Serialize for VlanId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u16(self.inner)
    }
}

impl Deref for VlanId {
    type Target = u16;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Display for VlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

mod error {
    use snafu::Snafu;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub(crate)))]
    pub(crate) enum Error {
        #[snafu(display("invalid vlan ID '{}': must be between 1-4094", id))]
        InvalidVlanId { id: u16 },
    }
}
