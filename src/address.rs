use crate::encoding::{Decode, Encode, Terminated};
use crate::{Error, Result};
use bech32::{FromBase32, ToBase32, Variant};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

pub const ACCOUNT_PREFIX: &str = "cosmos";
pub const VALIDATOR_PREFIX: &str = "cosmosvaloper";
pub const ADDRESS_LENGTH: usize = 20;

macro_rules! address_type {
    ($name:ident, $prefix:expr) => {
        #[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name {
            bytes: [u8; ADDRESS_LENGTH],
        }

        impl $name {
            pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
                Self { bytes }
            }

            pub fn bytes(&self) -> [u8; ADDRESS_LENGTH] {
                self.bytes
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let encoded = bech32::encode($prefix, self.bytes.to_base32(), Variant::Bech32)
                    .map_err(|_| std::fmt::Error)?;
                f.write_str(&encoded)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(self.bytes))
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                let (hrp, data, variant) =
                    bech32::decode(s).map_err(|e| Error::InvalidAddress(format!("{}: {}", s, e)))?;
                if hrp != $prefix || variant != Variant::Bech32 {
                    return Err(Error::InvalidAddress(format!(
                        "{}: expected prefix {}",
                        s, $prefix
                    )));
                }
                let bytes = Vec::<u8>::from_base32(&data)?;
                let bytes: [u8; ADDRESS_LENGTH] = bytes.try_into().map_err(|_| {
                    Error::InvalidAddress(format!("{}: expected {} bytes", s, ADDRESS_LENGTH))
                })?;
                Ok(Self { bytes })
            }
        }

        impl From<[u8; ADDRESS_LENGTH]> for $name {
            fn from(bytes: [u8; ADDRESS_LENGTH]) -> Self {
                Self { bytes }
            }
        }

        impl Encode for $name {
            fn encode_into<W: std::io::Write>(&self, dest: &mut W) -> ed::Result<()> {
                dest.write_all(&self.bytes)?;
                Ok(())
            }

            fn encoding_length(&self) -> ed::Result<usize> {
                Ok(ADDRESS_LENGTH)
            }
        }

        impl Decode for $name {
            fn decode<R: std::io::Read>(mut input: R) -> ed::Result<Self> {
                let mut bytes = [0; ADDRESS_LENGTH];
                input.read_exact(&mut bytes)?;
                Ok(Self { bytes })
            }
        }

        impl Terminated for $name {}

        impl Serialize for $name {
            fn serialize<S: Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(
                deserializer: D,
            ) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

address_type!(AccAddress, ACCOUNT_PREFIX);
address_type!(ValAddress, VALIDATOR_PREFIX);

/// A validator operator's own account, which is the default feeder.
impl From<ValAddress> for AccAddress {
    fn from(address: ValAddress) -> Self {
        AccAddress::new(address.bytes())
    }
}

impl From<AccAddress> for ValAddress {
    fn from(address: AccAddress) -> Self {
        ValAddress::new(address.bytes())
    }
}
