//! API response types

use serde::{Deserialize, Deserializer};

use crate::error::Error;

/// Status envelope shared by every CDN77 response
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

impl Envelope {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    /// Turn a non-"ok" envelope into an error carrying its description
    pub fn into_checked(self) -> Result<Self, Error> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(Error::ApiStatus {
                status: self.status,
                description: self.description,
            })
        }
    }
}

/// A CDN resource as returned by `cdn-resource/list`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CdnResource {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cname: String,
}

/// Response of `cdn-resource/list`
#[derive(Debug, Deserialize)]
pub struct ResourceList {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(
        default,
        rename = "cdnResources",
        deserialize_with = "null_as_default"
    )]
    pub cdn_resources: Vec<CdnResource>,
}

/// Read `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
