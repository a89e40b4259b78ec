use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub name: Name,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub storage_class: Option<String>,
    #[serde(default)]
    pub time_created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Name(pub String);

impl Name {
    const MIN_LEN: usize = 3;
    const MAX_LEN: usize = 63;
}

impl FromStr for Name {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self> {
        let is_allowed =
            |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || "-_.".contains(c);
        let is_edge = |c: Option<char>| c.is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());

        if (Self::MIN_LEN..=Self::MAX_LEN).contains(&string.len())
            && string.chars().all(is_allowed)
            && is_edge(string.chars().next())
            && is_edge(string.chars().last())
        {
            Ok(Name(string.to_owned()))
        } else {
            Err(Error::BadBucketName {
                name: string.to_owned(),
            })
        }
    }
}

impl Display for Name {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct NewBucket<'request> {
    pub name: &'request Name,
    pub location: &'request str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateRequest<'request> {
    pub name: &'request Name,
    pub location: &'request str,
}

impl<'request> From<NewBucket<'request>> for CreateRequest<'request> {
    fn from(bucket: NewBucket<'request>) -> Self {
        Self {
            name: bucket.name,
            location: bucket.location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_bucket_names() {
        for name in ["cloud_project_model_storage12345", "abc", "my-bucket.v1"] {
            assert_eq!(name.parse::<Name>().unwrap().0, name);
        }
    }

    #[test]
    fn test_invalid_bucket_names() {
        let too_long = "a".repeat(64);
        for name in ["ab", "Upper", "-leading", "trailing_", "has space", too_long.as_str()] {
            assert!(name.parse::<Name>().is_err(), "{name}");
        }
    }
}
