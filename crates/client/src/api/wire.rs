//! Response envelopes.
//!
//! The marketplace API is not consistent about wrapping: some endpoints
//! return a bare record, some wrap it in an object keyed by the resource
//! name, and some do either depending on the deployment. Each envelope
//! accepts every shape seen in the wild and unwraps to the record.

use c2c_core::{ListingRecord, Profile};
use serde::{Deserialize, Deserializer};

/// `GET /listings` and `GET /listings/my-list`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum ListingsEnvelope {
    Bare(Vec<ListingRecord>),
    Wrapped {
        #[serde(default, deserialize_with = "null_as_empty")]
        listings: Vec<ListingRecord>,
    },
}

impl ListingsEnvelope {
    pub(super) fn into_inner(self) -> Vec<ListingRecord> {
        match self {
            Self::Bare(listings) | Self::Wrapped { listings } => listings,
        }
    }
}

/// A missing or `null` list is an empty list.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ListingRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<ListingRecord>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// `GET /listings/:id` and `POST /listings/create`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum ListingEnvelope {
    Wrapped { listing: ListingRecord },
    Bare(ListingRecord),
}

impl ListingEnvelope {
    pub(super) fn into_inner(self) -> ListingRecord {
        match self {
            Self::Wrapped { listing } | Self::Bare(listing) => listing,
        }
    }
}

/// `GET /users/profile`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum ProfileEnvelope {
    Profile { profile: Profile },
    User { user: Profile },
    Bare(Profile),
}

impl ProfileEnvelope {
    pub(super) fn into_inner(self) -> Profile {
        match self {
            Self::Profile { profile } | Self::User { user: profile } | Self::Bare(profile) => {
                profile
            }
        }
    }
}
