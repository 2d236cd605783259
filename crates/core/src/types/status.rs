//! Enumerations carried on listing records.

use serde::{Deserialize, Serialize};

/// Whether a listed vehicle can still be bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[default]
    Available,
    Sold,
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::Sold => write!(f, "sold"),
        }
    }
}

impl std::str::FromStr for Availability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "sold" => Ok(Self::Sold),
            _ => Err(format!("invalid availability: {s}")),
        }
    }
}

/// Listing category offered by the sell form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Cars,
    Bikes,
    Suv,
    Luxury,
}

impl Category {
    /// Every category, in the order the sell form lists them.
    pub const ALL: [Self; 4] = [Self::Cars, Self::Bikes, Self::Suv, Self::Luxury];

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Cars => "Cars",
            Self::Bikes => "Bikes",
            Self::Suv => "SUV",
            Self::Luxury => "Luxury Cars",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cars => write!(f, "cars"),
            Self::Bikes => write!(f, "bikes"),
            Self::Suv => write!(f, "suv"),
            Self::Luxury => write!(f, "luxury"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cars" => Ok(Self::Cars),
            "bikes" => Ok(Self::Bikes),
            "suv" => Ok(Self::Suv),
            "luxury" => Ok(Self::Luxury),
            _ => Err(format!("invalid category: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trips_through_display() {
        for category in Category::ALL {
            assert_eq!(category.to_string().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn test_category_rejects_unknown() {
        assert!("trucks".parse::<Category>().is_err());
    }

    #[test]
    fn test_availability_wire_format() {
        assert_eq!(
            serde_json::to_string(&Availability::Sold).unwrap(),
            "\"sold\""
        );
        assert_eq!(Availability::default(), Availability::Available);
    }
}
