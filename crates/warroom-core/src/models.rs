//! Domain models for the War Room

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// A geographic point with its raw address string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

/// One observed rideshare trip
///
/// Immutable once loaded. Owned by the dataset; referenced (never mutated)
/// by the processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub trip_id: i64,
    pub booking_user_id: Option<i64>,
    pub timestamp: NaiveDateTime,
    pub pickup: Location,
    pub dropoff: Location,
    /// Austin zone derived from the pickup address
    pub pickup_zone: String,
    /// Austin zone derived from the dropoff address
    pub dropoff_zone: String,
    /// Total passengers on the trip, always >= 1
    pub passengers: u32,
}

impl TripRecord {
    /// Hour-of-day component of the pickup timestamp (0-23)
    pub fn pickup_hour(&self) -> u8 {
        self.timestamp.hour() as u8
    }
}

/// An ordered, read-only collection of valid trips plus load diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct TripDataset {
    /// Source identity (URL, path, or "sample")
    pub source: String,
    pub records: Vec<TripRecord>,
    /// Rows dropped during parsing (missing fields, bad timestamps,
    /// passenger count < 1)
    pub skipped: usize,
}

impl TripDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Fixed group-size buckets used for the distribution report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupSizeBucket {
    /// Exactly 1 passenger
    Solo,
    /// 2-4 passengers
    Small,
    /// 5-8 passengers
    Large,
    /// 9 or more passengers
    ExtraLarge,
}

impl GroupSizeBucket {
    pub fn for_passengers(passengers: u32) -> Self {
        match passengers {
            0 | 1 => Self::Solo,
            2..=4 => Self::Small,
            5..=8 => Self::Large,
            _ => Self::ExtraLarge,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Solo => "1",
            Self::Small => "2-4",
            Self::Large => "5-8",
            Self::ExtraLarge => "9+",
        }
    }

    pub fn all() -> &'static [GroupSizeBucket] {
        &[Self::Solo, Self::Small, Self::Large, Self::ExtraLarge]
    }

    /// Index into the fixed-size bucket count array
    pub fn index(&self) -> usize {
        match self {
            Self::Solo => 0,
            Self::Small => 1,
            Self::Large => 2,
            Self::ExtraLarge => 3,
        }
    }
}

impl std::fmt::Display for GroupSizeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The three fixed war-room personas
///
/// A closed set: the domain never requires a fourth persona added at
/// runtime, so rendering strategies dispatch statically on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    /// Vehicle positioning and fleet efficiency
    Driver,
    /// Rider experience and group formation
    Rider,
    /// Traffic flow and urban planning
    Planner,
}

impl Persona {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Driver => "Driver Agent",
            Self::Rider => "Rider Agent",
            Self::Planner => "City Planner Agent",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Driver => "🚗",
            Self::Rider => "👥",
            Self::Planner => "🏙️",
        }
    }

    /// Tone descriptor handed to the text-generation service
    pub fn tone(&self) -> &'static str {
        match self {
            Self::Driver => "a pragmatic fleet dispatcher focused on vehicle positioning and efficiency",
            Self::Rider => "an upbeat rider advocate focused on social group formation and experience",
            Self::Planner => "a measured city planner focused on traffic flow and balanced deployment",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Driver => "driver",
            Self::Rider => "rider",
            Self::Planner => "planner",
        }
    }

    /// All personas in response order
    pub fn all() -> &'static [Persona] {
        &[Self::Driver, Self::Rider, Self::Planner]
    }
}

impl std::str::FromStr for Persona {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "driver" => Ok(Self::Driver),
            "rider" => Ok(Self::Rider),
            "planner" | "city_planner" => Ok(Self::Planner),
            _ => Err(format!("Unknown persona: {}", s)),
        }
    }
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a persona response was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    /// Returned by the external text-generation service
    Generated,
    /// Rendered from the local deterministic template
    Template,
}

/// One persona's answer to a user query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaResponse {
    pub persona: Persona,
    pub text: String,
    pub source: ResponseSource,
}

/// A user query with the three persona responses it produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub query: String,
    pub responses: Vec<PersonaResponse>,
    pub winner: Persona,
    pub asked_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_size_buckets() {
        assert_eq!(GroupSizeBucket::for_passengers(1), GroupSizeBucket::Solo);
        assert_eq!(GroupSizeBucket::for_passengers(2), GroupSizeBucket::Small);
        assert_eq!(GroupSizeBucket::for_passengers(4), GroupSizeBucket::Small);
        assert_eq!(GroupSizeBucket::for_passengers(5), GroupSizeBucket::Large);
        assert_eq!(GroupSizeBucket::for_passengers(8), GroupSizeBucket::Large);
        assert_eq!(
            GroupSizeBucket::for_passengers(9),
            GroupSizeBucket::ExtraLarge
        );
        assert_eq!(
            GroupSizeBucket::for_passengers(14),
            GroupSizeBucket::ExtraLarge
        );
    }

    #[test]
    fn test_persona_parse() {
        assert_eq!("driver".parse::<Persona>().unwrap(), Persona::Driver);
        assert_eq!("PLANNER".parse::<Persona>().unwrap(), Persona::Planner);
        assert!("mayor".parse::<Persona>().is_err());
    }

    #[test]
    fn test_persona_order() {
        let all = Persona::all();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0], Persona::Driver);
        assert_eq!(all[2], Persona::Planner);
    }
}
