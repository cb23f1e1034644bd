//! Typed view of a journey API response.
//!
//! Only the fields needed to pick the next connection are modelled. The API
//! sends `null` for unknown values (delays in particular), so nearly
//! everything is an `Option`.

use serde::Deserialize;

/// A journey between the queried stations.
#[derive(Debug, Clone, Deserialize)]
pub struct Connection {
    /// Departure at the origin.
    pub from: Checkpoint,

    /// Arrival at the destination.
    pub to: Checkpoint,

    /// Legs of the journey, in travel order.
    pub sections: Option<Vec<Section>>,
}

impl Connection {
    /// `(location name, arrival delay)` for every section arriving late.
    pub fn delayed_sections(&self) -> Vec<(String, i64)> {
        self.sections
            .iter()
            .flatten()
            .filter_map(|section| {
                let delay = section.arrival_delay();
                (delay != 0).then(|| (section.location_name().to_string(), delay))
            })
            .collect()
    }
}

/// A stop on a connection with its timing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub station: Option<Place>,

    /// Scheduled departure as a Unix timestamp.
    pub departure_timestamp: Option<i64>,

    /// Delay in minutes, `None` when on time or unknown.
    pub delay: Option<i64>,
}

impl Checkpoint {
    /// Delay in minutes, treating unknown as zero.
    pub fn delay_mins(&self) -> i64 {
        self.delay.unwrap_or(0)
    }

    /// Station name, or the empty string when the API left it out.
    pub fn station_name(&self) -> &str {
        self.station
            .as_ref()
            .and_then(|s| s.name.as_deref())
            .unwrap_or("")
    }
}

/// A named station or address.
#[derive(Debug, Clone, Deserialize)]
pub struct Place {
    pub name: Option<String>,
}

/// One leg of a connection.
#[derive(Debug, Clone, Deserialize)]
pub struct Section {
    pub location: Option<Place>,
    pub arrival: Option<Checkpoint>,
}

impl Section {
    pub fn location_name(&self) -> &str {
        self.location
            .as_ref()
            .and_then(|l| l.name.as_deref())
            .unwrap_or("")
    }

    pub fn arrival_delay(&self) -> i64 {
        self.arrival.as_ref().map_or(0, Checkpoint::delay_mins)
    }
}
