//! Species and plots.

use common::{PlotId, SpeciesId};
use serde::{Deserialize, Serialize};

/// A tree species that can be adopted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Species {
    pub id: SpeciesId,
    pub common_name: String,
    /// Plot capacity (square metres) one tree of this species occupies.
    pub space_required: i64,
    /// Adoption price in the currency's minor unit.
    pub price: i64,
}

impl Species {
    pub fn new(common_name: impl Into<String>, space_required: i64, price: i64) -> Self {
        Self {
            id: SpeciesId::new(),
            common_name: common_name.into(),
            space_required,
            price,
        }
    }
}

/// A physical plot of land with finite planting capacity.
///
/// Invariant: `0 <= available_capacity <= total_capacity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plot {
    pub id: PlotId,
    pub location_name: String,
    pub address: String,
    pub total_capacity: i64,
    pub available_capacity: i64,
}

impl Plot {
    /// Creates an empty plot whose full capacity is available.
    pub fn new(
        location_name: impl Into<String>,
        address: impl Into<String>,
        total_capacity: i64,
    ) -> Self {
        Self {
            id: PlotId::new(),
            location_name: location_name.into(),
            address: address.into(),
            total_capacity,
            available_capacity: total_capacity,
        }
    }

    /// Returns true if `amount` can be debited without going negative.
    pub fn has_room_for(&self, amount: i64) -> bool {
        self.available_capacity >= amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_plot_is_fully_available() {
        let plot = Plot::new("North Ridge", "Jl. Hutan 1", 10);
        assert_eq!(plot.available_capacity, 10);
        assert_eq!(plot.total_capacity, 10);
    }

    #[test]
    fn test_has_room_for() {
        let mut plot = Plot::new("North Ridge", "Jl. Hutan 1", 10);
        plot.available_capacity = 4;
        assert!(plot.has_room_for(4));
        assert!(!plot.has_room_for(5));
    }
}
