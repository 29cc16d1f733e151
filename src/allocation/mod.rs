//! Slot bands and collision-free lot assignment.
//!
//! The lot is split into three fixed, disjoint bands covering 1..=500. The
//! band is chosen from the vehicle type and the predicted label, then a free
//! lot is drawn uniformly from that band's unoccupied lots.

use rand::Rng;
use serde::Serialize;
use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use thiserror::Error;

use crate::db::VehicleType;

pub type LotNumber = u16;

/// Lowest lot number in the car park
pub const FIRST_LOT: LotNumber = 1;

/// Highest lot number in the car park
pub const LAST_LOT: LotNumber = 500;

/// Label the classifier emits for season-parking sessions
pub const SEASON_LABEL: &str = "season_W";

/// Label the classifier emits for short-term sessions
pub const SHORT_TERM_LABEL: &str = "SHORT TERM";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error("No free parking lots left in {band} (lots {} – {})", .band.first(), .band.last())]
    CapacityExhausted { band: SlotBand },

    #[error("Predicted label '{0}' does not map to a parking band")]
    UnrecognizedLabel(String),

    #[error("Invalid range option {0}. It should be 1, 2, or 3.")]
    InvalidRange(u8),
}

/// Category of a predicted label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LabelCategory {
    Season,
    ShortTerm,
}

impl LabelCategory {
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case(SEASON_LABEL) {
            Some(LabelCategory::Season)
        } else if label.eq_ignore_ascii_case(SHORT_TERM_LABEL) {
            Some(LabelCategory::ShortTerm)
        } else {
            None
        }
    }

    /// Label as stored in the ledger
    pub fn canonical_label(&self) -> &'static str {
        match self {
            LabelCategory::Season => SEASON_LABEL,
            LabelCategory::ShortTerm => SHORT_TERM_LABEL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotBand {
    Season,
    ShortTerm,
    Motorcycle,
}

impl SlotBand {
    pub const ALL: [SlotBand; 3] = [SlotBand::Season, SlotBand::ShortTerm, SlotBand::Motorcycle];

    pub fn from_range_id(range_id: u8) -> Result<Self, AllocationError> {
        match range_id {
            1 => Ok(SlotBand::Season),
            2 => Ok(SlotBand::ShortTerm),
            3 => Ok(SlotBand::Motorcycle),
            other => Err(AllocationError::InvalidRange(other)),
        }
    }

    pub fn range_id(&self) -> u8 {
        match self {
            SlotBand::Season => 1,
            SlotBand::ShortTerm => 2,
            SlotBand::Motorcycle => 3,
        }
    }

    pub fn range(&self) -> RangeInclusive<LotNumber> {
        match self {
            SlotBand::Season => 1..=160,
            SlotBand::ShortTerm => 161..=480,
            SlotBand::Motorcycle => 481..=500,
        }
    }

    pub fn first(&self) -> LotNumber {
        *self.range().start()
    }

    pub fn last(&self) -> LotNumber {
        *self.range().end()
    }

    pub fn capacity(&self) -> usize {
        usize::from(self.last() - self.first()) + 1
    }

    pub fn contains(&self, lot: LotNumber) -> bool {
        self.range().contains(&lot)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotBand::Season => "season",
            SlotBand::ShortTerm => "short_term",
            SlotBand::Motorcycle => "motorcycle",
        }
    }

    /// Text shown to the user next to an assignment
    pub fn description(&self) -> String {
        match self {
            SlotBand::Motorcycle => format!("Motorcycle Parking – Parking Lots {} – {}", self.first(), self.last()),
            _ => format!("Parking Lots {} – {}", self.first(), self.last()),
        }
    }
}

impl std::fmt::Display for SlotBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} band", self.as_str())
    }
}

/// Choose the band for a vehicle and predicted label.
///
/// Motorcycles always use the reserved band, whatever the label says. Other
/// vehicles need a recognized label.
pub fn select_band(vehicle_type: VehicleType, predicted_label: &str) -> Result<SlotBand, AllocationError> {
    if vehicle_type.is_motorcycle() {
        return Ok(SlotBand::Motorcycle);
    }

    match LabelCategory::parse(predicted_label) {
        Some(LabelCategory::Season) => Ok(SlotBand::Season),
        Some(LabelCategory::ShortTerm) => Ok(SlotBand::ShortTerm),
        None => Err(AllocationError::UnrecognizedLabel(predicted_label.to_string())),
    }
}

/// Lots in `band` not present in `occupied`, ascending
pub fn free_slots(band: SlotBand, occupied: &BTreeSet<LotNumber>) -> Vec<LotNumber> {
    band.range().filter(|lot| !occupied.contains(lot)).collect()
}

/// Pick a free lot uniformly at random from `band`.
pub fn allocate<R: Rng>(
    band: SlotBand,
    occupied: &BTreeSet<LotNumber>,
    rng: &mut R,
) -> Result<LotNumber, AllocationError> {
    let free = free_slots(band, occupied);
    if free.is_empty() {
        return Err(AllocationError::CapacityExhausted { band });
    }
    Ok(free[rng.random_range(0..free.len())])
}

/// Occupancy of the whole car park
#[derive(Debug, Clone, Serialize)]
pub struct CapacityReport {
    pub total_lots: usize,
    pub occupied_count: usize,
    /// Percentage of all lots currently occupied
    pub occupied_percent: f64,
    pub occupied_lots: Vec<LotNumber>,
    pub bands: Vec<BandOccupancy>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BandOccupancy {
    pub band: SlotBand,
    pub first: LotNumber,
    pub last: LotNumber,
    pub occupied: usize,
    pub capacity: usize,
}

impl CapacityReport {
    pub fn from_occupied(occupied: &BTreeSet<LotNumber>) -> Self {
        let total_lots = usize::from(LAST_LOT - FIRST_LOT) + 1;
        let occupied_lots: Vec<LotNumber> = occupied
            .iter()
            .copied()
            .filter(|lot| (FIRST_LOT..=LAST_LOT).contains(lot))
            .collect();
        let occupied_count = occupied_lots.len();

        let bands = SlotBand::ALL
            .iter()
            .map(|band| BandOccupancy {
                band: *band,
                first: band.first(),
                last: band.last(),
                occupied: occupied_lots.iter().filter(|lot| band.contains(**lot)).count(),
                capacity: band.capacity(),
            })
            .collect();

        Self {
            total_lots,
            occupied_count,
            occupied_percent: occupied_count as f64 / total_lots as f64 * 100.0,
            occupied_lots,
            bands,
        }
    }

    /// e.g. "0.40% of Parking Lot is currently occupied."
    pub fn summary(&self) -> String {
        format!("{:.2}% of Parking Lot is currently occupied.", self.occupied_percent)
    }

    pub fn occupied_list(&self) -> String {
        self.occupied_lots
            .iter()
            .map(|lot| lot.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
