// Askama template definitions

use askama::Template;

use crate::allocation::{BandOccupancy, CapacityReport, SHORT_TERM_LABEL, SEASON_LABEL};
use crate::db::{ParkingSession, UserAccount, VehicleType};
use crate::portal::{ParkingAssignment, PortalError, Severity};

/// One-shot message shown above the page content
pub struct Flash {
    pub kind: &'static str,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: "success",
            message: message.into(),
        }
    }

    /// Warnings keep the portal's wording; internal failures get a generic message
    pub fn from_error(err: &PortalError) -> Self {
        match (err.severity(), err) {
            (Severity::Warning, _) => Self {
                kind: "warning",
                message: err.to_string(),
            },
            (_, PortalError::Database(_) | PortalError::Inference(_) | PortalError::PasswordHash) => {
                tracing::error!(error = %err, "Dashboard request failed");
                Self {
                    kind: "error",
                    message: "Something went wrong. Please try again.".to_string(),
                }
            }
            _ => Self {
                kind: "error",
                message: err.to_string(),
            },
        }
    }
}

// Occupancy row on the capacity page
pub struct BandRow {
    pub description: String,
    pub occupied: usize,
    pub capacity: usize,
}

impl From<&BandOccupancy> for BandRow {
    fn from(band: &BandOccupancy) -> Self {
        Self {
            description: band.band.description(),
            occupied: band.occupied,
            capacity: band.capacity,
        }
    }
}

// Signup template
#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub flash: Option<Flash>,
    pub banks: &'static [&'static str],
}

// Login template
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub flash: Option<Flash>,
    pub version: String,
}

// Dashboard home with the start parking form
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub user_name: String,
    pub user: UserAccount,
    pub flash: Option<Flash>,
    pub vehicle_types: [VehicleType; 3],
}

// Start parking result and parking details
#[derive(Template)]
#[template(path = "parking.html")]
pub struct ParkingTemplate {
    pub user_name: String,
    pub flash: Option<Flash>,
    pub assignment: Option<ParkingAssignment>,
    pub session: Option<ParkingSession>,
}

// Capacity check
#[derive(Template)]
#[template(path = "capacity.html")]
pub struct CapacityTemplate {
    pub user_name: String,
    pub summary: String,
    pub occupied_list: String,
    pub bands: Vec<BandRow>,
}

impl CapacityTemplate {
    pub fn new(user_name: String, report: &CapacityReport) -> Self {
        Self {
            user_name,
            summary: report.summary(),
            occupied_list: report.occupied_list(),
            bands: report.bands.iter().map(BandRow::from).collect(),
        }
    }
}

// Report a parking issue
#[derive(Template)]
#[template(path = "report.html")]
pub struct ReportTemplate {
    pub user_name: String,
    pub flash: Option<Flash>,
    pub vehicle_types: [VehicleType; 3],
    pub labels: [&'static str; 2],
}

impl ReportTemplate {
    pub fn new(user_name: String, flash: Option<Flash>) -> Self {
        Self {
            user_name,
            flash,
            vehicle_types: VehicleType::ALL,
            labels: [SHORT_TERM_LABEL, SEASON_LABEL],
        }
    }
}
