//! Portal flows: signup, login, start parking, details, capacity and reports.
//!
//! Both the HTML dashboard and the JSON API call into [`Portal`]; neither
//! talks to the ledger directly for these flows.

mod error;

pub use error::{PortalError, Severity};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::allocation::{
    allocate, select_band, AllocationError, CapacityReport, LabelCategory, LotNumber, SlotBand,
    FIRST_LOT, LAST_LOT,
};
use crate::api::metrics::{record_allocation, record_allocation_failure};
use crate::api::validation::{
    is_valid_account_number, is_valid_bank_name, is_valid_email, is_valid_name, is_valid_number,
};
use crate::crypto::{generate_token, hash_password};
use crate::db::{
    InsertOutcome, IssueReport, LoginSession, NewParkingSession, NewUserAccount, ParkingSession,
    UserAccount, VehicleType,
};
use crate::inference::LabelClassifier;
use crate::DbPool;

/// Attempts to store a session when concurrent requests keep taking the drawn lot
const MAX_ALLOCATION_ATTEMPTS: usize = 5;

const MAX_DESCRIPTION_LENGTH: usize = 2000;

#[derive(Debug, Clone, Deserialize)]
pub struct SignupForm {
    pub email: String,
    pub name: String,
    pub phone: String,
    pub bank_name: String,
    pub account_no: String,
    #[serde(default)]
    pub billing_address: String,
    pub password: String,
    /// Checked when present; the HTML form always sends it
    #[serde(default)]
    pub confirm_password: Option<String>,
}

impl SignupForm {
    /// First failing check wins, in form order
    pub fn validate(&self) -> Result<(), PortalError> {
        if !is_valid_email(&self.email) {
            return Err(PortalError::validation(
                "email",
                "Invalid email format. Please enter a valid email.",
            ));
        }
        if !is_valid_name(&self.name) {
            return Err(PortalError::validation(
                "name",
                "Invalid name format. Please enter a valid name (letters and spaces only).",
            ));
        }
        if !is_valid_number(&self.phone) {
            return Err(PortalError::validation(
                "phone",
                "Invalid phone number format. Please enter a valid phone number (numbers only and 8 digits).",
            ));
        }
        if !is_valid_account_number(&self.account_no) {
            return Err(PortalError::validation(
                "account_no",
                "Invalid account number format. Please enter a valid account number (within the range 7 to 15 digits).",
            ));
        }
        if !is_valid_bank_name(&self.bank_name) {
            return Err(PortalError::validation("bank_name", "Please choose a bank from the list."));
        }
        if self.password.is_empty() {
            return Err(PortalError::validation("password", "Password is required."));
        }
        if let Some(confirm) = &self.confirm_password {
            if confirm != &self.password {
                return Err(PortalError::validation(
                    "confirm_password",
                    "Password and Confirm Password do not match.",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartParkingForm {
    pub vehicle_type: VehicleType,
    pub total_charge: f64,
    pub duration: f64,
}

impl StartParkingForm {
    pub fn validate(&self) -> Result<(), PortalError> {
        if !self.total_charge.is_finite() || self.total_charge < 0.0 {
            return Err(PortalError::validation(
                "total_charge",
                "Total charge must be a non-negative number.",
            ));
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(PortalError::validation(
                "duration",
                "Duration must be a non-negative number.",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportForm {
    pub lot_no: i64,
    pub vehicle_type: VehicleType,
    pub predicted_label: String,
    #[serde(default)]
    pub description: String,
}

impl ReportForm {
    /// Returns the lot number and the canonical label
    fn validate(&self) -> Result<(LotNumber, &'static str), PortalError> {
        let lot_no = LotNumber::try_from(self.lot_no)
            .ok()
            .filter(|lot| (FIRST_LOT..=LAST_LOT).contains(lot))
            .ok_or_else(|| {
                PortalError::validation(
                    "lot_no",
                    format!("Lot number must be between {} and {}.", FIRST_LOT, LAST_LOT),
                )
            })?;

        let label = LabelCategory::parse(&self.predicted_label)
            .ok_or_else(|| PortalError::validation("predicted_label", "Unknown predicted label."))?
            .canonical_label();

        if self.description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(PortalError::validation(
                "description",
                format!("Description is too long (max {} characters).", MAX_DESCRIPTION_LENGTH),
            ));
        }

        Ok((lot_no, label))
    }
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user: UserAccount,
}

impl LoginOutcome {
    pub fn welcome_message(&self) -> String {
        format!("Login successful! Welcome, {}!", self.user.name)
    }
}

/// Result of a successful start-parking request
#[derive(Debug, Clone, Serialize)]
pub struct ParkingAssignment {
    pub lot_no: LotNumber,
    pub band: SlotBand,
    pub band_description: String,
    pub vehicle_type: VehicleType,
    pub predicted_label: String,
    pub duration: f64,
    pub total_charge: f64,
    pub session_start: String,
}

pub struct Portal {
    db: DbPool,
    classifier: Arc<dyn LabelClassifier>,
    session_ttl_hours: i64,
}

impl Portal {
    pub fn new(db: DbPool, classifier: Arc<dyn LabelClassifier>, session_ttl_hours: i64) -> Self {
        Self {
            db,
            classifier,
            session_ttl_hours,
        }
    }

    pub async fn signup(&self, form: &SignupForm) -> Result<UserAccount, PortalError> {
        form.validate()?;

        if UserAccount::find_by_email(&self.db, &form.email).await?.is_some() {
            warn!(email = %form.email, "Signup with an already registered email");
            return Err(PortalError::DuplicateEmail);
        }

        let password_hash = hash_password(&form.password).map_err(|_| PortalError::PasswordHash)?;
        let account = NewUserAccount {
            email: form.email.clone(),
            phone: form.phone.clone(),
            name: form.name.clone(),
            password_hash,
            bank_name: form.bank_name.clone(),
            account_no: form.account_no.clone(),
            billing_address: form.billing_address.clone(),
        };

        // The unique index still decides if two signups race past the lookup
        let user = UserAccount::insert(&self.db, &account)
            .await?
            .ok_or(PortalError::DuplicateEmail)?;

        info!(user_id = user.id, email = %user.email, "User registered");
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, PortalError> {
        let user = UserAccount::find_by_credentials(&self.db, email, password)
            .await?
            .ok_or_else(|| {
                warn!(email = %email, "Failed login attempt");
                PortalError::InvalidCredentials
            })?;

        let purged = LoginSession::purge_expired(&self.db).await?;
        if purged > 0 {
            debug!(purged, "Removed expired login sessions");
        }

        let token = generate_token();
        LoginSession::create(&self.db, user.id, &token, self.session_ttl_hours).await?;

        info!(user_id = user.id, "User logged in");
        Ok(LoginOutcome { token, user })
    }

    /// Resolve a session token to its account
    pub async fn authenticate(&self, token: &str) -> Result<UserAccount, PortalError> {
        LoginSession::find_user_by_token(&self.db, token)
            .await?
            .ok_or(PortalError::NotLoggedIn)
    }

    pub async fn logout(&self, token: &str) -> Result<(), PortalError> {
        if LoginSession::revoke(&self.db, token).await? {
            info!("User logged out");
        }
        Ok(())
    }

    pub async fn start_parking(
        &self,
        user: &UserAccount,
        form: &StartParkingForm,
    ) -> Result<ParkingAssignment, PortalError> {
        form.validate()?;

        // Early answer before running inference; the insert below is what
        // actually enforces one session per user
        if ParkingSession::find_active(&self.db, user.id).await?.is_some() {
            warn!(user_id = user.id, "Start parking while already parked");
            return Err(PortalError::AlreadyParked);
        }

        let predicted_label =
            self.classifier
                .classify(form.vehicle_type, form.total_charge, form.duration)?;

        let band = select_band(form.vehicle_type, &predicted_label).map_err(|e| {
            warn!(user_id = user.id, label = %predicted_label, "No band for predicted label");
            record_allocation_failure("unrecognized_label");
            e
        })?;

        let occupied = ParkingSession::list_occupied_slots(&self.db).await?;
        self.place_in_band(user, form, predicted_label, band, occupied)
            .await
    }

    /// Draw a free lot from `occupied` and store the session.
    ///
    /// When the insert finds the lot already held, the occupied set is read
    /// again and another lot drawn. After `MAX_ALLOCATION_ATTEMPTS`
    /// collisions this reports `CapacityExhausted` even if the band still
    /// has free lots.
    async fn place_in_band(
        &self,
        user: &UserAccount,
        form: &StartParkingForm,
        predicted_label: String,
        band: SlotBand,
        mut occupied: BTreeSet<LotNumber>,
    ) -> Result<ParkingAssignment, PortalError> {
        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            if attempt > 1 {
                occupied = ParkingSession::list_occupied_slots(&self.db).await?;
            }
            let lot_no = {
                let mut rng = rand::rng();
                allocate(band, &occupied, &mut rng)
            }
            .map_err(|e| {
                warn!(user_id = user.id, band = %band, "Parking band is full");
                record_allocation_failure("capacity_exhausted");
                e
            })?;

            let new_session = NewParkingSession {
                user_id: user.id,
                vehicle_type: form.vehicle_type.to_string(),
                predicted_label: predicted_label.clone(),
                lot_no,
                duration: form.duration,
                total_charge: form.total_charge,
            };

            match ParkingSession::insert(&self.db, &new_session).await? {
                InsertOutcome::Inserted(session_start) => {
                    info!(
                        user_id = user.id,
                        lot_no,
                        attempt,
                        band = %band,
                        label = %predicted_label,
                        "Parking session started"
                    );
                    record_allocation(band);
                    return Ok(ParkingAssignment {
                        lot_no,
                        band,
                        band_description: band.description(),
                        vehicle_type: form.vehicle_type,
                        predicted_label,
                        duration: form.duration,
                        total_charge: form.total_charge,
                        session_start,
                    });
                }
                InsertOutcome::AlreadyParked => {
                    warn!(user_id = user.id, "Concurrent start parking for the same user");
                    return Err(PortalError::AlreadyParked);
                }
                InsertOutcome::LotTaken => {
                    debug!(attempt, lot_no, "Lot taken by a concurrent request, drawing again");
                }
            }
        }

        warn!(
            user_id = user.id,
            band = %band,
            attempts = MAX_ALLOCATION_ATTEMPTS,
            "Gave up after repeated lot collisions"
        );
        record_allocation_failure("collision_limit");
        Err(AllocationError::CapacityExhausted { band }.into())
    }

    pub async fn show_details(&self, user_id: i64) -> Result<ParkingSession, PortalError> {
        ParkingSession::find_active(&self.db, user_id)
            .await?
            .ok_or(PortalError::NoActiveSession)
    }

    pub async fn check_capacity(&self) -> Result<CapacityReport, PortalError> {
        let occupied = ParkingSession::list_occupied_slots(&self.db).await?;
        Ok(CapacityReport::from_occupied(&occupied))
    }

    pub async fn report_issue(
        &self,
        user_id: i64,
        form: &ReportForm,
    ) -> Result<IssueReport, PortalError> {
        let (lot_no, label) = form.validate()?;

        if IssueReport::has_report(&self.db, user_id).await? {
            warn!(user_id, "Duplicate issue report");
            return Err(PortalError::ReportAlreadySubmitted);
        }

        let report = IssueReport::insert(
            &self.db,
            user_id,
            lot_no,
            form.vehicle_type.as_str(),
            label,
            form.description.trim(),
        )
        .await?
        .ok_or(PortalError::ReportAlreadySubmitted)?;

        info!(user_id, lot_no, "Parking report submitted");
        Ok(report)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{signup_form, FixedLabel};
    use super::*;
    use crate::db::testing::temp_db;
    use tempfile::TempDir;

    async fn portal(label: &'static str) -> (TempDir, Arc<Portal>) {
        let (dir, db) = temp_db().await;
        (dir, Arc::new(Portal::new(db, Arc::new(FixedLabel(label)), 24)))
    }

    /// Account stored without hashing, for tests that need many users
    async fn seed_user(portal: &Portal, email: &str) -> UserAccount {
        let account = NewUserAccount {
            email: email.to_string(),
            phone: "12345678".to_string(),
            name: "Rider".to_string(),
            password_hash: "unused".to_string(),
            bank_name: "UOB".to_string(),
            account_no: "1234567".to_string(),
            billing_address: String::new(),
        };
        UserAccount::insert(&portal.db, &account).await.unwrap().unwrap()
    }

    fn park(vehicle_type: VehicleType) -> StartParkingForm {
        StartParkingForm {
            vehicle_type,
            total_charge: 5.0,
            duration: 2.0,
        }
    }

    fn report(lot_no: i64) -> ReportForm {
        ReportForm {
            lot_no,
            vehicle_type: VehicleType::C,
            predicted_label: "Season_W".to_string(),
            description: "Someone else is in my lot".to_string(),
        }
    }

    fn field_of(err: PortalError) -> &'static str {
        match err {
            PortalError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_signup_validation_order() {
        let mut form = signup_form("not-an-email");
        form.phone = "123".to_string();
        assert_eq!(field_of(form.validate().unwrap_err()), "email");

        let mut form = signup_form("a@b.com");
        form.name = "J4ne".to_string();
        assert_eq!(field_of(form.validate().unwrap_err()), "name");

        let mut form = signup_form("a@b.com");
        form.phone = "1234567".to_string();
        assert_eq!(field_of(form.validate().unwrap_err()), "phone");

        let mut form = signup_form("a@b.com");
        form.account_no = "123456".to_string();
        assert_eq!(field_of(form.validate().unwrap_err()), "account_no");

        let mut form = signup_form("a@b.com");
        form.confirm_password = Some("different".to_string());
        let err = form.validate().unwrap_err();
        assert_eq!(err.to_string(), "Password and Confirm Password do not match.");

        let mut form = signup_form("a@b.com");
        form.confirm_password = None;
        assert!(form.validate().is_ok());
    }

    #[tokio::test]
    async fn test_signup_then_duplicate_email_warns() {
        let (_dir, portal) = portal("SHORT TERM").await;

        let user = portal.signup(&signup_form("a@b.com")).await.unwrap();
        assert_eq!(user.name, "Jane Doe");
        assert_ne!(user.password_hash, "correct horse");

        let err = portal.signup(&signup_form("a@b.com")).await.unwrap_err();
        assert!(matches!(err, PortalError::DuplicateEmail));
        assert_eq!(err.severity(), Severity::Warning);

        let err = portal.signup(&signup_form("A@B.com")).await.unwrap_err();
        assert!(matches!(err, PortalError::DuplicateEmail));

        let outcome = portal.login("A@B.COM", "correct horse").await.unwrap();
        assert_eq!(outcome.user.id, user.id);
    }

    #[tokio::test]
    async fn test_login_authenticate_logout() {
        let (_dir, portal) = portal("SHORT TERM").await;
        portal.signup(&signup_form("a@b.com")).await.unwrap();

        assert!(matches!(
            portal.login("a@b.com", "wrong").await,
            Err(PortalError::InvalidCredentials)
        ));
        assert!(matches!(
            portal.login("nobody@b.com", "correct horse").await,
            Err(PortalError::InvalidCredentials)
        ));

        let outcome = portal.login("a@b.com", "correct horse").await.unwrap();
        assert_eq!(outcome.welcome_message(), "Login successful! Welcome, Jane Doe!");

        let user = portal.authenticate(&outcome.token).await.unwrap();
        assert_eq!(user.email, "a@b.com");

        portal.logout(&outcome.token).await.unwrap();
        assert!(matches!(
            portal.authenticate(&outcome.token).await,
            Err(PortalError::NotLoggedIn)
        ));
    }

    #[tokio::test]
    async fn test_motorcycle_goes_to_reserved_band() {
        let (_dir, portal) = portal("season_W").await;
        let user = portal.signup(&signup_form("a@b.com")).await.unwrap();

        let assignment = portal.start_parking(&user, &park(VehicleType::M)).await.unwrap();
        assert!((481..=500).contains(&assignment.lot_no));
        assert_eq!(assignment.band, SlotBand::Motorcycle);
        assert_eq!(assignment.predicted_label, "season_W");

        let details = portal.show_details(user.id).await.unwrap();
        assert_eq!(details.lot_no, i64::from(assignment.lot_no));
        assert_eq!(details.vehicle_type, "M");
        assert_eq!(details.session_start, assignment.session_start);
    }

    #[tokio::test]
    async fn test_label_selects_band_for_cars() {
        let (_dir, season) = portal("season_W").await;
        let user = season.signup(&signup_form("a@b.com")).await.unwrap();
        let lot = season.start_parking(&user, &park(VehicleType::C)).await.unwrap().lot_no;
        assert!((1..=160).contains(&lot));

        let (_dir, short) = portal("SHORT TERM").await;
        let user = short.signup(&signup_form("a@b.com")).await.unwrap();
        let lot = short.start_parking(&user, &park(VehicleType::E)).await.unwrap().lot_no;
        assert!((161..=480).contains(&lot));
    }

    #[tokio::test]
    async fn test_unrecognized_label_stores_nothing() {
        let (_dir, portal) = portal("overnight").await;
        let user = portal.signup(&signup_form("a@b.com")).await.unwrap();

        let err = portal.start_parking(&user, &park(VehicleType::C)).await.unwrap_err();
        assert!(matches!(
            err,
            PortalError::Allocation(AllocationError::UnrecognizedLabel(ref l)) if l == "overnight"
        ));
        assert!(matches!(
            portal.show_details(user.id).await,
            Err(PortalError::NoActiveSession)
        ));

        // Motorcycles do not depend on the label
        let assignment = portal.start_parking(&user, &park(VehicleType::M)).await.unwrap();
        assert!(SlotBand::Motorcycle.contains(assignment.lot_no));
    }

    #[tokio::test]
    async fn test_second_start_parking_is_a_noop_warning() {
        let (_dir, portal) = portal("SHORT TERM").await;
        let user = portal.signup(&signup_form("a@b.com")).await.unwrap();

        let first = portal.start_parking(&user, &park(VehicleType::C)).await.unwrap();
        let err = portal.start_parking(&user, &park(VehicleType::M)).await.unwrap_err();
        assert!(matches!(err, PortalError::AlreadyParked));

        let details = portal.show_details(user.id).await.unwrap();
        assert_eq!(details.lot_no, i64::from(first.lot_no));
        assert_eq!(ParkingSession::count(&portal.db).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_start_parking_stores_one_session() {
        let (_dir, portal) = portal("SHORT TERM").await;
        let user = portal.signup(&signup_form("a@b.com")).await.unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let portal = Arc::clone(&portal);
                let user = user.clone();
                tokio::spawn(async move { portal.start_parking(&user, &park(VehicleType::C)).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(PortalError::AlreadyParked) => {}
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(ParkingSession::count(&portal.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_band_exhaustion_is_reported() {
        let (_dir, portal) = portal("SHORT TERM").await;

        let mut lots = std::collections::BTreeSet::new();
        for i in 0..SlotBand::Motorcycle.capacity() {
            let user = seed_user(&portal, &format!("rider{}@b.com", i)).await;
            let assignment = portal.start_parking(&user, &park(VehicleType::M)).await.unwrap();
            assert!(lots.insert(assignment.lot_no));
        }
        let expected: std::collections::BTreeSet<LotNumber> = SlotBand::Motorcycle.range().collect();
        assert_eq!(lots, expected);

        let late = seed_user(&portal, "late@b.com").await;
        let err = portal.start_parking(&late, &park(VehicleType::M)).await.unwrap_err();
        assert!(matches!(
            err,
            PortalError::Allocation(AllocationError::CapacityExhausted { band: SlotBand::Motorcycle })
        ));

        // Cars still fit elsewhere
        let car = portal.start_parking(&late, &park(VehicleType::C)).await.unwrap();
        assert!(SlotBand::ShortTerm.contains(car.lot_no));
    }

    #[tokio::test]
    async fn test_lot_taken_after_read_draws_again() {
        let (_dir, portal) = portal("SHORT TERM").await;

        // Another session takes 481 after our occupied set was read
        let rival = seed_user(&portal, "rival@b.com").await;
        let rival_session = NewParkingSession {
            user_id: rival.id,
            vehicle_type: "M".to_string(),
            predicted_label: "SHORT TERM".to_string(),
            lot_no: 481,
            duration: 1.0,
            total_charge: 1.0,
        };
        assert!(matches!(
            ParkingSession::insert(&portal.db, &rival_session).await.unwrap(),
            InsertOutcome::Inserted(_)
        ));

        // A stale view where 481 is the only free lot forces the first draw onto it
        let stale: std::collections::BTreeSet<LotNumber> = (482..=500).collect();

        let user = seed_user(&portal, "a@b.com").await;
        let assignment = portal
            .place_in_band(
                &user,
                &park(VehicleType::M),
                "SHORT TERM".to_string(),
                SlotBand::Motorcycle,
                stale,
            )
            .await
            .unwrap();

        assert_ne!(assignment.lot_no, 481);
        assert!(SlotBand::Motorcycle.contains(assignment.lot_no));

        let occupied = ParkingSession::list_occupied_slots(&portal.db).await.unwrap();
        assert_eq!(occupied.len(), 2);
        assert!(occupied.contains(&481));
        assert!(occupied.contains(&assignment.lot_no));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_requests_never_share_a_lot() {
        let (_dir, portal) = portal("SHORT TERM").await;

        // Leave exactly one motorcycle lot free
        for i in 0..SlotBand::Motorcycle.capacity() - 1 {
            let user = seed_user(&portal, &format!("rider{}@b.com", i)).await;
            portal.start_parking(&user, &park(VehicleType::M)).await.unwrap();
        }

        let a = seed_user(&portal, "a@b.com").await;
        let b = seed_user(&portal, "b@b.com").await;

        let pa = Arc::clone(&portal);
        let pb = Arc::clone(&portal);
        let ha = tokio::spawn(async move { pa.start_parking(&a, &park(VehicleType::M)).await });
        let hb = tokio::spawn(async move { pb.start_parking(&b, &park(VehicleType::M)).await });
        let results = [ha.await.unwrap(), hb.await.unwrap()];

        let won = results.iter().filter(|r| r.is_ok()).count();
        let exhausted = results
            .iter()
            .filter(|r| {
                matches!(
                    r,
                    Err(PortalError::Allocation(AllocationError::CapacityExhausted { .. }))
                )
            })
            .count();
        assert_eq!((won, exhausted), (1, 1));

        let occupied = ParkingSession::list_occupied_slots(&portal.db).await.unwrap();
        assert_eq!(occupied.len(), SlotBand::Motorcycle.capacity());
    }

    #[tokio::test]
    async fn test_check_capacity() {
        let (_dir, portal) = portal("SHORT TERM").await;

        let empty = portal.check_capacity().await.unwrap();
        assert_eq!(empty.summary(), "0.00% of Parking Lot is currently occupied.");

        let user = portal.signup(&signup_form("a@b.com")).await.unwrap();
        let assignment = portal.start_parking(&user, &park(VehicleType::M)).await.unwrap();

        let report = portal.check_capacity().await.unwrap();
        assert_eq!(report.occupied_lots, vec![assignment.lot_no]);
        assert_eq!(report.summary(), "0.20% of Parking Lot is currently occupied.");
    }

    #[tokio::test]
    async fn test_report_once_per_user() {
        let (_dir, portal) = portal("SHORT TERM").await;
        let user = portal.signup(&signup_form("a@b.com")).await.unwrap();

        let stored = portal.report_issue(user.id, &report(42)).await.unwrap();
        assert_eq!(stored.lot_no, 42);
        assert_eq!(stored.predicted_label, "season_W");

        let err = portal.report_issue(user.id, &report(43)).await.unwrap_err();
        assert!(matches!(err, PortalError::ReportAlreadySubmitted));
        assert_eq!(err.to_string(), "You have already submitted a report.");
    }

    #[tokio::test]
    async fn test_report_validation() {
        let (_dir, portal) = portal("SHORT TERM").await;
        let user = portal.signup(&signup_form("a@b.com")).await.unwrap();

        for lot in [0, 501, -3] {
            let err = portal.report_issue(user.id, &report(lot)).await.unwrap_err();
            assert_eq!(field_of(err), "lot_no");
        }

        let mut bad_label = report(10);
        bad_label.predicted_label = "overnight".to_string();
        let err = portal.report_issue(user.id, &bad_label).await.unwrap_err();
        assert_eq!(field_of(err), "predicted_label");

        // Rejected submissions do not use up the one allowed report
        assert!(portal.report_issue(user.id, &report(10)).await.is_ok());
    }

    #[tokio::test]
    async fn test_negative_inputs_rejected_before_inference() {
        let (_dir, portal) = portal("SHORT TERM").await;
        let user = portal.signup(&signup_form("a@b.com")).await.unwrap();

        let form = StartParkingForm {
            vehicle_type: VehicleType::C,
            total_charge: -1.0,
            duration: 2.0,
        };
        let err = portal.start_parking(&user, &form).await.unwrap_err();
        assert_eq!(field_of(err), "total_charge");
    }
}
