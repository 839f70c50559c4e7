use crate::models::{Appointment, AppointmentView, Doctor, NewDoctor, NewPatient, Patient};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of an atomic check-and-insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
    Booked(Appointment),
    /// The doctor already has `existing` at the requested slot; nothing was written.
    Conflict { existing: Appointment },
}

/// Result of an atomic check-and-update of an appointment's slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RescheduleOutcome {
    Rescheduled(Appointment),
    NotFound,
    Conflict { existing: Appointment },
}

/// Persistence for patients, doctors and appointments.
///
/// Every method is one self-contained unit of work: implementations acquire
/// their connection, run a single transaction and release it before
/// returning. `update_*` and `delete_*` report `Ok(false)` when no row has
/// the given id.
pub trait ClinicStore {
    fn add_patient(&self, patient: &NewPatient) -> StoreResult<Patient>;
    fn insert_patients(&self, patients: &[NewPatient]) -> StoreResult<usize>;
    fn get_patient(&self, patient_id: i64) -> StoreResult<Option<Patient>>;
    fn list_patients(&self) -> StoreResult<Vec<Patient>>;
    fn update_patient(&self, patient_id: i64, patient: &NewPatient) -> StoreResult<bool>;
    fn delete_patient(&self, patient_id: i64) -> StoreResult<bool>;
    /// Lowest matching id when several patients share a name.
    fn find_patient_id_by_name(&self, name: &str) -> StoreResult<Option<i64>>;
    fn count_patients(&self) -> StoreResult<i64>;

    fn add_doctor(&self, doctor: &NewDoctor) -> StoreResult<Doctor>;
    fn insert_doctors(&self, doctors: &[NewDoctor]) -> StoreResult<usize>;
    fn get_doctor(&self, doctor_id: i64) -> StoreResult<Option<Doctor>>;
    fn list_doctors(&self) -> StoreResult<Vec<Doctor>>;
    fn update_doctor(&self, doctor_id: i64, doctor: &NewDoctor) -> StoreResult<bool>;
    fn delete_doctor(&self, doctor_id: i64) -> StoreResult<bool>;
    /// Lowest matching id when several doctors share a name.
    fn find_doctor_id_by_name(&self, name: &str) -> StoreResult<Option<i64>>;
    fn count_doctors(&self) -> StoreResult<i64>;

    fn get_appointment(&self, appointment_id: i64) -> StoreResult<Option<Appointment>>;
    fn appointment_at(&self, doctor_id: i64, time_slot: &str) -> StoreResult<Option<Appointment>>;
    /// Inserts the booking unless the doctor already holds `time_slot`. The
    /// check and the insert happen in the same write transaction.
    fn book_appointment(
        &self,
        doctor_id: i64,
        patient_id: i64,
        time_slot: &str,
    ) -> StoreResult<BookingOutcome>;
    /// Moves an appointment to `time_slot` unless another appointment of the
    /// same doctor already holds it.
    fn reschedule_appointment(
        &self,
        appointment_id: i64,
        time_slot: &str,
    ) -> StoreResult<RescheduleOutcome>;
    fn delete_appointment(&self, appointment_id: i64) -> StoreResult<bool>;
    /// Appointments joined with patient and doctor names, in id order.
    /// Appointments whose patient or doctor row is gone are not listed.
    fn list_appointment_views(&self) -> StoreResult<Vec<AppointmentView>>;
}

pub mod seed;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use seed::{SeedSummary, read_doctors_csv, read_patients_csv, seed_from_csv};
