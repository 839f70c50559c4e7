pub mod config;
pub mod menu;
pub mod models;
pub mod persistence;
pub mod scheduler;
pub mod slot;

pub use config::{ClinicConfig, ConfigError};
pub use menu::Menu;
pub use models::{Appointment, AppointmentView, Doctor, NewDoctor, NewPatient, Patient};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteClinicStore;
pub use persistence::{
    BookingOutcome, ClinicStore, RescheduleOutcome, SeedSummary, StoreError, seed_from_csv,
};
pub use scheduler::{ErrorKind, Scheduler, SchedulingError};
pub use slot::{BusinessHours, SlotError, TimeSlot, normalize_slot, round_to_slot};
