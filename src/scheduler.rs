//! Booking, rescheduling and cancelling appointments.

use crate::models::{Appointment, AppointmentView};
use crate::persistence::{BookingOutcome, ClinicStore, RescheduleOutcome, StoreError};
use crate::slot::{BusinessHours, SlotError, TimeSlot, normalize_slot};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Coarse category of a [`SchedulingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedSlotInput,
    BusinessHoursViolation,
    DoctorNotFound,
    PatientNotFound,
    AppointmentConflict,
    AppointmentNotFound,
    StoreFailure,
}

#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error(transparent)]
    InvalidSlot(#[from] SlotError),
    #[error("doctor '{0}' not found")]
    DoctorNotFound(String),
    #[error("patient '{0}' not found")]
    PatientNotFound(String),
    #[error("doctor '{doctor}' and patient '{patient}' not found")]
    DoctorAndPatientNotFound { doctor: String, patient: String },
    #[error("doctor {doctor_id} already has appointment {existing_id} at {time_slot}")]
    Conflict {
        doctor_id: i64,
        time_slot: String,
        existing_id: i64,
    },
    #[error("appointment {0} not found")]
    AppointmentNotFound(i64),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SchedulingError {
    /// For the combined not-found case this reports the doctor; use
    /// [`SchedulingError::missing_doctor`] and [`SchedulingError::missing_patient`]
    /// to see both.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchedulingError::InvalidSlot(SlotError::Malformed { .. }) => ErrorKind::MalformedSlotInput,
            SchedulingError::InvalidSlot(SlotError::OutsideBusinessHours { .. }) => {
                ErrorKind::BusinessHoursViolation
            }
            SchedulingError::DoctorNotFound(_) | SchedulingError::DoctorAndPatientNotFound { .. } => {
                ErrorKind::DoctorNotFound
            }
            SchedulingError::PatientNotFound(_) => ErrorKind::PatientNotFound,
            SchedulingError::Conflict { .. } => ErrorKind::AppointmentConflict,
            SchedulingError::AppointmentNotFound(_) => ErrorKind::AppointmentNotFound,
            SchedulingError::Store(_) => ErrorKind::StoreFailure,
        }
    }

    pub fn missing_doctor(&self) -> bool {
        matches!(
            self,
            SchedulingError::DoctorNotFound(_) | SchedulingError::DoctorAndPatientNotFound { .. }
        )
    }

    pub fn missing_patient(&self) -> bool {
        matches!(
            self,
            SchedulingError::PatientNotFound(_) | SchedulingError::DoctorAndPatientNotFound { .. }
        )
    }
}

pub type SchedulingResult<T> = Result<T, SchedulingError>;

/// Appointment operations over a borrowed store.
pub struct Scheduler<'a, S: ClinicStore + ?Sized> {
    store: &'a S,
    hours: BusinessHours,
}

impl<'a, S: ClinicStore + ?Sized> Scheduler<'a, S> {
    pub fn new(store: &'a S, hours: BusinessHours) -> Self {
        Self { store, hours }
    }

    pub fn business_hours(&self) -> BusinessHours {
        self.hours
    }

    pub fn normalize(&self, requested: &str) -> SchedulingResult<TimeSlot> {
        Ok(normalize_slot(requested, &self.hours)?)
    }

    /// Books `patient_name` with `doctor_name` at the slot nearest to
    /// `requested`.
    ///
    /// Both names are looked up first, but slot errors take precedence over
    /// not-found: a request outside business hours reports that even when a
    /// name is unknown.
    pub fn make_appointment(
        &self,
        doctor_name: &str,
        patient_name: &str,
        requested: &str,
    ) -> SchedulingResult<Appointment> {
        let doctor_id = self.store.find_doctor_id_by_name(doctor_name)?;
        let patient_id = self.store.find_patient_id_by_name(patient_name)?;
        let slot = self.normalize(requested)?;

        let (doctor_id, patient_id) = match (doctor_id, patient_id) {
            (Some(doctor_id), Some(patient_id)) => (doctor_id, patient_id),
            (None, Some(_)) => return Err(SchedulingError::DoctorNotFound(doctor_name.to_string())),
            (Some(_), None) => {
                return Err(SchedulingError::PatientNotFound(patient_name.to_string()));
            }
            (None, None) => {
                return Err(SchedulingError::DoctorAndPatientNotFound {
                    doctor: doctor_name.to_string(),
                    patient: patient_name.to_string(),
                });
            }
        };

        let time_slot = slot.to_string();
        debug!(doctor_id, patient_id, %time_slot, "booking appointment");
        match self.store.book_appointment(doctor_id, patient_id, &time_slot)? {
            BookingOutcome::Booked(appointment) => {
                info!(
                    appointment_id = appointment.appointment_id,
                    doctor_id,
                    patient_id,
                    %time_slot,
                    "appointment booked"
                );
                Ok(appointment)
            }
            BookingOutcome::Conflict { existing } => {
                warn!(doctor_id, %time_slot, existing_id = existing.appointment_id, "slot already taken");
                Err(SchedulingError::Conflict {
                    doctor_id,
                    time_slot,
                    existing_id: existing.appointment_id,
                })
            }
        }
    }

    /// Moves an appointment to the slot nearest to `requested`. The new slot
    /// must be free for the appointment's doctor.
    pub fn update_appointment(
        &self,
        appointment_id: i64,
        requested: &str,
    ) -> SchedulingResult<Appointment> {
        let time_slot = self.normalize(requested)?.to_string();
        match self.store.reschedule_appointment(appointment_id, &time_slot)? {
            RescheduleOutcome::Rescheduled(appointment) => {
                info!(appointment_id, %time_slot, "appointment rescheduled");
                Ok(appointment)
            }
            RescheduleOutcome::NotFound => {
                warn!(appointment_id, "reschedule target not found");
                Err(SchedulingError::AppointmentNotFound(appointment_id))
            }
            RescheduleOutcome::Conflict { existing } => {
                warn!(appointment_id, %time_slot, existing_id = existing.appointment_id, "slot already taken");
                Err(SchedulingError::Conflict {
                    doctor_id: existing.doctor_id,
                    time_slot,
                    existing_id: existing.appointment_id,
                })
            }
        }
    }

    pub fn delete_appointment(&self, appointment_id: i64) -> SchedulingResult<()> {
        if self.store.delete_appointment(appointment_id)? {
            info!(appointment_id, "appointment deleted");
            Ok(())
        } else {
            warn!(appointment_id, "delete target not found");
            Err(SchedulingError::AppointmentNotFound(appointment_id))
        }
    }

    pub fn view_all_appointments(&self) -> SchedulingResult<Vec<AppointmentView>> {
        Ok(self.store.list_appointment_views()?)
    }
}
