//! Interactive text menu.

use crate::config::ClinicConfig;
use crate::models::NewPatient;
use crate::persistence::ClinicStore;
use crate::scheduler::{Scheduler, SchedulingError};
use crate::slot::SlotError;
use std::io::{self, BufRead, Write};
use tracing::error;

const MENU: &str = "\nMenu:
1. Add a new Patient
2. Make an appointment
3. View all appointments
4. Update an appointment
5. Delete an appointment
6. List all Patients
7. Exit";

/// What the loop should do after a menu choice.
enum Flow {
    Continue,
    Exit,
}

pub struct Menu<'a, R, W, S: ClinicStore + ?Sized> {
    input: R,
    output: W,
    store: &'a S,
    config: &'a ClinicConfig,
    line: String,
}

impl<'a, R: BufRead, W: Write, S: ClinicStore + ?Sized> Menu<'a, R, W, S> {
    pub fn new(input: R, output: W, store: &'a S, config: &'a ClinicConfig) -> Self {
        Self {
            input,
            output,
            store,
            config,
            line: String::new(),
        }
    }

    /// Runs until the operator picks Exit or input ends.
    pub fn run(&mut self) -> io::Result<()> {
        writeln!(self.output, "Welcome to the Clinic Scheduler")?;
        loop {
            writeln!(self.output, "{MENU}")?;
            let Some(choice) = self.prompt("Enter your choice: ")? else {
                writeln!(self.output)?;
                break;
            };
            let flow = match choice.as_str() {
                "1" => self.add_patient()?,
                "2" => self.make_appointment()?,
                "3" => self.view_appointments()?,
                "4" => self.update_appointment()?,
                "5" => self.delete_appointment()?,
                "6" => self.list_patients()?,
                "7" => {
                    writeln!(self.output, "Exiting the program. Goodbye!")?;
                    Flow::Exit
                }
                _ => {
                    writeln!(self.output, "Invalid choice. Please enter a valid option.")?;
                    Flow::Continue
                }
            };
            if let Flow::Exit = flow {
                break;
            }
        }
        self.output.flush()
    }

    fn scheduler(&self) -> Scheduler<'a, S> {
        Scheduler::new(self.store, self.config.business_hours)
    }

    /// Prints `label`, reads one line and returns it trimmed; `None` at end of input.
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{label}")?;
        self.output.flush()?;
        self.line.clear();
        if self.input.read_line(&mut self.line)? == 0 {
            return Ok(None);
        }
        Ok(Some(self.line.trim().to_string()))
    }

    fn prompt_id(&mut self, label: &str) -> io::Result<Option<i64>> {
        let Some(raw) = self.prompt(label)? else {
            return Ok(None);
        };
        match raw.parse::<i64>() {
            Ok(id) => Ok(Some(id)),
            Err(_) => {
                writeln!(self.output, "Invalid appointment ID '{raw}'.")?;
                Ok(None)
            }
        }
    }

    fn add_patient(&mut self) -> io::Result<Flow> {
        writeln!(self.output, "Add a new Patient:")?;
        let Some(name) = self.prompt("Enter patient's name: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(age) = self.prompt("Enter patient's age: ")? else {
            return Ok(Flow::Exit);
        };
        let age = match age.parse::<i64>() {
            Ok(age) => age,
            Err(_) => {
                writeln!(self.output, "Invalid age '{age}'. Please enter a whole number.")?;
                return Ok(Flow::Continue);
            }
        };
        let Some(gender) = self.prompt("Enter patient's gender M/F: ")? else {
            return Ok(Flow::Exit);
        };

        match self.store.add_patient(&NewPatient::new(name, age, gender)) {
            Ok(patient) => writeln!(
                self.output,
                "Patient added successfully (ID {}).",
                patient.patient_id
            )?,
            Err(e) => {
                error!("failed to add patient: {e}");
                writeln!(self.output, "Database error: {e}")?;
            }
        }
        Ok(Flow::Continue)
    }

    fn make_appointment(&mut self) -> io::Result<Flow> {
        writeln!(self.output, "Make an Appointment:")?;
        let Some(doctor) = self.prompt("Enter doctor's name: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(patient) = self.prompt("Enter patient's name: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(slot) = self.prompt("Enter appointment time slot (YYYY-MM-DD HH:MM): ")? else {
            return Ok(Flow::Exit);
        };

        match self.scheduler().make_appointment(&doctor, &patient, &slot) {
            Ok(appointment) => writeln!(
                self.output,
                "Appointment made successfully for {} (ID {}).",
                appointment.time_slot, appointment.appointment_id
            )?,
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn view_appointments(&mut self) -> io::Result<Flow> {
        writeln!(self.output, "View All Appointments:")?;
        match self.scheduler().view_all_appointments() {
            Ok(appointments) if appointments.is_empty() => {
                writeln!(self.output, "No appointments found.")?;
            }
            Ok(appointments) => {
                writeln!(self.output, "List of Appointments:")?;
                writeln!(self.output, "Appointment ID | Patient | Doctor | Time slot")?;
                for a in appointments {
                    writeln!(
                        self.output,
                        "{} | {} | {} | {}",
                        a.appointment_id, a.patient_name, a.doctor_name, a.time_slot
                    )?;
                }
            }
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn update_appointment(&mut self) -> io::Result<Flow> {
        writeln!(self.output, "Update an Appointment:")?;
        let Some(id) = self.prompt_id("Enter the ID of the appointment to update: ")? else {
            return Ok(Flow::Continue);
        };
        let Some(slot) =
            self.prompt("Enter the new time slot for the appointment (YYYY-MM-DD HH:MM): ")?
        else {
            return Ok(Flow::Exit);
        };

        match self.scheduler().update_appointment(id, &slot) {
            Ok(appointment) => writeln!(
                self.output,
                "Appointment updated successfully to {}.",
                appointment.time_slot
            )?,
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn delete_appointment(&mut self) -> io::Result<Flow> {
        writeln!(self.output, "Delete an Appointment:")?;
        let Some(id) = self.prompt_id("Enter the ID of the appointment to delete: ")? else {
            return Ok(Flow::Continue);
        };

        match self.scheduler().delete_appointment(id) {
            Ok(()) => writeln!(self.output, "Appointment deleted successfully.")?,
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn list_patients(&mut self) -> io::Result<Flow> {
        let Some(password) = self.prompt("Please enter your password: ")? else {
            return Ok(Flow::Exit);
        };
        if password != self.config.admin_password {
            writeln!(self.output, "Please enter the valid password.")?;
            return Ok(Flow::Continue);
        }

        match self.store.list_patients() {
            Ok(patients) if patients.is_empty() => writeln!(self.output, "No patients found.")?,
            Ok(patients) => {
                writeln!(self.output, "List of Patients:")?;
                writeln!(self.output, "Patient ID | Name | Age | gender")?;
                for p in patients {
                    writeln!(
                        self.output,
                        "{} | {} | {} | {}",
                        p.patient_id, p.name, p.age, p.gender
                    )?;
                }
            }
            Err(e) => {
                error!("failed to list patients: {e}");
                writeln!(self.output, "Database error: {e}")?;
            }
        }
        Ok(Flow::Continue)
    }

    fn report(&mut self, err: &SchedulingError) -> io::Result<()> {
        match err {
            SchedulingError::InvalidSlot(SlotError::Malformed { input, .. }) => writeln!(
                self.output,
                "Invalid time slot '{input}'. Please use the format YYYY-MM-DD HH:MM."
            ),
            SchedulingError::InvalidSlot(SlotError::OutsideBusinessHours { .. }) => writeln!(
                self.output,
                "You are trying to book an appointment outside of the normal working hours."
            ),
            SchedulingError::DoctorNotFound(_) => writeln!(self.output, "Doctor not found."),
            SchedulingError::PatientNotFound(_) => writeln!(self.output, "Patient not found."),
            SchedulingError::DoctorAndPatientNotFound { .. } => {
                writeln!(self.output, "Patient not found.")?;
                writeln!(self.output, "Doctor not found.")
            }
            SchedulingError::Conflict { .. } => writeln!(
                self.output,
                "An appointment already exists for the doctor at the specified time."
            ),
            SchedulingError::AppointmentNotFound(id) => {
                writeln!(self.output, "Appointment {id} not found.")
            }
            SchedulingError::Store(e) => {
                error!("store failure: {e}");
                writeln!(self.output, "Database error: {e}")
            }
        }
    }
}
