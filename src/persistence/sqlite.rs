use super::{BookingOutcome, ClinicStore, RescheduleOutcome, StoreResult};
use crate::models::{Appointment, AppointmentView, Doctor, NewDoctor, NewPatient, Patient};
use crate::slot::{TimeSlot, round_to_slot};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long a writer waits for another connection's lock before the
/// operation fails with `SQLITE_BUSY`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

fn same_slot(stored: &str, requested: &str, wanted: Option<TimeSlot>) -> bool {
    if stored == requested {
        return true;
    }
    match (wanted, round_to_slot(stored)) {
        (Some(wanted), Ok(stored)) => wanted == stored,
        _ => false,
    }
}

pub struct SqliteClinicStore {
    connection: Mutex<Connection>,
}

impl SqliteClinicStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> StoreResult<Self> {
        let connection = Connection::open(path.as_ref())?;
        connection.busy_timeout(BUSY_TIMEOUT)?;
        Self::initialize_schema(&connection)?;
        info!(path = %path.as_ref().display(), "opened clinic database");
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> StoreResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    // Foreign keys stay unenforced: deleting a patient or doctor leaves their
    // appointments in place.
    fn initialize_schema(connection: &Connection) -> StoreResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS Patients (
                patient_id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
                name TEXT,
                age INTEGER,
                gender TEXT
            );
            CREATE TABLE IF NOT EXISTS Doctors (
                doctor_id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
                name TEXT,
                specialty TEXT
            );
            CREATE TABLE IF NOT EXISTS Appointments (
                appointment_id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT UNIQUE,
                doctor_id INTEGER,
                patient_id INTEGER,
                time_slot DATETIME,
                FOREIGN KEY(doctor_id) REFERENCES Doctors(doctor_id),
                FOREIGN KEY(patient_id) REFERENCES Patients(patient_id)
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.connection.lock().expect("sqlite mutex poisoned")
    }

    fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
        Ok(Patient {
            patient_id: row.get(0)?,
            name: row.get(1)?,
            age: row.get(2)?,
            gender: row.get(3)?,
        })
    }

    fn doctor_from_row(row: &Row<'_>) -> rusqlite::Result<Doctor> {
        Ok(Doctor {
            doctor_id: row.get(0)?,
            name: row.get(1)?,
            specialty: row.get(2)?,
        })
    }

    fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
        Ok(Appointment {
            appointment_id: row.get(0)?,
            doctor_id: row.get(1)?,
            patient_id: row.get(2)?,
            time_slot: row.get(3)?,
        })
    }

    fn appointment_by_id(conn: &Connection, appointment_id: i64) -> StoreResult<Option<Appointment>> {
        let appointment = conn
            .query_row(
                "SELECT appointment_id, doctor_id, patient_id, time_slot
                 FROM Appointments WHERE appointment_id = ?1",
                params![appointment_id],
                Self::appointment_from_row,
            )
            .optional()?;
        Ok(appointment)
    }

    /// First appointment of `doctor_id` holding the same slot as `time_slot`,
    /// ignoring `exclude`.
    ///
    /// Stored slots are compared after rounding, so a row written as
    /// `2024-03-10 9:00` by older builds still occupies `2024-03-10 09:00`.
    /// Rows that do not parse only match on identical text.
    fn occupying_appointment(
        conn: &Connection,
        doctor_id: i64,
        time_slot: &str,
        exclude: Option<i64>,
    ) -> StoreResult<Option<Appointment>> {
        let wanted = round_to_slot(time_slot).ok();
        let mut stmt = conn.prepare(
            "SELECT appointment_id, doctor_id, patient_id, time_slot
             FROM Appointments
             WHERE doctor_id = ?1 AND (?2 IS NULL OR appointment_id != ?2)
             ORDER BY appointment_id",
        )?;
        let rows = stmt.query_map(params![doctor_id, exclude], Self::appointment_from_row)?;
        for row in rows {
            let appointment = row?;
            if same_slot(&appointment.time_slot, time_slot, wanted) {
                return Ok(Some(appointment));
            }
        }
        Ok(None)
    }

    fn first_id_by_name(conn: &Connection, sql: &str, entity: &str, name: &str) -> StoreResult<Option<i64>> {
        let mut stmt = conn.prepare(sql)?;
        let ids = stmt
            .query_map(params![name], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        if ids.len() > 1 {
            warn!(entity, name, chosen = ids[0], "name matches several rows; using the lowest id");
        }
        Ok(ids.first().copied())
    }

    fn count(conn: &Connection, sql: &str) -> StoreResult<i64> {
        Ok(conn.query_row(sql, [], |row| row.get(0))?)
    }
}

impl ClinicStore for SqliteClinicStore {
    fn add_patient(&self, patient: &NewPatient) -> StoreResult<Patient> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO Patients (name, age, gender) VALUES (?1, ?2, ?3)",
            params![patient.name, patient.age, patient.gender],
        )?;
        let patient_id = conn.last_insert_rowid();
        debug!(patient_id, "inserted patient");
        Ok(Patient {
            patient_id,
            name: patient.name.clone(),
            age: patient.age,
            gender: patient.gender.clone(),
        })
    }

    fn insert_patients(&self, patients: &[NewPatient]) -> StoreResult<usize> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("INSERT INTO Patients (name, age, gender) VALUES (?1, ?2, ?3)")?;
            for patient in patients {
                stmt.execute(params![patient.name, patient.age, patient.gender])?;
            }
        }
        tx.commit()?;
        Ok(patients.len())
    }

    fn get_patient(&self, patient_id: i64) -> StoreResult<Option<Patient>> {
        let conn = self.lock();
        let patient = conn
            .query_row(
                "SELECT patient_id, name, age, gender FROM Patients WHERE patient_id = ?1",
                params![patient_id],
                Self::patient_from_row,
            )
            .optional()?;
        Ok(patient)
    }

    fn list_patients(&self) -> StoreResult<Vec<Patient>> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT patient_id, name, age, gender FROM Patients ORDER BY patient_id")?;
        let patients = stmt
            .query_map([], Self::patient_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(patients)
    }

    fn update_patient(&self, patient_id: i64, patient: &NewPatient) -> StoreResult<bool> {
        let conn = self.lock();
        let changed = conn.execute(
            "UPDATE Patients SET name = ?1, age = ?2, gender = ?3 WHERE patient_id = ?4",
            params![patient.name, patient.age, patient.gender, patient_id],
        )?;
        Ok(changed > 0)
    }

    fn delete_patient(&self, patient_id: i64) -> StoreResult<bool> {
        let conn = self.lock();
        let changed = conn.execute("DELETE FROM Patients WHERE patient_id = ?1", params![patient_id])?;
        Ok(changed > 0)
    }

    fn find_patient_id_by_name(&self, name: &str) -> StoreResult<Option<i64>> {
        let conn = self.lock();
        Self::first_id_by_name(
            &conn,
            "SELECT patient_id FROM Patients WHERE name = ?1 ORDER BY patient_id LIMIT 2",
            "patient",
            name,
        )
    }

    fn count_patients(&self) -> StoreResult<i64> {
        let conn = self.lock();
        Self::count(&conn, "SELECT count(*) FROM Patients")
    }

    fn add_doctor(&self, doctor: &NewDoctor) -> StoreResult<Doctor> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO Doctors (name, specialty) VALUES (?1, ?2)",
            params![doctor.name, doctor.specialty],
        )?;
        let doctor_id = conn.last_insert_rowid();
        debug!(doctor_id, "inserted doctor");
        Ok(Doctor {
            doctor_id,
            name: doctor.name.clone(),
            specialty: doctor.specialty.clone(),
        })
    }

    fn insert_doctors(&self, doctors: &[NewDoctor]) -> StoreResult<usize> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("INSERT INTO Doctors (name, specialty) VALUES (?1, ?2)")?;
            for doctor in doctors {
                stmt.execute(params![doctor.name, doctor.specialty])?;
            }
        }
        tx.commit()?;
        Ok(doctors.len())
    }

    fn get_doctor(&self, doctor_id: i64) -> StoreResult<Option<Doctor>> {
        let conn = self.lock();
        let doctor = conn
            .query_row(
                "SELECT doctor_id, name, specialty FROM Doctors WHERE doctor_id = ?1",
                params![doctor_id],
                Self::doctor_from_row,
            )
            .optional()?;
        Ok(doctor)
    }

    fn list_doctors(&self) -> StoreResult<Vec<Doctor>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT doctor_id, name, specialty FROM Doctors ORDER BY doctor_id")?;
        let doctors = stmt
            .query_map([], Self::doctor_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(doctors)
    }

    fn update_doctor(&self, doctor_id: i64, doctor: &NewDoctor) -> StoreResult<bool> {
        let conn = self.lock();
        let changed = conn.execute(
            "UPDATE Doctors SET name = ?1, specialty = ?2 WHERE doctor_id = ?3",
            params![doctor.name, doctor.specialty, doctor_id],
        )?;
        Ok(changed > 0)
    }

    fn delete_doctor(&self, doctor_id: i64) -> StoreResult<bool> {
        let conn = self.lock();
        let changed = conn.execute("DELETE FROM Doctors WHERE doctor_id = ?1", params![doctor_id])?;
        Ok(changed > 0)
    }

    fn find_doctor_id_by_name(&self, name: &str) -> StoreResult<Option<i64>> {
        let conn = self.lock();
        Self::first_id_by_name(
            &conn,
            "SELECT doctor_id FROM Doctors WHERE name = ?1 ORDER BY doctor_id LIMIT 2",
            "doctor",
            name,
        )
    }

    fn count_doctors(&self) -> StoreResult<i64> {
        let conn = self.lock();
        Self::count(&conn, "SELECT count(*) FROM Doctors")
    }

    fn get_appointment(&self, appointment_id: i64) -> StoreResult<Option<Appointment>> {
        let conn = self.lock();
        Self::appointment_by_id(&conn, appointment_id)
    }

    fn appointment_at(&self, doctor_id: i64, time_slot: &str) -> StoreResult<Option<Appointment>> {
        let conn = self.lock();
        Self::occupying_appointment(&conn, doctor_id, time_slot, None)
    }

    fn book_appointment(
        &self,
        doctor_id: i64,
        patient_id: i64,
        time_slot: &str,
    ) -> StoreResult<BookingOutcome> {
        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if let Some(existing) = Self::occupying_appointment(&tx, doctor_id, time_slot, None)? {
            return Ok(BookingOutcome::Conflict { existing });
        }
        tx.execute(
            "INSERT INTO Appointments (doctor_id, patient_id, time_slot) VALUES (?1, ?2, ?3)",
            params![doctor_id, patient_id, time_slot],
        )?;
        let appointment_id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(BookingOutcome::Booked(Appointment {
            appointment_id,
            doctor_id,
            patient_id,
            time_slot: time_slot.to_string(),
        }))
    }

    fn reschedule_appointment(
        &self,
        appointment_id: i64,
        time_slot: &str,
    ) -> StoreResult<RescheduleOutcome> {
        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(current) = Self::appointment_by_id(&tx, appointment_id)? else {
            return Ok(RescheduleOutcome::NotFound);
        };
        if let Some(existing) =
            Self::occupying_appointment(&tx, current.doctor_id, time_slot, Some(appointment_id))?
        {
            return Ok(RescheduleOutcome::Conflict { existing });
        }
        tx.execute(
            "UPDATE Appointments SET time_slot = ?1 WHERE appointment_id = ?2",
            params![time_slot, appointment_id],
        )?;
        tx.commit()?;
        Ok(RescheduleOutcome::Rescheduled(Appointment {
            time_slot: time_slot.to_string(),
            ..current
        }))
    }

    fn delete_appointment(&self, appointment_id: i64) -> StoreResult<bool> {
        let conn = self.lock();
        let changed = conn.execute(
            "DELETE FROM Appointments WHERE appointment_id = ?1",
            params![appointment_id],
        )?;
        Ok(changed > 0)
    }

    fn list_appointment_views(&self) -> StoreResult<Vec<AppointmentView>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT Appointments.appointment_id,
                    Patients.name AS patient_name,
                    Doctors.name AS doctor_name,
                    Appointments.time_slot
             FROM Appointments
             INNER JOIN Patients ON Appointments.patient_id = Patients.patient_id
             INNER JOIN Doctors ON Appointments.doctor_id = Doctors.doctor_id
             ORDER BY Appointments.appointment_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(AppointmentView {
                    appointment_id: row.get(0)?,
                    patient_name: row.get(1)?,
                    doctor_name: row.get(2)?,
                    time_slot: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
