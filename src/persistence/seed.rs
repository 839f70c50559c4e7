use super::{ClinicStore, StoreError, StoreResult};
use crate::models::{NewDoctor, NewPatient};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub patients_loaded: usize,
    pub doctors_loaded: usize,
}

#[derive(Deserialize)]
struct PatientCsvRecord {
    name: String,
    age: String,
    gender: String,
}

impl PatientCsvRecord {
    fn into_patient(self, row: usize) -> StoreResult<NewPatient> {
        let age = self.age.trim().parse::<i64>().map_err(|e| {
            StoreError::InvalidData(format!(
                "patients row {row}: invalid age '{}': {e}",
                self.age
            ))
        })?;
        Ok(NewPatient::new(self.name, age, self.gender))
    }
}

#[derive(Deserialize)]
struct DoctorCsvRecord {
    name: String,
    specialty: String,
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Reads `name,age,gender` rows. Row numbers in errors count data rows from 1.
pub fn read_patients_csv<R: Read>(reader: R) -> StoreResult<Vec<NewPatient>> {
    let mut reader = csv_reader(reader);
    let mut patients = Vec::new();
    for (idx, record) in reader.deserialize::<PatientCsvRecord>().enumerate() {
        patients.push(record?.into_patient(idx + 1)?);
    }
    Ok(patients)
}

/// Reads `name,specialty` rows.
pub fn read_doctors_csv<R: Read>(reader: R) -> StoreResult<Vec<NewDoctor>> {
    let mut reader = csv_reader(reader);
    let mut doctors = Vec::new();
    for record in reader.deserialize::<DoctorCsvRecord>() {
        let record = record?;
        doctors.push(NewDoctor::new(record.name, record.specialty));
    }
    Ok(doctors)
}

fn open_seed_file(path: &Path, table: &str) -> StoreResult<Option<File>> {
    match File::open(path) {
        Ok(file) => Ok(Some(file)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!(table, path = %path.display(), "table is empty and seed file is missing; skipping");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// Loads patients and doctors from CSV, each only if its table is empty.
pub fn seed_from_csv<S, P, D>(store: &S, patients_csv: P, doctors_csv: D) -> StoreResult<SeedSummary>
where
    S: ClinicStore + ?Sized,
    P: AsRef<Path>,
    D: AsRef<Path>,
{
    let mut summary = SeedSummary::default();

    if store.count_patients()? == 0 {
        if let Some(file) = open_seed_file(patients_csv.as_ref(), "Patients")? {
            let patients = read_patients_csv(file)?;
            summary.patients_loaded = store.insert_patients(&patients)?;
            info!(count = summary.patients_loaded, "seeded Patients");
        }
    }

    if store.count_doctors()? == 0 {
        if let Some(file) = open_seed_file(doctors_csv.as_ref(), "Doctors")? {
            let doctors = read_doctors_csv(file)?;
            summary.doctors_loaded = store.insert_doctors(&doctors)?;
            info!(count = summary.doctors_loaded, "seeded Doctors");
        }
    }

    Ok(summary)
}
