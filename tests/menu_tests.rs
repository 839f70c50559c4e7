#![cfg(feature = "sqlite")]

use clinic_scheduler::{ClinicConfig, ClinicStore, Menu, NewDoctor, NewPatient, SqliteClinicStore};
use std::io::Cursor;

fn clinic() -> SqliteClinicStore {
    let store = SqliteClinicStore::in_memory().unwrap();
    store
        .add_doctor(&NewDoctor::new("Dr. Smith", "Cardiology"))
        .unwrap();
    store
        .add_patient(&NewPatient::new("John Doe", 40, "M"))
        .unwrap();
    store
}

fn run_menu(store: &SqliteClinicStore, script: &str) -> String {
    let config = ClinicConfig::default();
    let mut output = Vec::new();
    Menu::new(Cursor::new(script.as_bytes()), &mut output, store, &config)
        .run()
        .expect("menu runs");
    String::from_utf8(output).unwrap()
}

#[test]
fn exit_says_goodbye() {
    let store = clinic();
    let output = run_menu(&store, "7\n");
    assert!(output.starts_with("Welcome to the Clinic Scheduler"));
    assert!(output.contains("Exiting the program. Goodbye!"));
}

#[test]
fn end_of_input_ends_the_loop() {
    let store = clinic();
    let output = run_menu(&store, "");
    assert!(output.contains("Enter your choice: "));
    assert!(!output.contains("Goodbye"));
}

#[test]
fn add_patient_then_list_with_password() {
    let store = clinic();
    let output = run_menu(&store, "1\nMary Major\n52\nF\n6\nwilliam\n7\n");
    assert!(output.contains("Patient added successfully (ID 2)."));
    assert!(output.contains("Patient ID | Name | Age | gender"));
    assert!(output.contains("2 | Mary Major | 52 | F"));
}

#[test]
fn wrong_password_hides_patients() {
    let store = clinic();
    let output = run_menu(&store, "6\nguess\n7\n");
    assert!(output.contains("Please enter the valid password."));
    assert!(!output.contains("John Doe"));
}

#[test]
fn invalid_age_returns_to_menu() {
    let store = clinic();
    let output = run_menu(&store, "1\nKid\nten\n7\n");
    assert!(output.contains("Invalid age 'ten'. Please enter a whole number."));
    assert_eq!(store.count_patients().unwrap(), 1);
    assert!(output.contains("Goodbye"));
}

#[test]
fn booking_outcomes_are_distinguishable() {
    let store = clinic();
    let script = concat!(
        "2\nDr. Smith\nJohn Doe\n2024-03-10 10:50\n",
        "2\nDr. Smith\nJohn Doe\n2024-03-10 11:10\n",
        "2\nDr. Smith\nJohn Doe\n2024-03-10 17:10\n",
        "2\nDr. Nobody\nJohn Doe\n2024-03-10 10:00\n",
        "2\nDr. Nobody\nNo One\n2024-03-10 10:00\n",
        "2\nDr. Smith\nJohn Doe\nnext tuesday\n",
        "7\n",
    );
    let output = run_menu(&store, script);

    assert!(output.contains("Appointment made successfully for 2024-03-10 11:00 (ID 1)."));
    assert!(output.contains("An appointment already exists for the doctor at the specified time."));
    assert!(output.contains("outside of the normal working hours"));
    assert_eq!(output.matches("Doctor not found.").count(), 2);
    assert_eq!(output.matches("Patient not found.").count(), 1);
    assert!(output.contains("Invalid time slot 'next tuesday'."));
}

#[test]
fn view_update_and_delete_appointments() {
    let store = clinic();
    let script = concat!(
        "3\n",
        "2\nDr. Smith\nJohn Doe\n2024-03-10 09:00\n",
        "4\n1\n2024-03-10 14:20\n",
        "3\n",
        "4\n77\n2024-03-10 10:00\n",
        "5\nabc\n",
        "5\n1\n",
        "5\n1\n",
        "7\n",
    );
    let output = run_menu(&store, script);

    assert!(output.contains("No appointments found."));
    assert!(output.contains("Appointment updated successfully to 2024-03-10 14:30."));
    assert!(output.contains("1 | John Doe | Dr. Smith | 2024-03-10 14:30"));
    assert!(output.contains("Appointment 77 not found."));
    assert!(output.contains("Invalid appointment ID 'abc'."));
    assert_eq!(output.matches("Appointment deleted successfully.").count(), 1);
    assert!(output.contains("Appointment 1 not found."));
}

#[test]
fn unknown_choice_is_reported() {
    let store = clinic();
    let output = run_menu(&store, "9\n7\n");
    assert!(output.contains("Invalid choice. Please enter a valid option."));
}
