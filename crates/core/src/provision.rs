//! Schema provisioner.
//!
//! Creates the healthcare database and its six tables, then inserts the fixed sample rows.
//! Database and table creation are idempotent; seeding is not, so a second run adds duplicate
//! rows with fresh ids.
//!
//! Every function here returns a `ProvisionError` instead of exiting; the `medquery provision`
//! command is what turns those errors into a fatal process exit.

use crate::database::enable_foreign_keys;
use crate::error::{ProvisionError, ProvisionResult};
use crate::models::{AppointmentStatus, Gender};
use crate::schema::TABLES;
use crate::CoreConfig;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OpenFlags};
use std::fs;

struct SampleDoctor {
    first_name: &'static str,
    last_name: &'static str,
    specialization: &'static str,
    department_id: i64,
}

struct SamplePatient {
    first_name: &'static str,
    last_name: &'static str,
    dob: &'static str,
    gender: Gender,
    insurance_id: &'static str,
}

struct SampleAppointment {
    patient_id: i64,
    doctor_id: i64,
    appointment_date: &'static str,
    status: AppointmentStatus,
}

struct SampleRecord {
    patient_id: i64,
    doctor_id: i64,
    diagnosis: &'static str,
    prescription: &'static str,
    record_date: &'static str,
}

struct SampleLabResult {
    patient_id: i64,
    test_name: &'static str,
    test_date: &'static str,
    result_value: f64,
    reference_range: &'static str,
}

const SAMPLE_DEPARTMENTS: [&str; 3] = ["Cardiology", "Pediatrics", "Oncology"];

const SAMPLE_DOCTORS: [SampleDoctor; 3] = [
    SampleDoctor {
        first_name: "Emily",
        last_name: "White",
        specialization: "Cardiologist",
        department_id: 1,
    },
    SampleDoctor {
        first_name: "Raj",
        last_name: "Patel",
        specialization: "Pediatrician",
        department_id: 2,
    },
    SampleDoctor {
        first_name: "Sophia",
        last_name: "Lee",
        specialization: "Oncologist",
        department_id: 3,
    },
];

const SAMPLE_PATIENTS: [SamplePatient; 3] = [
    SamplePatient {
        first_name: "Alice",
        last_name: "Johnson",
        dob: "1990-05-15",
        gender: Gender::Female,
        insurance_id: "INS-12345",
    },
    SamplePatient {
        first_name: "Bob",
        last_name: "Smith",
        dob: "1985-12-22",
        gender: Gender::Male,
        insurance_id: "INS-67890",
    },
    SamplePatient {
        first_name: "Charlie",
        last_name: "Brown",
        dob: "2000-03-08",
        gender: Gender::Other,
        insurance_id: "INS-11223",
    },
];

const SAMPLE_APPOINTMENTS: [SampleAppointment; 2] = [
    SampleAppointment {
        patient_id: 1,
        doctor_id: 1,
        appointment_date: "2024-03-20 10:00:00",
        status: AppointmentStatus::Completed,
    },
    SampleAppointment {
        patient_id: 2,
        doctor_id: 2,
        appointment_date: "2024-03-21 14:30:00",
        status: AppointmentStatus::Scheduled,
    },
];

const SAMPLE_RECORDS: [SampleRecord; 2] = [
    SampleRecord {
        patient_id: 1,
        doctor_id: 1,
        diagnosis: "Hypertension Stage 1",
        prescription: "Lisinopril 10mg daily",
        record_date: "2024-03-20",
    },
    SampleRecord {
        patient_id: 2,
        doctor_id: 2,
        diagnosis: "Childhood Asthma",
        prescription: "Albuterol inhaler PRN",
        record_date: "2024-03-15",
    },
];

const SAMPLE_LAB_RESULTS: [SampleLabResult; 2] = [
    SampleLabResult {
        patient_id: 1,
        test_name: "Cholesterol Level",
        test_date: "2024-03-20",
        result_value: 210.5,
        reference_range: "<200 mg/dL",
    },
    SampleLabResult {
        patient_id: 2,
        test_name: "Peak Flow Rate",
        test_date: "2024-03-15",
        result_value: 350.0,
        reference_range: "300-500 L/min",
    },
];

/// Row counts inserted by one `seed_sample_data` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub departments: usize,
    pub doctors: usize,
    pub patients: usize,
    pub appointments: usize,
    pub medical_records: usize,
    pub lab_results: usize,
}

impl SeedSummary {
    pub fn total(&self) -> usize {
        self.departments
            + self.doctors
            + self.patients
            + self.appointments
            + self.medical_records
            + self.lab_results
    }
}

/// Creates the database if it does not exist yet and returns a connection to it.
///
/// The parent directory of the configured file is created when missing. Foreign-key
/// enforcement is switched on for the returned connection.
///
/// # Errors
///
/// Returns `ProvisionError::DatabaseDirCreation` or `ProvisionError::DatabaseOpen`.
pub fn ensure_database(cfg: &CoreConfig) -> ProvisionResult<Connection> {
    let path = cfg.database_path();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(ProvisionError::DatabaseDirCreation)?;
    }

    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(ProvisionError::DatabaseOpen)?;
    enable_foreign_keys(&conn).map_err(ProvisionError::DatabaseOpen)?;

    tracing::info!("Database ready at {}", path.display());
    Ok(conn)
}

/// Creates the six tables if absent, in foreign-key order, committing once at the end.
pub fn ensure_schema(conn: &mut Connection) -> ProvisionResult<()> {
    let tx = conn.transaction().map_err(ProvisionError::TableCreation)?;
    for table in TABLES {
        tx.execute(table.ddl, [])
            .map_err(ProvisionError::TableCreation)?;
        tracing::debug!("ensured table {}", table.name);
    }
    tx.commit().map_err(ProvisionError::TableCreation)?;

    tracing::info!("Tables created successfully");
    Ok(())
}

/// Inserts the fixed sample rows in one transaction.
///
/// Rows are inserted parents first (departments, doctors, patients) so that every foreign key
/// points at an existing row when its insert runs. The literal foreign-key values assume the
/// first run against empty tables; later runs still reference those first rows.
pub fn seed_sample_data(conn: &mut Connection) -> ProvisionResult<SeedSummary> {
    let mut summary = SeedSummary::default();
    let tx = conn.transaction().map_err(ProvisionError::SeedInsert)?;
    {
        let mut stmt = tx
            .prepare("INSERT INTO departments (name) VALUES (?1)")
            .map_err(ProvisionError::SeedInsert)?;
        for name in SAMPLE_DEPARTMENTS {
            summary.departments += stmt.execute([name]).map_err(ProvisionError::SeedInsert)?;
        }

        let mut stmt = tx
            .prepare(
                "INSERT INTO doctors (first_name, last_name, specialization, department_id)
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .map_err(ProvisionError::SeedInsert)?;
        for d in &SAMPLE_DOCTORS {
            summary.doctors += stmt
                .execute(params![
                    d.first_name,
                    d.last_name,
                    d.specialization,
                    d.department_id
                ])
                .map_err(ProvisionError::SeedInsert)?;
        }

        let mut stmt = tx
            .prepare(
                "INSERT INTO patients (first_name, last_name, dob, gender, insurance_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .map_err(ProvisionError::SeedInsert)?;
        for p in &SAMPLE_PATIENTS {
            summary.patients += stmt
                .execute(params![
                    p.first_name,
                    p.last_name,
                    parse_date(p.dob)?,
                    p.gender,
                    p.insurance_id
                ])
                .map_err(ProvisionError::SeedInsert)?;
        }

        let mut stmt = tx
            .prepare(
                "INSERT INTO appointments (patient_id, doctor_id, appointment_date, status)
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .map_err(ProvisionError::SeedInsert)?;
        for a in &SAMPLE_APPOINTMENTS {
            summary.appointments += stmt
                .execute(params![
                    a.patient_id,
                    a.doctor_id,
                    parse_timestamp(a.appointment_date)?,
                    a.status
                ])
                .map_err(ProvisionError::SeedInsert)?;
        }

        let mut stmt = tx
            .prepare(
                "INSERT INTO medical_records (patient_id, doctor_id, diagnosis, prescription, record_date)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .map_err(ProvisionError::SeedInsert)?;
        for r in &SAMPLE_RECORDS {
            summary.medical_records += stmt
                .execute(params![
                    r.patient_id,
                    r.doctor_id,
                    r.diagnosis,
                    r.prescription,
                    parse_date(r.record_date)?
                ])
                .map_err(ProvisionError::SeedInsert)?;
        }

        let mut stmt = tx
            .prepare(
                "INSERT INTO lab_results (patient_id, test_name, test_date, result_value, reference_range)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .map_err(ProvisionError::SeedInsert)?;
        for l in &SAMPLE_LAB_RESULTS {
            summary.lab_results += stmt
                .execute(params![
                    l.patient_id,
                    l.test_name,
                    parse_date(l.test_date)?,
                    l.result_value,
                    l.reference_range
                ])
                .map_err(ProvisionError::SeedInsert)?;
        }
    }
    tx.commit().map_err(ProvisionError::SeedInsert)?;

    tracing::info!("Sample data inserted successfully ({} rows)", summary.total());
    Ok(summary)
}

/// Runs the whole provisioner: database, schema and, when `seed` is set, the sample rows.
pub fn provision(cfg: &CoreConfig, seed: bool) -> ProvisionResult<Option<SeedSummary>> {
    let mut conn = ensure_database(cfg)?;
    ensure_schema(&mut conn)?;
    let summary = if seed {
        Some(seed_sample_data(&mut conn)?)
    } else {
        tracing::info!("Skipping sample data");
        None
    };
    Ok(summary)
}

fn parse_date(value: &'static str) -> ProvisionResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|source| ProvisionError::SeedValue { value, source })
}

fn parse_timestamp(value: &'static str) -> ProvisionResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .map_err(|source| ProvisionError::SeedValue { value, source })
}
