//! Table definitions of the healthcare dataset.
//!
//! `TABLES` is ordered so that every table appears after the tables its foreign keys reference;
//! the provisioner creates them in this order and the prompt lists them in the same order.

/// One table of the dataset.
#[derive(Debug, Clone, Copy)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub ddl: &'static str,
}

pub const DEPARTMENTS: TableDef = TableDef {
    name: "departments",
    columns: &["department_id", "name", "head_doctor_id"],
    ddl: "CREATE TABLE IF NOT EXISTS departments (
        department_id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT,
        head_doctor_id INTEGER
    )",
};

pub const DOCTORS: TableDef = TableDef {
    name: "doctors",
    columns: &[
        "doctor_id",
        "first_name",
        "last_name",
        "specialization",
        "department_id",
        "license_number",
        "phone",
    ],
    ddl: "CREATE TABLE IF NOT EXISTS doctors (
        doctor_id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT,
        last_name TEXT,
        specialization TEXT,
        department_id INTEGER REFERENCES departments(department_id),
        license_number TEXT,
        phone TEXT
    )",
};

pub const PATIENTS: TableDef = TableDef {
    name: "patients",
    columns: &[
        "patient_id",
        "first_name",
        "last_name",
        "dob",
        "gender",
        "phone",
        "insurance_id",
    ],
    ddl: "CREATE TABLE IF NOT EXISTS patients (
        patient_id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        dob TEXT NOT NULL,
        gender TEXT CHECK (gender IN ('Male', 'Female', 'Other')),
        phone TEXT,
        insurance_id TEXT
    )",
};

pub const APPOINTMENTS: TableDef = TableDef {
    name: "appointments",
    columns: &[
        "appointment_id",
        "patient_id",
        "doctor_id",
        "appointment_date",
        "status",
    ],
    ddl: "CREATE TABLE IF NOT EXISTS appointments (
        appointment_id INTEGER PRIMARY KEY AUTOINCREMENT,
        patient_id INTEGER REFERENCES patients(patient_id),
        doctor_id INTEGER REFERENCES doctors(doctor_id),
        appointment_date TEXT,
        status TEXT CHECK (status IN ('Scheduled', 'Completed', 'Cancelled'))
    )",
};

pub const MEDICAL_RECORDS: TableDef = TableDef {
    name: "medical_records",
    columns: &[
        "record_id",
        "patient_id",
        "doctor_id",
        "diagnosis",
        "prescription",
        "record_date",
    ],
    ddl: "CREATE TABLE IF NOT EXISTS medical_records (
        record_id INTEGER PRIMARY KEY AUTOINCREMENT,
        patient_id INTEGER REFERENCES patients(patient_id),
        doctor_id INTEGER REFERENCES doctors(doctor_id),
        diagnosis TEXT,
        prescription TEXT,
        record_date TEXT
    )",
};

pub const LAB_RESULTS: TableDef = TableDef {
    name: "lab_results",
    columns: &[
        "lab_id",
        "patient_id",
        "test_name",
        "test_date",
        "result_value",
        "reference_range",
    ],
    ddl: "CREATE TABLE IF NOT EXISTS lab_results (
        lab_id INTEGER PRIMARY KEY AUTOINCREMENT,
        patient_id INTEGER REFERENCES patients(patient_id),
        test_name TEXT,
        test_date TEXT,
        result_value REAL,
        reference_range TEXT
    )",
};

pub const TABLES: [TableDef; 6] = [
    DEPARTMENTS,
    DOCTORS,
    PATIENTS,
    APPOINTMENTS,
    MEDICAL_RECORDS,
    LAB_RESULTS,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_column_is_declared() {
        for table in TABLES {
            assert!(table.ddl.contains(&format!("EXISTS {} (", table.name)));
            for column in table.columns {
                assert!(
                    table.ddl.contains(&format!("{column} ")),
                    "{}.{} missing from DDL",
                    table.name,
                    column
                );
            }
        }
    }

    #[test]
    fn referenced_tables_come_first() {
        for (i, table) in TABLES.iter().enumerate() {
            for reference in table.ddl.split("REFERENCES ").skip(1) {
                let target = reference.split('(').next().unwrap_or_default();
                let pos = TABLES.iter().position(|t| t.name == target);
                assert!(
                    matches!(pos, Some(p) if p < i),
                    "{} references {} before it is created",
                    table.name,
                    target
                );
            }
        }
    }
}
