//! Entry form commands: init, list, save, delete, fields.

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::Result;
use census_core::{ServiceConfig, ServiceError};
use census_entry::{CensusRecord, CensusStore, EntryForm, Field, SubmitError, SubmitOutcome};

use crate::DraftArgs;

/// Open the configured database and mount the entry form on it.
fn open_form(config: &ServiceConfig) -> Result<EntryForm> {
    let store = Arc::new(CensusStore::open(config)?);
    Ok(EntryForm::mount(store)?)
}

/// clap value parser for the numeric-only inputs (lot, household number).
pub fn parse_numeric(s: &str) -> Result<String, String> {
    if s.chars().all(|c| c.is_ascii_digit()) {
        Ok(s.to_string())
    } else {
        Err(format!("\"{s}\" is not a number"))
    }
}

/// clap value parser for `--set FIELD=VALUE`.
pub fn parse_assignment(s: &str) -> Result<(Field, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got \"{s}\""))?;
    let field: Field = name.parse().map_err(|e: ServiceError| e.to_string())?;
    if field.is_numeric() {
        parse_numeric(value)?;
    }
    Ok((field, value.to_string()))
}

/// `{"code": ..., "message": ...}` for a failed command under `-o json`.
/// Errors that did not come from the census layers are reported as INTERNAL.
pub fn error_json(err: &anyhow::Error) -> serde_json::Value {
    let internal;
    let svc = match err.downcast_ref::<ServiceError>() {
        Some(e) => e,
        None => {
            internal = ServiceError::Internal(format!("{err:#}"));
            &internal
        }
    };
    serde_json::json!({
        "code": svc.error_code(),
        "message": svc.to_string(),
    })
}

pub fn init(config: &ServiceConfig) -> Result<()> {
    let form = open_form(config)?;
    println!(
        "Census database ready at {} ({} records).",
        config.resolve_sqlite_path().display(),
        form.records().len()
    );
    Ok(())
}

pub fn list(config: &ServiceConfig, output_json: bool) -> Result<()> {
    let form = open_form(config)?;
    print_records(form.records(), output_json)
}

/// Fill the draft from flags (and stdin if asked), then submit it.
pub fn save(
    config: &ServiceConfig,
    id: Option<i64>,
    args: &DraftArgs,
    prompt: bool,
    output_json: bool,
) -> Result<()> {
    let mut form = open_form(config)?;

    if let Some(id) = id {
        form.edit(id)?;
    }
    args.apply(form.draft_mut());

    if prompt {
        let stdin = std::io::stdin();
        prompt_missing(&mut form, &mut stdin.lock())?;
    }

    let editing = form.mode().editing_id();
    match form.submit() {
        Ok(outcome) => report(&form, outcome, output_json),
        Err(SubmitError::Validation(e)) => {
            let labels: Vec<&str> = e.missing.iter().map(|f| f.label()).collect();
            eprintln!("Missing: {}", labels.join(", "));
            Err(ServiceError::from(SubmitError::Validation(e)).into())
        }
        Err(SubmitError::Storage(e)) => {
            let msg = match editing {
                Some(id) => format!("failed to save census record {id}: {e}"),
                None => format!("failed to save census record: {e}"),
            };
            Err(ServiceError::Storage(msg).into())
        }
    }
}

/// Ask for each empty field on `input`. Numeric fields are asked again
/// until they hold only digits. Stops quietly at end of input.
fn prompt_missing(form: &mut EntryForm, input: &mut impl BufRead) -> Result<()> {
    let missing = form.draft().missing();
    for field in missing {
        loop {
            eprint!("{}: ", field.label());
            std::io::stderr().flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Ok(());
            }
            let value = line.trim();
            if field.is_numeric() {
                if let Err(msg) = parse_numeric(value) {
                    eprintln!("{msg}");
                    continue;
                }
            }
            form.set_field(field, value);
            break;
        }
    }
    Ok(())
}

fn report(form: &EntryForm, outcome: SubmitOutcome, output_json: bool) -> Result<()> {
    if output_json {
        println!("{}", serde_json::to_string_pretty(&saved_record(form, outcome))?);
        return Ok(());
    }

    match outcome {
        SubmitOutcome::Created(id) => println!("Census data created successfully with ID: {id}"),
        SubmitOutcome::Updated { id, rows_affected: 0 } => {
            eprintln!("Census record {id} no longer exists; nothing was changed.");
        }
        SubmitOutcome::Updated { id, .. } => println!("Census data updated successfully with ID: {id}"),
    }
    Ok(())
}

/// The record a submit wrote, as listed after the refresh.
/// `None` (JSON `null`) when an update matched no row.
fn saved_record(form: &EntryForm, outcome: SubmitOutcome) -> Option<&CensusRecord> {
    let id = match outcome {
        SubmitOutcome::Created(id) => id,
        SubmitOutcome::Updated { rows_affected: 0, .. } => return None,
        SubmitOutcome::Updated { id, .. } => id,
    };
    form.records().iter().find(|r| r.id == id)
}

pub fn delete(config: &ServiceConfig, id: i64) -> Result<()> {
    let store = CensusStore::open(config)?;
    store.initialize()?;
    if store.delete(id)? == 0 {
        return Err(ServiceError::NotFound(format!("Census record {id} not found.")).into());
    }
    println!("Census record {id} deleted.");
    Ok(())
}

pub fn fields() {
    println!("{:20} {:32} {:8}", "COLUMN", "LABEL", "NUMERIC");
    for field in Field::ALL {
        let numeric = if field.is_numeric() { "yes" } else { "" };
        println!("{:20} {:32} {:8}", field.column(), field.label(), numeric);
    }
}

fn print_records(records: &[CensusRecord], output_json: bool) -> Result<()> {
    if output_json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No census records.");
        return Ok(());
    }

    println!(
        "{:>5} {:16} {:16} {:6} {:8} {:8} {:12} {:6}",
        "ID", "PROVINCE", "DISTRICT", "WARD", "CU", "EA", "LOCALITY", "HH"
    );
    for r in records {
        let f = &r.fields;
        println!(
            "{:>5} {:16} {:16} {:6} {:8} {:8} {:12} {:6}",
            r.id, f.province, f.district, f.ward, f.census_unit, f.workload_no, f.locality,
            f.household_no
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_args() -> DraftArgs {
        DraftArgs {
            province: Some("Western".into()),
            district: Some("Kiunga".into()),
            llg: Some("Kiunga Urban".into()),
            ward: Some("1".into()),
            census_unit: Some("CU01".into()),
            census_unit_type: Some("Urban".into()),
            workload_no: Some("EA12".into()),
            locality: Some("Town".into()),
            section: Some("3".into()),
            structure_record_no: Some("045".into()),
            lot: Some("7".into()),
            household_no: Some("2".into()),
            set: Vec::new(),
        }
    }

    fn temp_config(dir: &tempfile::TempDir) -> ServiceConfig {
        ServiceConfig {
            data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn numeric_parser() {
        assert_eq!(parse_numeric("045").unwrap(), "045");
        assert_eq!(parse_numeric("").unwrap(), "");
        assert!(parse_numeric("4a").is_err());
        assert!(parse_numeric("-1").is_err());
    }

    #[test]
    fn assignment_parser() {
        assert_eq!(
            parse_assignment("censusUnit=CU01").unwrap(),
            (Field::CensusUnit, "CU01".to_string())
        );
        assert_eq!(
            parse_assignment("household_no=12").unwrap(),
            (Field::HouseholdNo, "12".to_string())
        );
        assert!(parse_assignment("lot=seven").is_err());
        assert!(parse_assignment("village=Kiunga").is_err());
        assert!(parse_assignment("province").is_err());
    }

    #[test]
    fn errors_render_with_stable_codes() {
        let not_found: anyhow::Error = ServiceError::NotFound("census record 3".into()).into();
        assert_eq!(
            error_json(&not_found),
            serde_json::json!({"code": "NOT_FOUND", "message": "census record 3"})
        );

        let other = anyhow::anyhow!("broken pipe");
        assert_eq!(error_json(&other)["code"], "INTERNAL");
        assert_eq!(error_json(&other)["message"], "broken pipe");
    }

    #[test]
    fn update_of_vanished_record_reports_null() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        save(&config, None, &full_args(), false, false).unwrap();

        let mut form = open_form(&config).unwrap();
        let record = form.records()[0].clone();
        CensusStore::open(&config).unwrap().delete(record.id).unwrap();

        form.edit_record(&record);
        let outcome = form.submit().unwrap();
        assert_eq!(outcome, SubmitOutcome::Updated { id: record.id, rows_affected: 0 });
        assert_eq!(serde_json::to_value(saved_record(&form, outcome)).unwrap(), serde_json::Value::Null);
    }

    #[test]
    fn created_record_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut form = open_form(&temp_config(&dir)).unwrap();
        full_args().apply(form.draft_mut());

        let outcome = form.submit().unwrap();
        let json = serde_json::to_value(saved_record(&form, outcome)).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["censusUnit"], "CU01");
    }

    #[test]
    fn save_create_then_edit() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);

        save(&config, None, &full_args(), false, false).unwrap();
        let edit = DraftArgs {
            household_no: Some("9".into()),
            ..Default::default()
        };
        save(&config, Some(1), &edit, false, true).unwrap();

        let form = open_form(&config).unwrap();
        assert_eq!(form.records().len(), 1);
        assert_eq!(form.records()[0].fields.household_no, "9");
        assert_eq!(form.records()[0].fields.province, "Western");
    }

    #[test]
    fn save_incomplete_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        let mut args = full_args();
        args.locality = None;

        let err = save(&config, None, &args, false, false).unwrap_err();
        assert_eq!(err.to_string(), "Please fill out all fields");
        assert_eq!(error_json(&err)["code"], "VALIDATION_FAILED");
        assert!(open_form(&config).unwrap().records().is_empty());
    }

    #[test]
    fn prompt_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut form = open_form(&temp_config(&dir)).unwrap();
        let mut args = full_args();
        args.section = None;
        args.lot = None;
        args.apply(form.draft_mut());

        // "x" is refused for the numeric lot and asked again.
        let mut input = std::io::Cursor::new("12\nx\n8\n");
        prompt_missing(&mut form, &mut input).unwrap();

        assert_eq!(form.draft().section, "12");
        assert_eq!(form.draft().lot, "8");
        assert!(form.draft().is_complete());
    }

    #[test]
    fn delete_missing_record_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        save(&config, None, &full_args(), false, false).unwrap();

        delete(&config, 1).unwrap();
        let err = delete(&config, 1).unwrap_err();
        assert_eq!(error_json(&err)["code"], "NOT_FOUND");
    }
}
