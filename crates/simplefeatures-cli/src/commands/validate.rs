//! Validate command implementation

use crate::cli::ValidateArgs;
use crate::document::read_table;
use crate::output::OutputWriter;
use crate::output_types::{IssueRow, ValidateOutput};
use anyhow::{Context, Result};
use simplefeatures_geo::{validate_table, ValidityMode};

pub fn execute(args: ValidateArgs, output: &OutputWriter) -> Result<()> {
    let table = read_table(&args.input)?;
    let mode = if args.strict { ValidityMode::Strict } else { ValidityMode::Lenient };

    let report = validate_table(&table, mode)
        .with_context(|| format!("Validation of {} failed", args.input.display()))?;

    let valid = report.is_valid();
    let invalid_rows = report.invalid_rows();
    let issues: Vec<IssueRow> = report
        .issues
        .into_iter()
        .map(|issue| IssueRow { row: issue.row, location: issue.location, reason: issue.reason })
        .collect();

    if output.is_json() {
        output.result(ValidateOutput {
            valid,
            rows_checked: report.rows_checked,
            invalid_rows,
            issues,
        })?;
        return Ok(());
    }

    if valid {
        output.success(format!("All {} geometries are valid", report.rows_checked));
    } else {
        output.warning(format!(
            "{} of {} rows have invalid geometries",
            invalid_rows, report.rows_checked
        ));
        output.table(issues);
    }

    Ok(())
}
