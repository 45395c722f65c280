//! CSV export of a form's submissions

use std::collections::BTreeSet;

use crate::domain::{answer_to_text, FormField, Submission};
use crate::error::{FormdeskError, Result};

/// Render submissions as CSV.
///
/// Columns are `submission_id`, `submitted_at`, then one per field label in
/// display order. Answers under labels no field carries any more (renamed or
/// deleted fields) are appended as extra columns, alphabetically, so no data
/// is silently dropped. Rows are written in the order given.
pub fn submissions_to_csv(fields: &[FormField], submissions: &[Submission]) -> Result<String> {
    let labels: Vec<&str> = fields.iter().map(|f| f.label.as_str()).collect();
    let extra: BTreeSet<&str> = submissions
        .iter()
        .flat_map(|s| s.data.keys())
        .map(String::as_str)
        .filter(|key| !labels.contains(key))
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["submission_id", "submitted_at"];
    header.extend(labels.iter().copied());
    header.extend(extra.iter().copied());
    writer.write_record(&header).map_err(csv_error)?;

    for submission in submissions {
        let mut record = vec![
            submission.id.to_string(),
            submission.created_at.to_rfc3339(),
        ];
        for label in labels.iter().chain(extra.iter()) {
            record.push(submission.answer(label).map(answer_to_text).unwrap_or_default());
        }
        writer.write_record(&record).map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| FormdeskError::Internal(format!("csv flush failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| FormdeskError::Internal(format!("csv is not utf-8: {}", e)))
}

fn csv_error(e: csv::Error) -> FormdeskError {
    FormdeskError::Internal(format!("csv write failed: {}", e))
}
