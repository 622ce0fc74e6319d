//! Report composition: merges a detection record and a narrative result
//! into a fixed-template text report.

use std::fmt::Write as _;
use std::path::Path;

use chrono::NaiveDate;

use crate::narrative::types::NarrativeResult;
use crate::records::DetectionRecord;

const RECOMMENDATIONS: &str = "\
- This is an automated analysis and should be reviewed by a healthcare professional
- Store this report with the image for future reference
- If anomalies were detected, prompt medical follow-up is recommended";

/// Composes the final report. Pure: identical inputs always produce
/// byte-identical text, which is why the date is an explicit argument.
pub fn compose_report(
    source: &Path,
    detection: &DetectionRecord,
    narrative: &NarrativeResult,
    date: NaiveDate,
) -> String {
    let file_name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string());

    let analysis = if narrative.analysis.is_empty() {
        "No AI analysis available."
    } else {
        narrative.analysis.as_str()
    };

    let mut report = String::new();
    let _ = writeln!(report, "# Medical Image Analysis Report");
    let _ = writeln!(report);
    let _ = writeln!(report, "## Image Information");
    let _ = writeln!(report, "- File: {}", file_name);
    let _ = writeln!(report, "- Analysis Date: {}", date.format("%Y-%m-%d"));
    let _ = writeln!(report);
    let _ = writeln!(report, "## Computer Vision Analysis");
    let _ = writeln!(
        report,
        "- Anomaly Detected: {}",
        if detection.has_anomaly { "Yes" } else { "No" }
    );
    let _ = writeln!(
        report,
        "- Confidence: {:.1}%",
        detection.confidence * 100.0
    );
    let _ = writeln!(report, "- Number of Regions: {}", detection.regions.len());
    let _ = writeln!(report);
    let _ = writeln!(report, "## AI Diagnostic Assistance");
    let _ = writeln!(report, "{}", analysis);
    let _ = writeln!(report);
    let _ = writeln!(report, "## Recommendations");
    let _ = writeln!(report, "{}", RECOMMENDATIONS);

    if let Some(failure) = &narrative.error {
        let _ = writeln!(report);
        let _ = writeln!(report, "## Error Information");
        let _ = writeln!(
            report,
            "- Error Type: {}: {}",
            failure.category.label(),
            failure.message
        );
        let _ = writeln!(
            report,
            "- Please ensure the image is appropriate for medical analysis and try again."
        );
    }

    report
}
