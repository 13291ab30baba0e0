//! Journal files and attachments

use aws_billing_core::models::{Attachment, BillingPeriod, JournalLine};
use aws_billing_core::{AppResult, BillingError};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::context::OrganizationReports;

pub const JSONL_MIME_TYPE: &str = "application/jsonl";
pub const ZIP_MIME_TYPE: &str = "application/zip";

pub const MARKETPLACE_USAGE_REPORT_FILE: &str = "MarketplaceUsageReport.json";
pub const ORGANIZATION_INVOICES_FILE: &str = "OrganizationInvoices.json";

pub fn journal_filename(authorization_id: &str, period: BillingPeriod) -> String {
    format!(
        "journal-{}-{}-{:02}.jsonl",
        authorization_id,
        period.year(),
        period.month()
    )
}

/// Newline-delimited JSON, one line per journal line
pub fn serialize_lines<'a>(lines: impl IntoIterator<Item = &'a JournalLine>) -> AppResult<Vec<u8>> {
    let mut content = String::new();
    for line in lines {
        content.push_str(&line.to_jsonl()?);
    }
    Ok(content.into_bytes())
}

/// Invalid lines of the journal, `None` when every line is valid
pub fn failed_lines_attachment(journal_id: &str, lines: &[JournalLine]) -> AppResult<Option<Attachment>> {
    let invalid: Vec<&JournalLine> = lines.iter().filter(|line| !line.is_valid()).collect();
    if invalid.is_empty() {
        return Ok(None);
    }

    Ok(Some(Attachment {
        filename: format!("failed-journal-lines-{}.jsonl", journal_id),
        mime_type: JSONL_MIME_TYPE.to_string(),
        name: "Failed journal lines".to_string(),
        description: format!("{} journal lines could not be reconciled", invalid.len()),
        content: serialize_lines(invalid)?,
    }))
}

/// Zip of the raw reports used to build the journal
pub fn reports_attachment(journal_id: &str, reports: &OrganizationReports) -> AppResult<Attachment> {
    Ok(Attachment {
        filename: format!("reports-{}.zip", journal_id),
        mime_type: ZIP_MIME_TYPE.to_string(),
        name: "AWS reports".to_string(),
        description: "Cost and usage reports used to generate the journal".to_string(),
        content: reports_archive(reports)?,
    })
}

/// `{account_id} - {report_type}.json` per account report, plus the MPA level
/// reports at the archive root
pub fn reports_archive(reports: &OrganizationReports) -> AppResult<Vec<u8>> {
    let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (account_id, account_reports) in &reports.accounts {
        for (report_type, report) in account_reports {
            let name = format!("{} - {}.json", account_id, report_type);
            add_json(&mut archive, name, options, &serde_json::to_vec_pretty(report)?)?;
        }
    }

    add_json(
        &mut archive,
        MARKETPLACE_USAGE_REPORT_FILE.to_string(),
        options,
        &serde_json::to_vec_pretty(&reports.marketplace_usage)?,
    )?;
    add_json(
        &mut archive,
        ORGANIZATION_INVOICES_FILE.to_string(),
        options,
        &serde_json::to_vec_pretty(&reports.organization_invoices)?,
    )?;

    let cursor = archive
        .finish()
        .map_err(|e| BillingError::Archive(e.to_string()))?;
    Ok(cursor.into_inner())
}

fn add_json(
    archive: &mut ZipWriter<Cursor<Vec<u8>>>,
    name: String,
    options: SimpleFileOptions,
    content: &[u8],
) -> AppResult<()> {
    archive
        .start_file(name, options)
        .map_err(|e| BillingError::Archive(e.to_string()))?;
    archive
        .write_all(content)
        .map_err(|e| BillingError::Archive(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_billing_core::models::{Group, JournalDetails, OrganizationInvoices, Report};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::io::Read;

    fn line(service: &str) -> JournalLine {
        let details = JournalDetails {
            agreement_id: "AGR-1".to_string(),
            mpa_id: "123456789012".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 5, 31).unwrap(),
            segment: "COM".to_string(),
        };
        JournalLine::new(&details, "210987654321", service, dec!(10))
    }

    #[test]
    fn test_journal_filename() {
        let period = BillingPeriod::new(2025, 3).unwrap();
        assert_eq!(journal_filename("AUT-1", period), "journal-AUT-1-2025-03.jsonl");
    }

    #[test]
    fn test_serialize_lines() {
        let lines = vec![line("Amazon EC2"), line("Amazon S3").with_error("unmatched")];
        let content = String::from_utf8(serialize_lines(&lines).unwrap()).unwrap();

        let rows: Vec<&str> = content.lines().collect();
        assert_eq!(rows.len(), 2);
        assert!(!rows[0].contains("\"error\""));
        assert!(rows[1].contains("\"error\":\"unmatched\""));
    }

    #[test]
    fn test_failed_lines_attachment_only_invalid() {
        let valid = vec![line("Amazon EC2")];
        assert!(failed_lines_attachment("BJO-1", &valid).unwrap().is_none());

        let lines = vec![line("Amazon EC2"), line("Amazon S3").with_error("unmatched")];
        let attachment = failed_lines_attachment("BJO-1", &lines).unwrap().unwrap();
        assert_eq!(attachment.filename, "failed-journal-lines-BJO-1.jsonl");
        assert_eq!(attachment.mime_type, JSONL_MIME_TYPE);
        let content = String::from_utf8(attachment.content).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("Amazon S3"));
    }

    #[test]
    fn test_reports_archive_layout() {
        let mut reports = OrganizationReports::default();
        reports
            .marketplace_usage
            .insert("123456789012".to_string(), Report::default());
        reports
            .organization_invoices
            .insert("123456789012".to_string(), OrganizationInvoices::default());
        reports.accounts.entry("210987654321".to_string()).or_default().insert(
            "CostByRecordTypeAndService".to_string(),
            Report::from_groups(vec![Group::unblended("Usage", "Amazon EC2", "1")]),
        );

        let attachment = reports_attachment("BJO-1", &reports).unwrap();
        assert_eq!(attachment.filename, "reports-BJO-1.zip");
        assert_eq!(attachment.mime_type, ZIP_MIME_TYPE);

        let mut archive = zip::ZipArchive::new(Cursor::new(attachment.content)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(String::from).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "210987654321 - CostByRecordTypeAndService.json",
                "MarketplaceUsageReport.json",
                "OrganizationInvoices.json",
            ]
        );

        let mut content = String::new();
        archive
            .by_name("MarketplaceUsageReport.json")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert!(value.get("123456789012").is_some());
    }
}
