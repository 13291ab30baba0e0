//! Billing journal endpoints

use async_trait::async_trait;
use aws_billing_core::models::{Attachment, Journal, NewJournal, UploadedAttachment};
use aws_billing_core::traits::JournalClient;
use aws_billing_core::{AppResult, BillingError};
use reqwest::multipart::{Form, Part};
use tracing::{info, instrument};

use super::client::{MptClient, MptError};
use super::types::AttachmentMetadata;

const JOURNALS_PATH: &str = "billing/journals";
const JOURNAL_FILE_MIME_TYPE: &str = "application/jsonl";

fn ledger_error(err: MptError) -> BillingError {
    BillingError::Ledger(err.to_string())
}

fn file_part(content: Vec<u8>, filename: &str, mime_type: &str) -> Result<Part, MptError> {
    Part::bytes(content)
        .file_name(filename.to_string())
        .mime_str(mime_type)
        .map_err(|e| MptError::Config(format!("Invalid mime type {}: {}", mime_type, e)))
}

#[async_trait]
impl JournalClient for MptClient {
    #[instrument(skip(self))]
    async fn query(&self, rql: &str) -> AppResult<Vec<Journal>> {
        self.collect(JOURNALS_PATH, rql).await.map_err(ledger_error)
    }

    #[instrument(skip(self, journal), fields(name = %journal.name))]
    async fn create(&self, journal: &NewJournal) -> AppResult<Journal> {
        let created: Journal = self.post(JOURNALS_PATH, journal).await.map_err(ledger_error)?;
        info!("Journal {} created", created.id);
        Ok(created)
    }

    #[instrument(skip(self, file))]
    async fn upload(&self, journal_id: &str, file: Vec<u8>, filename: &str) -> AppResult<()> {
        let form = Form::new().part(
            "file",
            file_part(file, filename, JOURNAL_FILE_MIME_TYPE).map_err(ledger_error)?,
        );
        self.post_multipart_empty(&format!("{}/{}/upload", JOURNALS_PATH, journal_id), form)
            .await
            .map_err(ledger_error)
    }

    #[instrument(skip(self, attachment), fields(filename = %attachment.filename))]
    async fn upload_attachment(
        &self,
        journal_id: &str,
        attachment: Attachment,
    ) -> AppResult<UploadedAttachment> {
        let metadata = serde_json::to_string(&AttachmentMetadata {
            name: &attachment.name,
            description: &attachment.description,
        })?;
        let file = file_part(attachment.content, &attachment.filename, &attachment.mime_type)
            .map_err(ledger_error)?;
        let form = Form::new().text("attachment", metadata).part("file", file);

        self.post_multipart(&format!("{}/{}/attachments", JOURNALS_PATH, journal_id), form)
            .await
            .map_err(ledger_error)
    }
}
