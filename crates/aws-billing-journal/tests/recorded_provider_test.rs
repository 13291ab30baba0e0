//! Generation against recorded AWS snapshots on disk

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use aws_billing_clients::{LogNotifier, SnapshotProviderFactory};
    use aws_billing_core::config::BillingConfig;
    use aws_billing_core::models::{
        Agreement, Attachment, Authorization, BillingPeriod, ItemRef, Journal, JournalLine,
        JournalStatus, NewJournal, Parameter, Parameters, Subscription, SubscriptionLine,
        SubscriptionStatus, UploadedAttachment, VendorIds,
    };
    use aws_billing_core::traits::{CommerceClient, JournalClient};
    use aws_billing_core::AppResult;
    use aws_billing_journal::{
        journal_processors, AuthorizationOutcome, BillingJournalGenerator, Collaborators,
        Notifications,
    };
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    const MPA: &str = "123456789012";
    const ACCOUNT: &str = "210987654321";
    const ENTITY: &str = "Amazon Web Services EMEA SARL";

    struct StaticCommerce {
        agreements: Vec<Agreement>,
    }

    #[async_trait]
    impl CommerceClient for StaticCommerce {
        async fn get_authorizations(&self, _rql: &str) -> AppResult<Option<Vec<Authorization>>> {
            Ok(Some(vec![Authorization {
                id: "AUT-1".to_string(),
                name: None,
                currency: "EUR".to_string(),
                external_ids: VendorIds::default(),
                product: None,
            }]))
        }

        async fn get_agreements_by_query(&self, _rql: &str) -> AppResult<Vec<Agreement>> {
            Ok(self.agreements.clone())
        }
    }

    #[derive(Default)]
    struct MemoryJournals {
        uploads: Mutex<Vec<Vec<u8>>>,
        attachments: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl JournalClient for MemoryJournals {
        async fn query(&self, _rql: &str) -> AppResult<Vec<Journal>> {
            Ok(vec![])
        }

        async fn create(&self, journal: &NewJournal) -> AppResult<Journal> {
            Ok(Journal {
                id: "BJO-1".to_string(),
                name: Some(journal.name.clone()),
                status: JournalStatus::Draft,
                external_ids: journal.external_ids.clone(),
            })
        }

        async fn upload(&self, _journal_id: &str, file: Vec<u8>, _filename: &str) -> AppResult<()> {
            self.uploads.lock().unwrap().push(file);
            Ok(())
        }

        async fn upload_attachment(
            &self,
            _journal_id: &str,
            attachment: Attachment,
        ) -> AppResult<UploadedAttachment> {
            let mut attachments = self.attachments.lock().unwrap();
            attachments.push(attachment.filename);
            Ok(UploadedAttachment {
                id: format!("JOA-{}", attachments.len()),
            })
        }
    }

    fn agreement() -> Agreement {
        Agreement {
            id: "AGR-1".to_string(),
            status: Some("Active".to_string()),
            external_ids: VendorIds {
                vendor: Some(MPA.to_string()),
            },
            subscriptions: vec![Subscription {
                id: "SUB-1".to_string(),
                status: SubscriptionStatus::Active,
                external_ids: VendorIds {
                    vendor: Some(ACCOUNT.to_string()),
                },
                lines: vec![SubscriptionLine {
                    id: "ALI-1".to_string(),
                    item: ItemRef {
                        id: "ITM-1".to_string(),
                        external_ids: VendorIds {
                            vendor: Some("AWS Usage".to_string()),
                        },
                    },
                }],
            }],
            parameters: Parameters {
                ordering: vec![],
                fulfillment: vec![Parameter {
                    external_id: "transferType".to_string(),
                    value: Some("split_billing".to_string()),
                }],
            },
        }
    }

    fn write_snapshot(root: &TempDir) {
        let dir = root.path().join(MPA);
        fs::create_dir_all(&dir).unwrap();

        let account_filter = json!({"Dimensions": {"Key": "LINKED_ACCOUNT", "Values": [ACCOUNT]}});
        let cost_and_usage = json!([
            {
                "GroupBy": [
                    {"Type": "DIMENSION", "Key": "RECORD_TYPE"},
                    {"Type": "DIMENSION", "Key": "SERVICE"}
                ],
                "Filter": account_filter,
                "Response": {"ResultsByTime": [{"Groups": [
                    {"Keys": ["Usage", "Amazon EC2"], "Metrics": {"UnblendedCost": {"Amount": "100", "Unit": "USD"}}},
                    {"Keys": ["Solution Provider Program Discount", "Amazon EC2"], "Metrics": {"UnblendedCost": {"Amount": "-7", "Unit": "USD"}}}
                ]}]}
            },
            {
                "GroupBy": [
                    {"Type": "DIMENSION", "Key": "SERVICE"},
                    {"Type": "DIMENSION", "Key": "INVOICING_ENTITY"}
                ],
                "Filter": account_filter,
                "Response": {"ResultsByTime": [{"Groups": [
                    {"Keys": ["Amazon EC2", ENTITY], "Metrics": {"UnblendedCost": {"Amount": "100", "Unit": "USD"}}}
                ]}]}
            }
        ]);
        fs::write(dir.join("cost_and_usage.json"), cost_and_usage.to_string()).unwrap();

        let summaries = json!([{
            "AccountId": MPA,
            "InvoiceId": "EUINGB25-0001",
            "Entity": {"InvoicingEntity": ENTITY},
            "PaymentCurrencyAmount": {"CurrencyCode": "EUR", "TotalAmount": "92", "TotalAmountBeforeTax": "92",
                "CurrencyExchangeDetails": {"Rate": "0.92"}},
            "BaseCurrencyAmount": {"CurrencyCode": "USD", "TotalAmount": "100", "TotalAmountBeforeTax": "100"}
        }]);
        fs::write(dir.join("invoice_summaries.json"), summaries.to_string()).unwrap();
    }

    #[tokio::test]
    async fn test_generates_converted_journal_from_snapshots() {
        let root = TempDir::new().unwrap();
        write_snapshot(&root);

        let journals = Arc::new(MemoryJournals::default());
        let config = BillingConfig {
            product_ids: vec!["PRD-1111-1111".to_string()],
            ..Default::default()
        };
        let clients = Collaborators {
            journals: journals.clone(),
            commerce: Arc::new(StaticCommerce {
                agreements: vec![agreement()],
            }),
            aws: Arc::new(SnapshotProviderFactory::new(root.path())),
            notifications: Notifications::new(Arc::new(LogNotifier), "https://portal.example.com"),
        };
        let generator = BillingJournalGenerator::new(
            clients,
            config.clone(),
            BillingPeriod::new(2025, 5).unwrap(),
            config.product_ids.clone(),
            journal_processors(&config),
            None,
        );

        let summary = generator.generate_billing_journals().await.unwrap();

        assert_eq!(
            summary.outcome("AUT-1"),
            Some(&AuthorizationOutcome::Uploaded {
                journal_id: "BJO-1".to_string(),
                total_lines: 1,
                invalid_lines: 0,
            })
        );

        let uploads = journals.uploads.lock().unwrap();
        let content = String::from_utf8(uploads[0].clone()).unwrap();
        let lines: Vec<JournalLine> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].is_valid());
        assert_eq!(lines[0].price.pp_x1, dec!(92));
        assert_eq!(lines[0].external_ids.invoice, "EUINGB25-0001");

        // No failed lines, only the report archive
        let attachments = journals.attachments.lock().unwrap();
        assert_eq!(*attachments, vec!["reports-BJO-1.zip".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_notified_not_fatal() {
        let root = TempDir::new().unwrap();
        let journals = Arc::new(MemoryJournals::default());
        let config = BillingConfig {
            product_ids: vec!["PRD-1111-1111".to_string()],
            ..Default::default()
        };
        let clients = Collaborators {
            journals: journals.clone(),
            commerce: Arc::new(StaticCommerce {
                agreements: vec![agreement()],
            }),
            aws: Arc::new(SnapshotProviderFactory::new(root.path())),
            notifications: Notifications::new(Arc::new(LogNotifier), "https://portal.example.com"),
        };
        let generator = BillingJournalGenerator::new(
            clients,
            config.clone(),
            BillingPeriod::new(2025, 5).unwrap(),
            config.product_ids.clone(),
            journal_processors(&config),
            None,
        );

        let summary = generator.generate_billing_journals().await.unwrap();

        assert_eq!(summary.failed(), 0);
        assert_eq!(
            summary.outcome("AUT-1"),
            Some(&AuthorizationOutcome::NoLines {
                journal_id: "BJO-1".to_string()
            })
        );
        assert!(journals.uploads.lock().unwrap().is_empty());
    }
}
