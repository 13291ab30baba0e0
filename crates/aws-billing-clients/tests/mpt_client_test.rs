// Integration tests for the Marketplace Platform client against a mock server

#[cfg(test)]
mod tests {
    use aws_billing_clients::MptClient;
    use aws_billing_core::models::{Attachment, JournalStatus, NewJournal};
    use aws_billing_core::traits::{CommerceClient, JournalClient};
    use aws_billing_core::BillingError;
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, page_size: u32) -> MptClient {
        MptClient::new(&server.uri(), "test-token", 5, page_size).unwrap()
    }

    fn page(data: serde_json::Value, offset: u64, limit: u64, total: u64) -> serde_json::Value {
        json!({
            "$meta": {"pagination": {"offset": offset, "limit": limit, "total": total}},
            "data": data
        })
    }

    #[tokio::test]
    async fn test_query_journals_follows_pagination() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/public/v1/billing/journals"))
            .and(query_param("offset", "0"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(
                json!([
                    {"id": "BJO-1", "status": "Draft", "externalIds": {"vendor": "AWS-2025-5"}},
                    {"id": "BJO-2", "status": "Completed"}
                ]),
                0,
                2,
                3,
            )))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/public/v1/billing/journals"))
            .and(query_param("offset", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(
                json!([{"id": "BJO-3", "status": "Review"}]),
                2,
                2,
                3,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let journals = client(&server, 2)
            .query("and(eq(authorization.id,AUT-1),eq(externalIds.vendor,AWS-2025-5))")
            .await
            .unwrap();

        assert_eq!(journals.len(), 3);
        assert_eq!(journals[0].external_ids.vendor.as_deref(), Some("AWS-2025-5"));
        assert_eq!(journals[2].status, JournalStatus::Review);
    }

    #[tokio::test]
    async fn test_create_journal_posts_payload() {
        let server = MockServer::start().await;
        let due_date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let new_journal = NewJournal::new(
            "1 May 2025 #1".to_string(),
            "AUT-1",
            due_date,
            "AWS-2025-5".to_string(),
        );

        Mock::given(method("POST"))
            .and(path("/public/v1/billing/journals"))
            .and(body_json(json!({
                "name": "1 May 2025 #1",
                "authorization": {"id": "AUT-1"},
                "dueDate": "2025-06-01",
                "externalIds": {"vendor": "AWS-2025-5"}
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "BJO-9",
                "name": "1 May 2025 #1",
                "status": "Draft"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let journal = client(&server, 100).create(&new_journal).await.unwrap();
        assert_eq!(journal.id, "BJO-9");
        assert!(journal.status.is_pending());
    }

    #[tokio::test]
    async fn test_upload_journal_file() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/public/v1/billing/journals/BJO-9/upload"))
            .and(body_string_contains("filename=\"journal-AUT-1-2025-05.jsonl\""))
            .and(body_string_contains("{\"line\":1}"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client(&server, 100)
            .upload("BJO-9", b"{\"line\":1}\n".to_vec(), "journal-AUT-1-2025-05.jsonl")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_upload_attachment_returns_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/public/v1/billing/journals/BJO-9/attachments"))
            .and(body_string_contains("name=\"attachment\""))
            .and(body_string_contains("Failed journal lines"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "JOA-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let attachment = Attachment {
            filename: "failed-journal-lines-BJO-9.jsonl".to_string(),
            mime_type: "application/jsonl".to_string(),
            name: "Failed journal lines".to_string(),
            description: "Lines that could not be reconciled".to_string(),
            content: b"{}\n".to_vec(),
        };

        let uploaded = client(&server, 100)
            .upload_attachment("BJO-9", attachment)
            .await
            .unwrap();
        assert_eq!(uploaded.id, "JOA-1");
    }

    #[tokio::test]
    async fn test_http_error_maps_to_ledger_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/public/v1/billing/journals"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client(&server, 100).query("eq(id,BJO-1)").await.unwrap_err();
        assert!(matches!(err, BillingError::Ledger(_)));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_empty_authorizations_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/public/v1/catalog/authorizations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]), 0, 100, 0)))
            .mount(&server)
            .await;

        let authorizations = client(&server, 100)
            .get_authorizations("eq(product.id,PRD-1)")
            .await
            .unwrap();
        assert!(authorizations.is_none());
    }

    #[tokio::test]
    async fn test_get_agreements() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/public/v1/commerce/agreements"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(
                json!([{
                    "id": "AGR-1",
                    "status": "Active",
                    "externalIds": {"vendor": "123456789012"},
                    "subscriptions": [],
                    "parameters": {"fulfillment": [{"externalId": "transferType", "value": "split_billing"}]}
                }]),
                0,
                100,
                1,
            )))
            .mount(&server)
            .await;

        let agreements = client(&server, 100)
            .get_agreements_by_query("eq(authorization.id,AUT-1)")
            .await
            .unwrap();

        assert_eq!(agreements.len(), 1);
        assert_eq!(agreements[0].mpa_id(), Some("123456789012"));
        assert!(agreements[0].is_split_billing());
    }

    #[tokio::test]
    async fn test_commerce_failure_maps_to_commerce_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/public/v1/commerce/agreements"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server, 100)
            .get_agreements_by_query("eq(id,AGR-1)")
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::Commerce(_)));
    }
}
