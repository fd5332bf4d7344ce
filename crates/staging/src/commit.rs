use thiserror::Error;

use khata_core::{CommittedExpense, NewExpense, ReferenceCatalog, StagedExpense};

#[derive(Error, Debug)]
pub enum CommitError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("persistence rejected the batch (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },
}

/// The persistence collaborator boundary. One call carries the whole batch;
/// the collaborator applies it as a unit, so the engine never observes
/// partial results.
pub trait ExpenseSink {
    fn create_batch(
        &self,
        records: &[NewExpense],
    ) -> impl std::future::Future<Output = Result<Vec<CommittedExpense>, CommitError>> + Send;
}

/// HTTP implementation: POSTs the records as one JSON array.
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSink {
    pub fn new(endpoint: &str) -> Self {
        HttpSink {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
        }
    }
}

impl ExpenseSink for HttpSink {
    async fn create_batch(
        &self,
        records: &[NewExpense],
    ) -> Result<Vec<CommittedExpense>, CommitError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(records)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CommitError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

/// Turn the staged set into the wire batch. The one business rule the
/// engine enforces lives here: a record with empty notes and a resolved app
/// gets the app's name as its notes (display-default naming).
pub fn finalize(staged: &[StagedExpense], catalog: &ReferenceCatalog) -> Vec<NewExpense> {
    staged
        .iter()
        .map(|exp| {
            let mut record = exp.to_record();
            if record.notes.trim().is_empty() {
                if let Some(name) = record.expense_app_id.and_then(|id| catalog.app_name(id)) {
                    record.notes = name.to_string();
                }
            }
            record
        })
        .collect()
}
