//! In-memory collaborators for exercising the token lifecycle without a
//! live store or workflow. Access counters let tests assert that
//! validation failures never reach the store or the network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    application::{
        error::ApplicationError,
        repositories::token_store::{ConsumeOutcome, TokenStore},
        services::{status_service::PolicyStatusService, workflow_service::WorkflowService},
    },
    domain::models::{
        token::{doc_key, doc_payment_key, payment_key, upload_token_key, TokenRecord},
        upload::{UploadFile, UploadMetadata},
    },
};

/// Flat key -> JSON-string map, mirroring how the real store holds
/// records. Serializing through the same wire format keeps the mock
/// honest about dual-key consistency.
pub struct InMemoryTokenStore {
    entries: Mutex<HashMap<String, String>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_mark_used: AtomicBool,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            fail_mark_used: AtomicBool::new(false),
        }
    }

    /// Total store operations observed.
    pub fn accesses(&self) -> usize {
        self.reads.load(Ordering::SeqCst) + self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_mark_used(&self, fail: bool) {
        self.fail_mark_used.store(fail, Ordering::SeqCst);
    }

    fn read(&self, key: &str) -> Result<Option<TokenRecord>, ApplicationError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .map(|raw| {
                serde_json::from_str(raw).map_err(|e| {
                    ApplicationError::InternalError(format!("Corrupt token record: {}", e))
                })
            })
            .transpose()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn put_record(
        &self,
        record: &TokenRecord,
        _ttl_seconds: u64,
    ) -> Result<(), ApplicationError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let payload = serde_json::to_string(record)
            .map_err(|e| ApplicationError::InternalError(e.to_string()))?;
        let mut entries = self.entries.lock().unwrap();
        entries.insert(upload_token_key(&record.token), payload.clone());
        entries.insert(payment_key(&record.session_id), payload);
        Ok(())
    }

    async fn fetch_by_token(
        &self,
        token: &str,
    ) -> Result<Option<TokenRecord>, ApplicationError> {
        self.read(&upload_token_key(token))
    }

    async fn fetch_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<TokenRecord>, ApplicationError> {
        self.read(&payment_key(session_id))
    }

    async fn mark_used(
        &self,
        token: &str,
        session_id: &str,
        _ttl_seconds: u64,
    ) -> Result<ConsumeOutcome, ApplicationError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_mark_used.load(Ordering::SeqCst) {
            return Err(ApplicationError::StoreUnavailable(
                "injected store failure".to_string(),
            ));
        }

        let mut entries = self.entries.lock().unwrap();
        let Some(raw) = entries.get(&upload_token_key(token)) else {
            return Ok(ConsumeOutcome::Missing);
        };
        let mut record: TokenRecord = serde_json::from_str(raw)
            .map_err(|e| ApplicationError::InternalError(format!("Corrupt token record: {}", e)))?;
        if record.used {
            return Ok(ConsumeOutcome::AlreadyUsed);
        }
        record.used = true;
        let payload = serde_json::to_string(&record)
            .map_err(|e| ApplicationError::InternalError(e.to_string()))?;
        entries.insert(upload_token_key(token), payload.clone());
        entries.insert(payment_key(session_id), payload);
        Ok(ConsumeOutcome::Consumed)
    }

    async fn put_document(
        &self,
        session_id: &str,
        document_id: &str,
        _ttl_seconds: u64,
    ) -> Result<(), ApplicationError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.entries.lock().unwrap();
        entries.insert(doc_key(session_id), document_id.to_string());
        entries.insert(doc_payment_key(session_id), document_id.to_string());
        Ok(())
    }

    async fn fetch_document(
        &self,
        session_id: &str,
    ) -> Result<Option<String>, ApplicationError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let entries = self.entries.lock().unwrap();
        Ok(entries.get(&doc_key(session_id)).cloned())
    }
}

pub struct MockWorkflow {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl MockWorkflow {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl WorkflowService for MockWorkflow {
    async fn submit(
        &self,
        _file: &UploadFile,
        _token: &str,
        _metadata: &UploadMetadata,
    ) -> Result<(), ApplicationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ApplicationError::ActionFailed(
                "injected workflow failure".to_string(),
            ));
        }
        Ok(())
    }
}

pub struct MockStatus {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl MockStatus {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PolicyStatusService for MockStatus {
    async fn mark_processing(&self, _session_id: &str) -> Result<(), ApplicationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ApplicationError::InternalError(
                "injected status failure".to_string(),
            ));
        }
        Ok(())
    }
}
