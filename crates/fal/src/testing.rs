//! Scripted in-memory provider for tests.
//!
//! Used by this crate's unit tests and, through the `testing` feature, by
//! the API crate's integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use reelswap_core::error::CoreError;
use reelswap_core::job::JobEvent;
use reelswap_core::types::JobId;

use crate::messages::{GenerationInput, UploadFile};
use crate::provider::GenerationProvider;

/// Records every call and replays scripted statuses.
#[derive(Default)]
pub struct MockProvider {
    pub configured: bool,
    pub uploads: Mutex<Vec<UploadFile>>,
    pub submissions: Mutex<Vec<(GenerationInput, Option<String>)>>,
    pub upload_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    /// Returned in order; once exhausted every query answers `IN_PROGRESS`.
    pub statuses: Mutex<VecDeque<Result<JobEvent, CoreError>>>,
    /// When set, uploads fail with this upstream message.
    pub upload_failure: Option<String>,
    /// Uploads that succeed before `upload_failure` kicks in.
    pub uploads_before_failure: usize,
}

impl MockProvider {
    pub fn configured() -> Self {
        Self {
            configured: true,
            ..Default::default()
        }
    }

    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn with_statuses(statuses: Vec<Result<JobEvent, CoreError>>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            ..Self::configured()
        }
    }

    /// A configured provider whose storage accepts `succeed` files and then
    /// rejects every further one with `message`.
    pub fn failing_uploads_after(succeed: usize, message: &str) -> Self {
        Self {
            upload_failure: Some(message.to_string()),
            uploads_before_failure: succeed,
            ..Self::configured()
        }
    }

    pub fn network_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
            + self.submit_calls.load(Ordering::SeqCst)
            + self.status_calls.load(Ordering::SeqCst)
    }

    /// Files stored so far.
    pub fn stored(&self) -> MutexGuard<'_, Vec<UploadFile>> {
        self.uploads.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Submissions made so far, with their webhook addresses.
    pub fn submitted(&self) -> MutexGuard<'_, Vec<(GenerationInput, Option<String>)>> {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl GenerationProvider for MockProvider {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn upload_file(&self, file: UploadFile) -> Result<String, CoreError> {
        let previous = self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = &self.upload_failure {
            if previous >= self.uploads_before_failure {
                return Err(CoreError::Upstream(msg.clone()));
            }
        }
        let url = format!("https://cdn.test/{}", file.file_name);
        self.stored().push(file);
        Ok(url)
    }

    async fn submit_job(
        &self,
        input: &GenerationInput,
        webhook_url: Option<&str>,
    ) -> Result<JobId, CoreError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted()
            .push((input.clone(), webhook_url.map(str::to_string)));
        Ok("job-1".to_string())
    }

    async fn job_status(&self, _job_id: &str) -> Result<JobEvent, CoreError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if !self.configured {
            return Err(CoreError::Config("FAL_KEY not configured on server".into()));
        }
        self.statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Ok(JobEvent::in_progress()))
    }
}
