//! Rate-limited document registration client.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::document::Document;
use super::submitter::{DocumentSubmitter, HttpDocumentSubmitter};
use crate::config::CrptConfig;
use crate::error::{CrptError, Result};
use crate::ratelimit::{LimiterConfig, SlidingWindowLimiter, TimeWindow};

/// Client that admits each document through a sliding-window limiter
/// before handing it to a submitter.
///
/// Clones share the same limiter and submitter, so one `CrptApi` can be
/// cloned into many tasks and the limit holds across all of them.
pub struct CrptApi<S: DocumentSubmitter = HttpDocumentSubmitter> {
    /// The rate limiter instance
    limiter: Arc<SlidingWindowLimiter>,
    /// Performs the outbound call after admission
    submitter: Arc<S>,
}

impl<S: DocumentSubmitter> Clone for CrptApi<S> {
    fn clone(&self) -> Self {
        Self {
            limiter: Arc::clone(&self.limiter),
            submitter: Arc::clone(&self.submitter),
        }
    }
}

impl CrptApi<HttpDocumentSubmitter> {
    /// Create a client for the default endpoint allowing `request_limit`
    /// documents per one `unit`.
    pub fn new(unit: TimeWindow, request_limit: i64) -> Result<Self> {
        let config = LimiterConfig::new(unit, request_limit)?;
        Ok(Self::with_submitter(
            SlidingWindowLimiter::new(config),
            HttpDocumentSubmitter::new()?,
        ))
    }

    /// Create a client from loaded configuration.
    pub fn from_config(config: &CrptConfig) -> Result<Self> {
        let limiter_config = config.rate_limiting.limiter_config()?;
        Ok(Self::with_submitter(
            SlidingWindowLimiter::new(limiter_config),
            HttpDocumentSubmitter::from_config(&config.client)?,
        ))
    }
}

impl<S: DocumentSubmitter> CrptApi<S> {
    /// Create a client from an existing limiter and submitter.
    pub fn with_submitter(limiter: SlidingWindowLimiter, submitter: S) -> Self {
        Self {
            limiter: Arc::new(limiter),
            submitter: Arc::new(submitter),
        }
    }

    /// Get the limiter guarding this client.
    pub fn limiter(&self) -> &SlidingWindowLimiter {
        &self.limiter
    }

    /// Get the submitter used after admission.
    pub fn submitter(&self) -> &S {
        &self.submitter
    }

    /// Wait for admission, then submit the document.
    pub async fn create_document(&self, document: &Document, signature: &str) -> Result<()> {
        self.create_document_with_cancel(document, signature, &CancellationToken::new())
            .await
    }

    /// Wait for admission, then submit the document. Cancelling `cancel`
    /// while waiting fails with [`CrptError::Cancelled`] and sends nothing.
    ///
    /// A slot reserved here stays consumed even if the submission fails.
    #[instrument(skip(self, document, signature, cancel), fields(doc_id = %document.doc_id))]
    pub async fn create_document_with_cancel(
        &self,
        document: &Document,
        signature: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if signature.is_empty() {
            return Err(CrptError::InvalidArgument(
                "signature must not be empty".to_string(),
            ));
        }

        self.limiter.acquire_with_cancel(cancel).await?;
        debug!("Admitted, submitting document");

        self.submitter.submit(document, signature).await
    }
}
