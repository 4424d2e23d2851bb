/*!
 * Provider-specific concurrency tuning and the bounded worker pool.
 *
 * Profiles provide default worker counts based on provider characteristics
 * such as rate limits and whether the model runs locally. The pool runs
 * one tokio task per job and hands results back as they complete.
 */

use std::future::Future;

use futures::stream::{self, StreamExt};
use log::error;
use tokio::task::JoinError;

use crate::app_config::TranslationProvider;

/// Provider-specific concurrency profile with tuned defaults
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderProfile {
    /// Maximum concurrent requests
    pub max_concurrent_requests: usize,
    /// Target requests per minute, informational
    pub target_rpm: Option<u32>,
}

impl ProviderProfile {
    /// Get the optimal profile for a given provider
    pub fn for_provider(provider: TranslationProvider) -> Self {
        match provider {
            TranslationProvider::Ollama => Self {
                // Local model, the GPU is the bottleneck
                max_concurrent_requests: 2,
                target_rpm: None,
            },
            TranslationProvider::OpenAI => Self {
                max_concurrent_requests: 10,
                target_rpm: Some(60),
            },
            TranslationProvider::OpenRouter => Self {
                max_concurrent_requests: 8,
                target_rpm: Some(60),
            },
            TranslationProvider::Anthropic => Self {
                max_concurrent_requests: 5,
                target_rpm: Some(45),
            },
            TranslationProvider::LMStudio => Self {
                max_concurrent_requests: 2,
                target_rpm: None,
            },
        }
    }

    /// Get effective concurrent requests, respecting any user override
    pub fn effective_concurrent_requests(&self, user_override: Option<usize>) -> usize {
        user_override.unwrap_or(self.max_concurrent_requests).max(1)
    }
}

/// Run `job` over every item with at most `workers` tasks in flight.
///
/// Each job is spawned as its own task. `on_complete` receives the item's
/// input position and the job output in completion order; a panicked job
/// is reported as a `JoinError`.
pub async fn run_as_completed<T, O, F, Fut, C>(items: Vec<T>, workers: usize, job: F, mut on_complete: C)
where
    T: Send + 'static,
    O: Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = O> + Send + 'static,
    C: FnMut(usize, Result<O, JoinError>),
{
    let workers = workers.max(1);
    let mut results = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| {
            let handle = tokio::spawn(job(item));
            async move { (index, handle.await) }
        })
        .buffer_unordered(workers);

    while let Some((index, result)) = results.next().await {
        if let Err(e) = &result {
            error!("Worker task {} failed: {}", index, e);
        }
        on_complete(index, result);
    }
}
