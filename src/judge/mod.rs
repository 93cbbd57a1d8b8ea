pub mod prompt;
pub mod verdict;
pub mod xai_client;

pub use prompt::build_prompt;
pub use verdict::{parse_verdict, Verdict};
pub use xai_client::XaiClient;

use std::future::Future;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM call timed out after {0}s")]
    Timeout(u64),

    #[error("LLM call cancelled")]
    Cancelled,

    #[error("LLM response had no content")]
    EmptyResponse,

    #[error("could not parse verdict: {message}")]
    Parse { message: String, raw: String },
}

/// Messages sent to the judge for one pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgePrompt {
    pub system: String,
    pub user: String,
}

/// Something that can answer a judge prompt with raw text.
pub trait VerdictSource {
    fn ask(
        &self,
        prompt: &JudgePrompt,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<String, JudgeError>> + Send;
}
