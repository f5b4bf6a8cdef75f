//! Image-pull retry loop (spec §4.1: "Image pulls retry up to 3 times with a
//! 15 s delay between attempts, capped at 15 minutes total; manifest/platform
//! mismatch errors fail immediately without retry").

use std::time::{Duration, Instant};

use scanforge_core::error::RunnerError;
use tracing::warn;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(15);
const TOTAL_BUDGET: Duration = Duration::from_secs(15 * 60);

/// Run `pull` up to [`MAX_ATTEMPTS`] times with a fixed delay between
/// attempts, bailing out early (without retry) on a manifest/platform
/// mismatch, and never exceeding the overall time budget.
pub async fn with_pull_retry<F, Fut>(image: &str, mut pull: F) -> Result<(), RunnerError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<(), RunnerError>>,
{
    let start = Instant::now();
    let mut last_err = None;

    for attempt in 1..=MAX_ATTEMPTS {
        match pull().await {
            Ok(()) => return Ok(()),
            Err(err) if err.is_no_retry() => return Err(err),
            Err(err) => {
                warn!(image, attempt, error = %err, "image pull attempt failed");
                last_err = Some(err);
                if attempt == MAX_ATTEMPTS || start.elapsed() >= TOTAL_BUDGET {
                    break;
                }
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| RunnerError::ImagePull {
        image: image.to_string(),
        cause: "exhausted retries".to_string(),
    }))
}
