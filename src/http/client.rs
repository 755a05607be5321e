//! Health endpoint client used by `supervisor-cli`.

use reqwest::StatusCode;

use crate::health::CheckerResult;

/// Exit code when the server could not be queried.
pub const EXIT_UNREACHABLE: u8 = 2;

/// What the health endpoint answered.
#[derive(Debug)]
pub struct HealthReport {
    pub status: StatusCode,
    /// Per-probe breakdown, only requested in verbose mode.
    pub result: Option<CheckerResult>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status.is_success()
    }

    /// 0 when healthy, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.is_healthy() {
            0
        } else {
            1
        }
    }
}

/// Query `{url}{path}`, adding `?verbose=1` when `verbose` is set.
pub async fn fetch_health(
    client: &reqwest::Client,
    url: &str,
    path: &str,
    verbose: bool,
) -> Result<HealthReport, reqwest::Error> {
    let mut request = client.get(format!("{}{}", url.trim_end_matches('/'), path));
    if verbose {
        request = request.query(&[("verbose", "1")]);
    }

    let res = request.send().await?;
    let status = res.status();
    let result = if verbose { Some(res.json().await?) } else { None };

    Ok(HealthReport { status, result })
}
