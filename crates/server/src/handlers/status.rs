use axum::extract::Path;
use http::StatusCode;
use probe_shaping::weighted::StatusChoice;

use crate::errors::ApiError;

/// `/status/{codes}`: a single code, or a weighted random pick from a list such as
/// `200:3,500:1`. The body is always empty.
pub async fn status_codes(Path(codes): Path<String>) -> Result<StatusCode, ApiError> {
    let choice = StatusChoice::parse(&codes)?;
    let status = choice.choose();
    probe_trace::debug!("status {} chosen from {}", status, codes);
    Ok(status)
}
