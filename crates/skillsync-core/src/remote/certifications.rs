//! Paginated certification listing.

use super::{CertificationSummary, RemoteError, RemoteStateClient};

/// Follow `nextToken` across pages and return every certification record.
///
/// Stops at the first page that is not truncated, or that is truncated but
/// carries no new token to continue from.
pub async fn collect_certifications(
    client: &dyn RemoteStateClient,
    skill_id: &str,
) -> Result<Vec<CertificationSummary>, RemoteError> {
    let mut items = Vec::new();
    let mut next_token: Option<String> = None;

    loop {
        let page = client
            .get_certifications(skill_id, next_token.as_deref())
            .await?;
        tracing::debug!(skill_id, count = page.items.len(), "certification page");
        items.extend(page.items);

        match (page.is_truncated, page.next_token) {
            (true, Some(token)) if next_token.as_deref() == Some(token.as_str()) => {
                tracing::warn!(skill_id, %token, "certification listing repeated its nextToken");
                break;
            }
            (true, Some(token)) => next_token = Some(token),
            (true, None) => {
                tracing::warn!(skill_id, "truncated certification page without nextToken");
                break;
            }
            (false, _) => break,
        }
    }

    Ok(items)
}
