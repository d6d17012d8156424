//! Default branch selection for folder-like items.

use super::FavoriteError;
use super::model::Item;

/// Legacy name looked up when no job carries the primary marker.
const DEFAULT_BRANCH: &str = "master";

/// Whether a job carries the primary-instance marker.
pub fn is_primary(job: &Item) -> bool {
    job.is_job() && job.primary
}

/// Pick the job representing the folder's primary branch.
///
/// The first job (in the folder's own enumeration order) carrying the
/// primary marker wins. Integrations that predate the marker are served
/// by a direct child job named `master`.
pub fn select_default_branch(folder: &Item) -> Result<&Item, FavoriteError> {
    for job in folder.all_jobs() {
        if is_primary(job) {
            return Ok(job);
        }
    }

    folder.child_job(DEFAULT_BRANCH).ok_or_else(|| {
        tracing::debug!(folder = %folder.full_name, "no default branch");
        FavoriteError::BadRequest("no default branch to favorite".into())
    })
}
