use git2::{Repository, build::CheckoutBuilder};
use std::path::PathBuf;

/// What to do when the optimum-intel checkout cannot be refreshed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SyncPolicy {
    /// Fail startup.
    Abort,
    /// Log a warning and continue with whatever is on disk.
    #[default]
    Warn,
    /// Continue silently (debug log only).
    Ignore,
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Failed to prepare {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("HEAD of {0} is not on a branch")]
    DetachedHead(PathBuf),

    #[error("Branch {branch} cannot be fast-forwarded to origin")]
    NotFastForward { branch: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Cloned,
    Updated { from: String, to: String },
    UpToDate,
    /// Refresh failed and the policy allowed continuing.
    Stale { reason: String },
}

#[derive(Debug, Clone)]
pub struct RepoSync {
    pub url: String,
    pub dir: PathBuf,
    pub policy: SyncPolicy,
}

impl RepoSync {
    pub fn new(url: impl Into<String>, dir: impl Into<PathBuf>, policy: SyncPolicy) -> Self {
        RepoSync {
            url: url.into(),
            dir: dir.into(),
            policy,
        }
    }
}

/// Clone the repository if the checkout is missing, fast-forward it otherwise.
pub fn sync_repository(sync: &RepoSync) -> Result<SyncOutcome, SyncError> {
    let result = if sync.dir.exists() {
        log::info!("Updating {} from origin", sync.dir.display());
        Repository::open(&sync.dir)
            .map_err(SyncError::from)
            .and_then(|repo| pull(&repo, sync))
    } else {
        log::info!("Cloning {} into {}", sync.url, sync.dir.display());
        clone(sync)
    };

    match result {
        Ok(outcome) => {
            log::info!("Checkout {}: {:?}", sync.dir.display(), outcome);
            Ok(outcome)
        }
        Err(e) => match sync.policy {
            SyncPolicy::Abort => Err(e),
            SyncPolicy::Warn => {
                log::warn!(
                    "Failed to refresh {}, continuing with local data: {}",
                    sync.dir.display(),
                    e
                );
                Ok(SyncOutcome::Stale {
                    reason: e.to_string(),
                })
            }
            SyncPolicy::Ignore => {
                log::debug!("Failed to refresh {}: {}", sync.dir.display(), e);
                Ok(SyncOutcome::Stale {
                    reason: e.to_string(),
                })
            }
        },
    }
}

fn clone(sync: &RepoSync) -> Result<SyncOutcome, SyncError> {
    if let Some(parent) = sync.dir.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| SyncError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Repository::clone(&sync.url, &sync.dir)?;
    Ok(SyncOutcome::Cloned)
}

fn pull(repo: &Repository, sync: &RepoSync) -> Result<SyncOutcome, SyncError> {
    let head = repo.head()?;
    if !head.is_branch() {
        return Err(SyncError::DetachedHead(sync.dir.clone()));
    }
    let branch = head.shorthand().unwrap_or_default().to_string();
    let refname = format!("refs/heads/{branch}");

    let mut remote = repo.find_remote("origin")?;
    remote.fetch(&[branch.as_str()], None, None)?;

    let fetch_head = repo.find_reference("FETCH_HEAD")?;
    let fetched = repo.reference_to_annotated_commit(&fetch_head)?;
    let (analysis, _) = repo.merge_analysis(&[&fetched])?;
    if analysis.is_up_to_date() {
        return Ok(SyncOutcome::UpToDate);
    }
    if !analysis.is_fast_forward() {
        return Err(SyncError::NotFastForward { branch });
    }

    let mut reference = repo.find_reference(&refname)?;
    let from = reference.target().map(|o| o.to_string()).unwrap_or_default();
    reference.set_target(fetched.id(), "optimum-support: fast-forward")?;
    repo.set_head(&refname)?;
    repo.checkout_head(Some(CheckoutBuilder::default().force()))?;
    Ok(SyncOutcome::Updated {
        from,
        to: fetched.id().to_string(),
    })
}
