use std::fmt;

use thiserror::Error;

/// Why a run finished successfully.
///
/// Success outcomes carry information: most of them mean "nothing to do".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SuccessReason {
    /// At least one new non-empty package was persisted.
    Success,
    /// No relevant check-in windows exist; no network was used.
    NoCheckins,
    /// The catalog is non-empty but holds nothing new or relevant.
    NoPackagesAvailable,
    /// The server currently publishes no packages for the region.
    EmptyAvailablePackages,
    /// Only empty-marker packages were encountered.
    EmptySinglePackage,
}

impl SuccessReason {
    /// Stable identifier for logs and machine-readable output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NoCheckins => "no_checkins",
            Self::NoPackagesAvailable => "no_packages_available",
            Self::EmptyAvailablePackages => "empty_available_packages",
            Self::EmptySinglePackage => "empty_single_package",
        }
    }
}

/// Why a run was aborted.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum DownloadFailure {
    #[error("a download is already running")]
    DownloadIsRunning,

    #[error("package discovery failed")]
    General,

    #[error("relevant check-in windows disappeared during the run")]
    NoEarliestRelevantPackage,

    #[error("package download returned an invalid response")]
    InvalidResponse,

    #[error("downloaded package has no ETag")]
    Identification,

    #[error("package signature verification failed")]
    Verification,

    #[error("local storage failed")]
    Storage,
}

impl DownloadFailure {
    /// Stable identifier for logs and machine-readable output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DownloadIsRunning => "download_is_running",
            Self::General => "general_error",
            Self::NoEarliestRelevantPackage => "no_earliest_relevant_package",
            Self::InvalidResponse => "invalid_response_error",
            Self::Identification => "identification_error",
            Self::Verification => "verification_error",
            Self::Storage => "storage_error",
        }
    }
}

/// Result of one download run: exactly one per call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DownloadOutcome {
    Success(SuccessReason),
    Failure(DownloadFailure),
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Success(reason) => reason.code(),
            Self::Failure(failure) => failure.code(),
        }
    }
}

impl From<SuccessReason> for DownloadOutcome {
    fn from(reason: SuccessReason) -> Self {
        Self::Success(reason)
    }
}

impl From<DownloadFailure> for DownloadOutcome {
    fn from(failure: DownloadFailure) -> Self {
        Self::Failure(failure)
    }
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(reason) => write!(f, "success ({})", reason.code()),
            Self::Failure(failure) => write!(f, "failure ({}): {failure}", failure.code()),
        }
    }
}

/// Per-run tally of fetched packages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub packages: usize,
    pub empty: usize,
}

impl FetchStats {
    /// Outcome of a fetch loop that completed without failures.
    pub fn outcome(&self) -> DownloadOutcome {
        if self.packages > 0 {
            SuccessReason::Success.into()
        } else if self.empty > 0 {
            SuccessReason::EmptySinglePackage.into()
        } else {
            SuccessReason::NoPackagesAvailable.into()
        }
    }
}
