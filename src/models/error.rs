//! BalanceError and its classification.

use crate::models::fixture::FixtureId;
use crate::models::player::PlayerId;
use crate::models::weights::PositionGroup;

/// Errors that can occur while validating, balancing or persisting a fixture.
#[derive(Clone, Debug, PartialEq)]
pub enum BalanceError {
    /// Pool size outside the configured bounds.
    PoolSizeOutOfRange { size: usize, min: usize, max: usize },
    /// Requested team sizes do not add up to the pool size.
    TargetSizeMismatch { requested: usize, pool: usize },
    /// Loaded players do not match the fixture's expected total.
    PlayerCountMismatch { expected: usize, loaded: usize },
    /// A positional pool is too large to search exhaustively.
    PositionPoolTooLarge { group: PositionGroup, size: usize, max: usize },
    /// The same player appears twice in a pool.
    DuplicatePlayer(PlayerId),
    /// Weights must be finite and non-negative.
    InvalidWeights,
    /// Roster CSV could not be read (line number if known).
    InvalidRoster { line: Option<u64>, message: String },
    PlayerNotFound(PlayerId),
    FixtureNotFound(FixtureId),
    /// No size template for this nominal team size.
    TemplateNotFound(usize),
    /// Fixture was modified since it was read.
    VersionConflict { expected: u64, actual: u64 },
    /// Search finished without a best combination.
    NoValidCombination,
    /// Persistence layer unusable (poisoned lock).
    StoreUnavailable,
}

/// Broad class of a [`BalanceError`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Validation,
    MissingReference,
    Conflict,
    Internal,
}

impl BalanceError {
    pub fn kind(&self) -> ErrorKind {
        use BalanceError::*;
        match self {
            PoolSizeOutOfRange { .. }
            | TargetSizeMismatch { .. }
            | PlayerCountMismatch { .. }
            | PositionPoolTooLarge { .. }
            | DuplicatePlayer(_)
            | InvalidWeights
            | InvalidRoster { .. } => ErrorKind::Validation,
            PlayerNotFound(_) | FixtureNotFound(_) | TemplateNotFound(_) => ErrorKind::MissingReference,
            VersionConflict { .. } => ErrorKind::Conflict,
            NoValidCombination | StoreUnavailable => ErrorKind::Internal,
        }
    }

    /// Only conflicts are worth retrying (after re-reading the fixture).
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }
}

impl std::fmt::Display for BalanceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BalanceError::PoolSizeOutOfRange { size, min, max } => {
                write!(f, "Pool has {} players; must be between {} and {}", size, min, max)
            }
            BalanceError::TargetSizeMismatch { requested, pool } => write!(
                f,
                "Team sizes add up to {} but the pool has {} players",
                requested, pool
            ),
            BalanceError::PlayerCountMismatch { expected, loaded } => write!(
                f,
                "Fixture expects {} players but {} were loaded",
                expected, loaded
            ),
            BalanceError::PositionPoolTooLarge { group, size, max } => write!(
                f,
                "{:?} pool has {} players; at most {} can be searched",
                group, size, max
            ),
            BalanceError::DuplicatePlayer(id) => write!(f, "Player {} appears more than once", id),
            BalanceError::InvalidWeights => write!(f, "Weights must be finite and non-negative"),
            BalanceError::InvalidRoster { line: Some(line), message } => {
                write!(f, "Invalid roster at line {}: {}", line, message)
            }
            BalanceError::InvalidRoster { line: None, message } => {
                write!(f, "Invalid roster: {}", message)
            }
            BalanceError::PlayerNotFound(id) => write!(f, "Player {} not found", id),
            BalanceError::FixtureNotFound(id) => write!(f, "Fixture {} not found", id),
            BalanceError::TemplateNotFound(size) => {
                write!(f, "No team-size template for {} players", size)
            }
            BalanceError::VersionConflict { expected, actual } => write!(
                f,
                "Fixture was changed by someone else (expected version {}, found {}); reload and retry",
                expected, actual
            ),
            BalanceError::NoValidCombination => write!(f, "Search found no valid team combination"),
            BalanceError::StoreUnavailable => write!(f, "Store unavailable"),
        }
    }
}

impl std::error::Error for BalanceError {}
