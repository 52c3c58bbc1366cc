//! Migration status tracking

/// Comparison of the registry with the version ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Registered versions present in the ledger, ascending
    pub applied: Vec<i64>,

    /// Registered versions not yet applied, ascending
    pub pending: Vec<i64>,

    /// Versions in the ledger with no registered migration, ascending
    pub missing: Vec<i64>,

    /// Number of applied migrations
    pub applied_count: usize,

    /// Number of pending migrations
    pub pending_count: usize,
}

impl MigrationStatus {
    /// Create a new `MigrationStatus`
    #[must_use]
    pub fn new(applied: Vec<i64>, pending: Vec<i64>, missing: Vec<i64>) -> Self {
        let applied_count = applied.len();
        let pending_count = pending.len();

        Self {
            applied,
            pending,
            missing,
            applied_count,
            pending_count,
        }
    }

    /// Compute the status from registered and applied versions
    #[must_use]
    pub fn compare(registered: &[i64], applied: &[i64]) -> Self {
        let mut applied_registered = Vec::new();
        let mut pending = Vec::new();
        for version in registered {
            if applied.contains(version) {
                applied_registered.push(*version);
            } else {
                pending.push(*version);
            }
        }
        let mut missing: Vec<i64> = applied
            .iter()
            .filter(|v| !registered.contains(v))
            .copied()
            .collect();
        missing.sort_unstable();

        applied_registered.sort_unstable();
        pending.sort_unstable();
        Self::new(applied_registered, pending, missing)
    }

    /// Check if all migrations are applied
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        self.pending_count == 0
    }

    /// Get the latest applied migration version
    #[must_use]
    pub fn latest_applied_version(&self) -> Option<i64> {
        self.applied.iter().copied().max()
    }

    /// Get the next pending migration version
    #[must_use]
    pub fn next_pending_version(&self) -> Option<i64> {
        self.pending.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare() {
        let status = MigrationStatus::compare(&[1, 2, 3, 4], &[9, 1, 3]);
        assert_eq!(status.applied, vec![1, 3]);
        assert_eq!(status.pending, vec![2, 4]);
        assert_eq!(status.missing, vec![9]);
        assert_eq!(status.applied_count, 2);
        assert_eq!(status.latest_applied_version(), Some(3));
        assert_eq!(status.next_pending_version(), Some(2));
        assert!(!status.is_up_to_date());
    }

    #[test]
    fn test_up_to_date() {
        let status = MigrationStatus::compare(&[1], &[1]);
        assert!(status.is_up_to_date());
        assert!(status.missing.is_empty());
    }
}
