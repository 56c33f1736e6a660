//! Memory budget.

use crate::error::SortError;

/// Share of the memory budget (in percent) used for raw line bytes of a single partition.
/// The rest covers string allocation overhead, sort workspace and unrelated system activity.
pub const PARTITION_SHARE_PERCENT: u64 = 40;

/// Caller supplied memory ceiling for a sort run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryBudget {
    bytes: u64,
}

impl MemoryBudget {
    /// Creates a memory budget of `bytes` bytes.
    ///
    /// A budget that leaves no room for line data in a partition is rejected.
    pub fn new(bytes: u64) -> Result<Self, SortError> {
        if bytes == 0 {
            return Err(SortError::InvalidBudget {
                budget: bytes,
                reason: "must be positive",
            });
        }

        let budget = MemoryBudget { bytes };
        if budget.chunk_byte_limit() == 0 {
            return Err(SortError::InvalidBudget {
                budget: bytes,
                reason: "partition threshold rounds down to zero bytes",
            });
        }

        Ok(budget)
    }

    /// Returns the budget in bytes.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Returns the number of line bytes a partition accumulates before it is spilled.
    pub fn chunk_byte_limit(&self) -> u64 {
        (u128::from(self.bytes) * u128::from(PARTITION_SHARE_PERCENT) / 100) as u64
    }
}

#[cfg(test)]
mod test {
    use rstest::*;

    use super::MemoryBudget;
    use crate::SortError;

    #[rstest]
    #[case(25, 10)]
    #[case(1024, 409)]
    #[case(16_777_216, 6_710_886)]
    #[case(3, 1)]
    #[case(u64::MAX, 7_378_697_629_483_820_646)]
    fn test_chunk_byte_limit(#[case] bytes: u64, #[case] expected: u64) {
        let budget = MemoryBudget::new(bytes).unwrap();
        assert_eq!(budget.bytes(), bytes);
        assert_eq!(budget.chunk_byte_limit(), expected);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(2)]
    fn test_unusable_budget_rejected(#[case] bytes: u64) {
        match MemoryBudget::new(bytes) {
            Err(SortError::InvalidBudget { budget, .. }) => assert_eq!(budget, bytes),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
