/// Roster-wide completion counts for a carômetro session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CarometerProgress {
    pub total: usize,
    pub drafted: usize,
    pub finalized: usize,
    pub pending: usize,
}

impl CarometerProgress {
    /// Every roster student has a finalized record.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.finalized == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_roster_is_never_complete() {
        assert!(!CarometerProgress::default().is_complete());
    }

    #[test]
    fn complete_when_all_finalized() {
        let progress = CarometerProgress {
            total: 2,
            finalized: 2,
            ..CarometerProgress::default()
        };
        assert!(progress.is_complete());
    }
}
