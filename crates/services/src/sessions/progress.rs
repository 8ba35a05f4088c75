/// Progress of a generation batch, emitted after every produced question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub completed: u32,
    pub total: u32,
}

impl BatchProgress {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }

    /// Completion as a whole percentage, for progress bars.
    #[must_use]
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 100;
        }
        let pct = u64::from(self.completed.min(self.total)) * 100 / u64::from(self.total);
        u32::try_from(pct).unwrap_or(100)
    }
}
