use speakwell_core::streak::StreakChange;

/// Streak lengths celebrated by default.
pub const DEFAULT_MILESTONES: [u32; 3] = [3, 7, 30];

/// Which streak lengths deserve a celebration.
///
/// The tracker only counts days; deciding what is worth celebrating is product
/// policy and lives here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestonePolicy {
    thresholds: Vec<u32>,
}

impl MilestonePolicy {
    /// Build a policy from any list of streak lengths.
    ///
    /// Zeros are dropped (0 means "no milestone" on the record) and the rest
    /// are sorted and deduplicated.
    #[must_use]
    pub fn new(thresholds: impl IntoIterator<Item = u32>) -> Self {
        let mut thresholds: Vec<u32> = thresholds.into_iter().filter(|t| *t > 0).collect();
        thresholds.sort_unstable();
        thresholds.dedup();
        Self { thresholds }
    }

    #[must_use]
    pub fn thresholds(&self) -> &[u32] {
        &self.thresholds
    }

    /// Highest threshold the streak reached with this change, if any.
    ///
    /// Only a continued streak can cross a threshold; a restart never does.
    #[must_use]
    pub fn crossed(&self, change: StreakChange) -> Option<u32> {
        let StreakChange::Continued { from, to } = change else {
            return None;
        };
        self.thresholds
            .iter()
            .rev()
            .find(|t| from < **t && **t <= to)
            .copied()
    }
}

impl Default for MilestonePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MILESTONES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_when_streak_reaches_threshold() {
        let policy = MilestonePolicy::default();
        assert_eq!(policy.crossed(StreakChange::Continued { from: 2, to: 3 }), Some(3));
        assert_eq!(policy.crossed(StreakChange::Continued { from: 6, to: 7 }), Some(7));
        assert_eq!(policy.crossed(StreakChange::Continued { from: 3, to: 4 }), None);
    }

    #[test]
    fn restarts_and_same_day_events_never_fire() {
        let policy = MilestonePolicy::new([1, 3]);
        assert_eq!(policy.crossed(StreakChange::Restarted { from: 12 }), None);
        assert_eq!(policy.crossed(StreakChange::Unchanged), None);
    }

    #[test]
    fn normalizes_thresholds() {
        let policy = MilestonePolicy::new([30, 0, 7, 7, 3]);
        assert_eq!(policy.thresholds(), &[3, 7, 30]);
    }
}
