use crate::error::ChatError;

/// Default maximum number of completion requests per orchestration run.
pub const DEFAULT_CALL_CEILING: u32 = 30;

/// Bounded counter of completion requests issued during one run.
///
/// Checked before every transport call and recorded after; this is the
/// liveness safeguard when the model never stops requesting tools.
#[derive(Debug, Clone)]
pub struct CallBudget {
    calls_made: u32,
    ceiling: u32,
}

impl CallBudget {
    pub fn new(ceiling: u32) -> Self {
        Self {
            calls_made: 0,
            ceiling,
        }
    }

    /// Deny before the ceiling would be exceeded.
    pub fn check(&self) -> Result<(), ChatError> {
        if self.calls_made >= self.ceiling {
            return Err(ChatError::BudgetExceeded {
                ceiling: self.ceiling,
            });
        }
        Ok(())
    }

    /// Record a completed request. Counter is monotonic within a run.
    pub fn record_call(&mut self) {
        self.calls_made += 1;
    }

    pub fn calls_made(&self) -> u32 {
        self.calls_made
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    pub fn set_ceiling(&mut self, ceiling: u32) {
        self.ceiling = ceiling;
    }
}

impl Default for CallBudget {
    fn default() -> Self {
        Self::new(DEFAULT_CALL_CEILING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denies_at_ceiling() {
        let mut budget = CallBudget::new(2);
        budget.check().unwrap();
        budget.record_call();
        budget.check().unwrap();
        budget.record_call();

        let err = budget.check().unwrap_err();
        assert!(matches!(err, ChatError::BudgetExceeded { ceiling: 2 }));
        assert_eq!(budget.calls_made(), 2);
    }

    #[test]
    fn default_ceiling() {
        let budget = CallBudget::default();
        assert_eq!(budget.ceiling(), DEFAULT_CALL_CEILING);
    }
}
