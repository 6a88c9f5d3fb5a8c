/// How much of a budget has been spent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetProgress {
    pub spend: f64,
    /// The share of the budget spent, rounded down. May exceed 100.
    pub percent: u32,
    pub exceeded: bool,
}

impl BudgetProgress {
    /// Compare `spend` against a budget of `amount`.
    ///
    /// A budget with no amount always reports 0%, but is still exceeded by any spend.
    pub fn new(amount: f64, spend: f64) -> Self {
        let percent = if amount > 0.0 {
            (spend / amount * 100.0).floor().max(0.0) as u32
        } else {
            0
        };

        Self {
            spend,
            percent,
            exceeded: spend > amount,
        }
    }

    /// The percentage to use for the width of a progress bar.
    pub fn bar_width(&self) -> u32 {
        self.percent.min(100)
    }
}

#[cfg(test)]
mod budget_progress_tests {
    use super::BudgetProgress;

    #[test]
    fn under_budget() {
        let progress = BudgetProgress::new(1000.0, 250.0);

        assert_eq!(progress.percent, 25);
        assert!(!progress.exceeded);
    }

    #[test]
    fn over_budget() {
        let progress = BudgetProgress::new(1000.0, 1200.0);

        assert_eq!(progress.percent, 120);
        assert!(progress.exceeded);
        assert_eq!(progress.bar_width(), 100);
    }

    #[test]
    fn percent_is_rounded_down() {
        assert_eq!(BudgetProgress::new(3.0, 2.0).percent, 66);
    }

    #[test]
    fn exactly_on_budget_is_not_exceeded() {
        let progress = BudgetProgress::new(500.0, 500.0);

        assert_eq!(progress.percent, 100);
        assert!(!progress.exceeded);
    }

    #[test]
    fn zero_amount_is_zero_percent() {
        assert_eq!(BudgetProgress::new(0.0, 0.0).percent, 0);
        assert_eq!(BudgetProgress::new(0.0, 10.0).percent, 0);
    }
}
