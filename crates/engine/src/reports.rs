//! Report aggregation.
//!
//! A [`ReportAnalyzer`] works on a snapshot of transactions and budgets and a
//! reference day. Every "current month" below is the month of that day.
//! Percentages are plain `f64` values in `0..=100` (more when over budget),
//! left unrounded for the caller to format.

use std::{cell::OnceCell, collections::BTreeMap, fmt};

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    budgets::{Budget, BudgetPeriod},
    transactions::{Movement, Transaction},
};

/// Color of the well-known categories in charts.
const CATEGORY_COLORS: [(&str, &str); 5] = [
    ("食費", "#FF6384"),
    ("交通費", "#36A2EB"),
    ("娯楽費", "#FFCE56"),
    ("生活費", "#4BC0C0"),
    ("その他", "#9966FF"),
];

pub const NEUTRAL_COLOR: &str = "#9E9E9E";

pub const TREND_MONTHS: u32 = 12;

/// Usage at or above this percentage is a warning.
pub const WARNING_THRESHOLD: f64 = 80.0;

/// Usage at or above this percentage is over budget.
pub const OVER_THRESHOLD: f64 = 100.0;

pub fn category_color(category: &str) -> &'static str {
    CATEGORY_COLORS
        .iter()
        .find(|(name, _)| *name == category)
        .map_or(NEUTRAL_COLOR, |(_, color)| *color)
}

/// A calendar month.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// The month `n` months before this one.
    pub fn minus(self, n: u32) -> Self {
        let index = self.year * 12 + self.month as i32 - 1 - n as i32;
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn days(self) -> u32 {
        self.first_day()
            .and_then(|first| first.checked_add_months(Months::new(1)))
            .and_then(|next| next.pred_opt())
            .map_or(0, |last| last.day())
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MonthTotals {
    pub expense: i64,
    pub income: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MonthlyPoint {
    pub month: MonthKey,
    pub expense: i64,
    pub income: i64,
    /// Sum of the monthly budgets; the same value for every month.
    pub budget: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategorySlice {
    pub category: String,
    pub amount: i64,
    pub percentage: f64,
    pub color: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    Safe,
    Warning,
    Over,
}

impl BudgetStatus {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= OVER_THRESHOLD {
            Self::Over
        } else if percentage >= WARNING_THRESHOLD {
            Self::Warning
        } else {
            Self::Safe
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Warning => "warning",
            Self::Over => "over",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BudgetUsage {
    pub budget_id: Uuid,
    pub budget_name: String,
    pub budget_amount: i64,
    pub spent: i64,
    /// Negative when over budget.
    pub remaining: i64,
    pub percentage: f64,
    pub status: BudgetStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DailyPoint {
    pub day: u32,
    pub amount: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MonthAmount {
    pub month: MonthKey,
    pub amount: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AdvanceReport {
    pub total: i64,
    pub count: usize,
    /// Ascending by month.
    pub monthly: Vec<MonthAmount>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct StatsSummary {
    pub this_month_total: i64,
    pub last_month_total: i64,
    pub change_percentage: f64,
    pub avg_daily_expense: f64,
    pub total_budget: i64,
    pub budget_usage_percentage: f64,
}

fn percentage(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

pub struct ReportAnalyzer<'a> {
    transactions: &'a [Transaction],
    budgets: &'a [Budget],
    today: NaiveDate,
    totals: OnceCell<BTreeMap<MonthKey, MonthTotals>>,
}

impl<'a> ReportAnalyzer<'a> {
    pub fn new(transactions: &'a [Transaction], budgets: &'a [Budget], today: NaiveDate) -> Self {
        Self {
            transactions,
            budgets,
            today,
            totals: OnceCell::new(),
        }
    }

    pub fn current_month(&self) -> MonthKey {
        MonthKey::of(self.today)
    }

    /// Expense and income per month, computed once.
    fn totals(&self) -> &BTreeMap<MonthKey, MonthTotals> {
        self.totals.get_or_init(|| {
            let mut totals: BTreeMap<MonthKey, MonthTotals> = BTreeMap::new();
            for tx in self.transactions {
                let entry = totals.entry(MonthKey::of(tx.date)).or_default();
                match tx.movement {
                    Movement::Expense { .. } => {
                        entry.expense = entry.expense.saturating_add(tx.amount)
                    }
                    Movement::Income { .. } => entry.income = entry.income.saturating_add(tx.amount),
                    Movement::Transfer { .. } => {}
                }
            }
            totals
        })
    }

    fn month_totals(&self, month: MonthKey) -> MonthTotals {
        self.totals().get(&month).copied().unwrap_or_default()
    }

    fn expenses_in(&self, month: MonthKey) -> impl Iterator<Item = &'a Transaction> + '_ {
        self.transactions
            .iter()
            .filter(move |tx| tx.is_expense() && MonthKey::of(tx.date) == month)
    }

    /// The last 12 months, oldest first, ending with the current month.
    pub fn monthly_trend(&self) -> Vec<MonthlyPoint> {
        let budget = self
            .budgets
            .iter()
            .filter(|budget| budget.period == BudgetPeriod::Monthly)
            .map(|budget| budget.amount)
            .fold(0, i64::saturating_add);
        let current = self.current_month();

        (0..TREND_MONTHS)
            .rev()
            .map(|back| {
                let month = current.minus(back);
                let totals = self.month_totals(month);
                MonthlyPoint {
                    month,
                    expense: totals.expense,
                    income: totals.income,
                    budget,
                }
            })
            .collect()
    }

    /// Expenses of the current month per category, largest first.
    pub fn category_breakdown(&self) -> Vec<CategorySlice> {
        let mut per_category: BTreeMap<&str, i64> = BTreeMap::new();
        for tx in self.expenses_in(self.current_month()) {
            let amount = per_category.entry(tx.category().unwrap_or_default()).or_default();
            *amount = amount.saturating_add(tx.amount);
        }
        let total = per_category.values().copied().fold(0, i64::saturating_add);

        let mut slices: Vec<CategorySlice> = per_category
            .into_iter()
            .map(|(category, amount)| CategorySlice {
                category: category.to_string(),
                amount,
                percentage: percentage(amount, total),
                color: category_color(category),
            })
            .collect();
        // Stable sort: ties stay in category name order.
        slices.sort_by(|a, b| b.amount.cmp(&a.amount));
        slices
    }

    /// Current-month usage of every budget. An expense counts against a
    /// budget when it references the budget or shares its category.
    pub fn budget_analysis(&self) -> Vec<BudgetUsage> {
        let month = self.current_month();
        self.budgets
            .iter()
            .map(|budget| {
                let spent = self
                    .expenses_in(month)
                    .filter(|tx| {
                        tx.budget_id == Some(budget.id)
                            || tx.category() == Some(budget.category.as_str())
                    })
                    .map(|tx| tx.amount)
                    .fold(0, i64::saturating_add);
                let percentage = percentage(spent, budget.amount);
                BudgetUsage {
                    budget_id: budget.id,
                    budget_name: budget.name.clone(),
                    budget_amount: budget.amount,
                    spent,
                    remaining: budget.amount.saturating_sub(spent),
                    percentage,
                    status: BudgetStatus::from_percentage(percentage),
                }
            })
            .collect()
    }

    /// Expenses per day of the current month, zero filled.
    pub fn daily_trend(&self) -> Vec<DailyPoint> {
        let month = self.current_month();
        let mut per_day = vec![0i64; month.days() as usize];
        for tx in self.expenses_in(month) {
            if let Some(slot) = per_day.get_mut(tx.date.day0() as usize) {
                *slot = slot.saturating_add(tx.amount);
            }
        }
        per_day
            .into_iter()
            .zip(1..)
            .map(|(amount, day)| DailyPoint { day, amount })
            .collect()
    }

    /// Advances of any kind, over all time.
    pub fn advance_analysis(&self) -> AdvanceReport {
        let mut report = AdvanceReport::default();
        let mut per_month: BTreeMap<MonthKey, i64> = BTreeMap::new();
        for tx in self.transactions.iter().filter(|tx| tx.is_advance()) {
            report.total = report.total.saturating_add(tx.amount);
            report.count += 1;
            let amount = per_month.entry(MonthKey::of(tx.date)).or_default();
            *amount = amount.saturating_add(tx.amount);
        }
        report.monthly = per_month
            .into_iter()
            .map(|(month, amount)| MonthAmount { month, amount })
            .collect();
        report
    }

    pub fn stats_summary(&self) -> StatsSummary {
        let current = self.current_month();
        let this_month_total = self.month_totals(current).expense;
        let last_month_total = self.month_totals(current.minus(1)).expense;
        let total_budget = self
            .budgets
            .iter()
            .map(|budget| budget.amount)
            .fold(0, i64::saturating_add);

        StatsSummary {
            this_month_total,
            last_month_total,
            change_percentage: percentage(
                this_month_total.saturating_sub(last_month_total),
                last_month_total,
            ),
            avg_daily_expense: this_month_total as f64 / f64::from(self.today.day()),
            total_budget,
            budget_usage_percentage: percentage(this_month_total, total_budget),
        }
    }
}
