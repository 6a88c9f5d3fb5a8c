use std::collections::BTreeMap;

use time::Month;

use crate::{
    transaction::{Transaction, TransactionWithCategory},
    transaction_type::TransactionType,
};

/// The income, expenses and their difference over a set of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub income: f64,
    pub expense: f64,
}

impl Totals {
    pub fn from_transactions<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        transactions
            .into_iter()
            .fold(Totals::default(), |mut totals, transaction| {
                totals.add(transaction);
                totals
            })
    }

    fn add(&mut self, transaction: &Transaction) {
        match transaction.transaction_type {
            TransactionType::Income => self.income += transaction.amount,
            TransactionType::Expense => self.expense += transaction.amount,
        }
    }

    pub fn balance(&self) -> f64 {
        self.income - self.expense
    }
}

/// Income and expenses for each calendar month.
///
/// Transactions are grouped on the month alone, so January 2023 and January 2024
/// land in the same bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySeries {
    months: [Totals; 12],
}

impl MonthlySeries {
    pub fn from_transactions<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let mut months = [Totals::default(); 12];

        for transaction in transactions {
            let index = u8::from(transaction.date.month()) as usize - 1;
            months[index].add(transaction);
        }

        Self { months }
    }

    /// The totals for each month, January first. Always 12 entries.
    pub fn entries(&self) -> impl Iterator<Item = (Month, Totals)> + '_ {
        let mut month = Month::December;

        self.months.iter().map(move |totals| {
            month = month.next();
            (month, *totals)
        })
    }

    pub fn income(&self) -> Vec<f64> {
        self.months.iter().map(|totals| totals.income).collect()
    }

    pub fn expense(&self) -> Vec<f64> {
        self.months.iter().map(|totals| totals.expense).collect()
    }

    pub fn balance(&self) -> Vec<f64> {
        self.months.iter().map(Totals::balance).collect()
    }
}

/// The total spent in one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryExpense {
    pub category_name: String,
    pub total: f64,
}

/// Sum the expenses per category name, ordered by name.
///
/// Income, uncategorised transactions and categories with nothing spent are left out.
pub fn expenses_by_category(transactions: &[TransactionWithCategory]) -> Vec<CategoryExpense> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();

    for row in transactions {
        if row.transaction.transaction_type != TransactionType::Expense {
            continue;
        }

        if let Some(category_name) = row.category_name.as_deref() {
            *totals.entry(category_name).or_default() += row.transaction.amount;
        }
    }

    totals
        .into_iter()
        .filter(|(_, total)| *total > 0.0)
        .map(|(category_name, total)| CategoryExpense {
            category_name: category_name.to_owned(),
            total,
        })
        .collect()
}
