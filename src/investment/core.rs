//! Defines the investment model and its database queries.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use time::{Date, PrimitiveDateTime};

use crate::{Error, auth::UserID, transaction::validate_amount};

pub type InvestmentId = i64;

/// The status given to new investments.
pub const DEFAULT_INVESTMENT_STATUS: &str = "active";

/// The kinds of investment a user can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvestmentType {
    FixedDeposit,
    MutualFund,
    Share,
}

impl InvestmentType {
    pub const ALL: [InvestmentType; 3] = [
        InvestmentType::FixedDeposit,
        InvestmentType::MutualFund,
        InvestmentType::Share,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InvestmentType::FixedDeposit => "fixed_deposit",
            InvestmentType::MutualFund => "mutual_fund",
            InvestmentType::Share => "share",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InvestmentType::FixedDeposit => "Fixed Deposit",
            InvestmentType::MutualFund => "Mutual Fund",
            InvestmentType::Share => "Share",
        }
    }
}

impl Display for InvestmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvestmentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InvestmentType::ALL
            .into_iter()
            .find(|investment_type| investment_type.as_str() == s.trim())
            .ok_or_else(|| Error::InvalidInvestmentType(s.to_owned()))
    }
}

impl ToSql for InvestmentType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for InvestmentType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|_| FromSqlError::InvalidType)
    }
}

/// A record of money put into a fixed deposit, mutual fund or share.
#[derive(Debug, Clone, PartialEq)]
pub struct Investment {
    pub id: InvestmentId,
    pub user_id: UserID,
    pub name: String,
    pub investment_type: InvestmentType,
    /// The value used in summaries. For mutual funds and shares this is the current value.
    pub amount: f64,
    pub units: Option<f64>,
    pub purchase_price: Option<f64>,
    pub current_value: Option<f64>,
    pub maturity_date: Option<Date>,
    pub interest_rate: Option<f64>,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

/// The fields specific to each kind of investment.
#[derive(Debug, Clone, PartialEq)]
pub enum InvestmentDetails {
    FixedDeposit {
        amount: f64,
        /// Percent per year.
        interest_rate: f64,
        maturity_date: Option<Date>,
    },
    MutualFund {
        units: f64,
        /// The net asset value per unit when bought.
        nav: f64,
        current_value: f64,
    },
    Share {
        quantity: f64,
        price: f64,
        total_value: f64,
    },
}

impl InvestmentDetails {
    pub fn investment_type(&self) -> InvestmentType {
        match self {
            InvestmentDetails::FixedDeposit { .. } => InvestmentType::FixedDeposit,
            InvestmentDetails::MutualFund { .. } => InvestmentType::MutualFund,
            InvestmentDetails::Share { .. } => InvestmentType::Share,
        }
    }
}

/// The fields needed to record an investment.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvestment {
    pub name: String,
    pub notes: Option<String>,
    pub details: InvestmentDetails,
}

/// The value held in each kind of investment.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InvestmentTotals {
    /// The sum of the fixed deposit amounts.
    pub fixed_deposits: f64,
    /// The sum of the current value of each mutual fund.
    pub mutual_funds: f64,
    /// The sum of the current value of each share holding.
    pub shares: f64,
}

impl InvestmentTotals {
    pub fn from_investments<'a>(investments: impl IntoIterator<Item = &'a Investment>) -> Self {
        let mut totals = InvestmentTotals::default();

        for investment in investments {
            match investment.investment_type {
                InvestmentType::FixedDeposit => totals.fixed_deposits += investment.amount,
                InvestmentType::MutualFund => {
                    totals.mutual_funds += investment.current_value.unwrap_or_default()
                }
                InvestmentType::Share => {
                    totals.shares += investment.current_value.unwrap_or_default()
                }
            }
        }

        totals
    }

    pub fn total(&self) -> f64 {
        self.fixed_deposits + self.mutual_funds + self.shares
    }
}

pub fn create_investment_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS investment (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                investment_type TEXT NOT NULL,
                amount REAL NOT NULL,
                units REAL,
                purchase_price REAL,
                current_value REAL,
                maturity_date TEXT,
                interest_rate REAL,
                notes TEXT,
                status TEXT NOT NULL DEFAULT 'active',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

const INVESTMENT_COLUMNS: &str = "id, user_id, name, investment_type, amount, units, \
    purchase_price, current_value, maturity_date, interest_rate, notes, status, created_at, \
    updated_at";

fn map_investment_row(row: &Row) -> Result<Investment, rusqlite::Error> {
    Ok(Investment {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        investment_type: row.get(3)?,
        amount: row.get(4)?,
        units: row.get(5)?,
        purchase_price: row.get(6)?,
        current_value: row.get(7)?,
        maturity_date: row.get(8)?,
        interest_rate: row.get(9)?,
        notes: row.get(10)?,
        status: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn validate_quantity(value: f64) -> Result<f64, Error> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(Error::InvalidAmount(value.to_string()))
    }
}

/// Record an investment owned by `user_id`.
///
/// Fixed deposits need a positive amount. The other numbers may be zero but not negative.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyInvestmentName] if the name is blank,
/// - [Error::InvalidAmount] if one of the numbers is out of range,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_investment(
    new_investment: NewInvestment,
    user_id: UserID,
    now: PrimitiveDateTime,
    connection: &Connection,
) -> Result<Investment, Error> {
    let name = new_investment.name.trim();
    if name.is_empty() {
        return Err(Error::EmptyInvestmentName);
    }

    let notes = new_investment
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|notes| !notes.is_empty());
    let investment_type = new_investment.details.investment_type();

    let (amount, units, purchase_price, current_value, maturity_date, interest_rate) =
        match new_investment.details {
            InvestmentDetails::FixedDeposit {
                amount,
                interest_rate,
                maturity_date,
            } => (
                validate_amount(amount)?,
                None,
                None,
                None,
                maturity_date,
                Some(validate_quantity(interest_rate)?),
            ),
            InvestmentDetails::MutualFund {
                units,
                nav,
                current_value,
            } => (
                validate_quantity(current_value)?,
                Some(validate_quantity(units)?),
                Some(validate_quantity(nav)?),
                Some(current_value),
                None,
                None,
            ),
            InvestmentDetails::Share {
                quantity,
                price,
                total_value,
            } => (
                validate_quantity(total_value)?,
                Some(validate_quantity(quantity)?),
                Some(validate_quantity(price)?),
                Some(total_value),
                None,
                None,
            ),
        };

    let investment = connection
        .prepare(&format!(
            "INSERT INTO investment
                (user_id, name, investment_type, amount, units, purchase_price, current_value,
                maturity_date, interest_rate, notes, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
             RETURNING {INVESTMENT_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![
                user_id,
                name,
                investment_type,
                amount,
                units,
                purchase_price,
                current_value,
                maturity_date,
                interest_rate,
                notes,
                DEFAULT_INVESTMENT_STATUS,
                now,
            ],
            map_investment_row,
        )?;

    Ok(investment)
}

/// Get the investments owned by `user_id`, oldest first.
pub fn get_investments_for_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Investment>, Error> {
    connection
        .prepare(&format!(
            "SELECT {INVESTMENT_COLUMNS} FROM investment WHERE user_id = :user_id ORDER BY id ASC"
        ))?
        .query_map(&[(":user_id", &user_id)], map_investment_row)?
        .map(|maybe_investment| maybe_investment.map_err(|error| error.into()))
        .collect()
}
