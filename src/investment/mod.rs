//! Record keeping for fixed deposits, mutual funds and shares.

mod core;
mod create_endpoint;
mod investments_page;

pub use core::{
    DEFAULT_INVESTMENT_STATUS, Investment, InvestmentDetails, InvestmentId, InvestmentTotals,
    InvestmentType, NewInvestment, create_investment, create_investment_table,
    get_investments_for_user,
};
pub use create_endpoint::{CreateInvestmentState, InvestmentForm, create_investment_endpoint};
pub use investments_page::{InvestmentsPageState, get_investments_page};
