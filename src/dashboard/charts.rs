//! ECharts configurations for the dashboard.
//!
//! Each chart is built with `charming` and serialized to the JSON options object
//! that ECharts expects. The page script then initializes one ECharts instance per
//! chart container.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger},
    series::{Bar, Line, Pie},
};
use maud::{Markup, PreEscaped, html};
use time::Month;

use crate::{
    aggregation::{CategoryExpense, MonthlySeries},
    html::HeadElement,
};

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

pub(super) fn charts_view(charts: &[DashboardChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Script that initializes an ECharts instance for each chart once the page loads.
pub(super) fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{}\n}});",
        script_content
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

/// Three letter month names, January first.
fn month_labels(series: &MonthlySeries) -> Vec<String> {
    series
        .entries()
        .map(|(month, _)| short_month_name(month).to_owned())
        .collect()
}

fn short_month_name(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

fn value_axis() -> Axis {
    Axis::new()
        .type_(AxisType::Value)
        .axis_label(AxisLabel::new().formatter(currency_formatter()))
}

fn grid() -> Grid {
    Grid::new()
        .left("3%")
        .right("4%")
        .bottom("3%")
        .top(80)
        .contain_label(true)
}

pub(super) fn income_expense_chart(series: &MonthlySeries) -> Chart {
    Chart::new()
        .title(Title::new().text("Income vs Expenses").subtext("By calendar month"))
        .tooltip(currency_tooltip())
        .legend(Legend::new().top("1%").right("4%"))
        .grid(grid())
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .data(month_labels(series)),
        )
        .y_axis(value_axis())
        .series(Bar::new().name("Income").data(series.income()))
        .series(Bar::new().name("Expenses").data(series.expense()))
}

pub(super) fn balance_chart(series: &MonthlySeries) -> Chart {
    Chart::new()
        .title(Title::new().text("Balance").subtext("Income minus expenses per month"))
        .tooltip(currency_tooltip())
        .grid(grid())
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .data(month_labels(series)),
        )
        .y_axis(value_axis())
        .series(Line::new().name("Balance").data(series.balance()))
}

pub(super) fn expenses_by_category_chart(expenses: &[CategoryExpense]) -> Chart {
    let data: Vec<(f64, &str)> = expenses
        .iter()
        .map(|expense| (expense.total, expense.category_name.as_str()))
        .collect();

    Chart::new()
        .title(Title::new().text("Expenses by Category"))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .legend(Legend::new().top("bottom"))
        .series(
            Pie::new()
                .name("Expenses")
                .radius(vec!["40%", "70%"])
                .data(data),
        )
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}

#[cfg(test)]
mod chart_tests {
    use time::macros::datetime;

    use crate::{
        aggregation::{CategoryExpense, MonthlySeries},
        auth::UserID,
        transaction::Transaction,
        transaction_type::TransactionType,
    };

    use super::{balance_chart, expenses_by_category_chart, income_expense_chart, month_labels};

    fn series() -> MonthlySeries {
        let transactions = [
            Transaction {
                id: 1,
                user_id: UserID::new(1),
                category_id: None,
                amount: 100.0,
                transaction_type: TransactionType::Income,
                note: None,
                date: datetime!(2024-03-05 10:00),
                is_recurring: false,
                frequency: None,
                next_date: None,
            },
            Transaction {
                id: 2,
                user_id: UserID::new(1),
                category_id: None,
                amount: 40.0,
                transaction_type: TransactionType::Expense,
                note: None,
                date: datetime!(2024-03-06 10:00),
                is_recurring: false,
                frequency: None,
                next_date: None,
            },
        ];

        MonthlySeries::from_transactions(&transactions)
    }

    #[test]
    fn month_labels_cover_the_year() {
        let labels = month_labels(&series());

        assert_eq!(labels.len(), 12);
        assert_eq!(labels[0], "Jan");
        assert_eq!(labels[11], "Dec");
    }

    #[test]
    fn charts_serialize_series_names() {
        let series = series();

        let income_expense = income_expense_chart(&series).to_string();
        assert!(income_expense.contains("\"Income\""));
        assert!(income_expense.contains("\"Expenses\""));

        let balance = balance_chart(&series).to_string();
        assert!(balance.contains("\"Balance\""));

        let pie = expenses_by_category_chart(&[CategoryExpense {
            category_name: "Food".to_owned(),
            total: 40.0,
        }])
        .to_string();
        assert!(pie.contains("\"Food\""));
    }
}
