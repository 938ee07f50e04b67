//! Chart generation and rendering for the dashboard.
//!
//! This module creates ECharts visualizations from the analytics snapshot:
//! - **Monthly Expenses Chart**: Expenses for each month of the selected year
//! - **Category Chart**: The share of each category in the filtered totals
//!
//! Each chart is generated as JSON configuration for the ECharts library and
//! rendered with corresponding HTML containers and JavaScript initialization code.

use std::collections::BTreeMap;

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger},
    series::{Pie, bar},
};
use maud::{Markup, PreEscaped, html};

use crate::{analytics::MonthlyTotal, html::HeadElement};

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the HTML containers for dashboard charts.
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

/// Generates JavaScript initialization code for dashboard charts.
///
/// Creates scripts that initialize ECharts instances with dark mode support
/// and responsive resizing.
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

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
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

pub(super) fn monthly_expenses_chart(monthly_series: &[MonthlyTotal], year: i32) -> Chart {
    let labels: Vec<String> = monthly_series
        .iter()
        .map(|month| month.label.clone())
        .collect();
    let values: Vec<f64> = monthly_series.iter().map(|month| month.amount).collect();

    Chart::new()
        .title(
            Title::new()
                .text("Monthly Expenses")
                .subtext(year.to_string()),
        )
        .tooltip(currency_tooltip())
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(bar::Bar::new().name("Expenses").data(values))
}

pub(super) fn category_chart(category_totals: &BTreeMap<String, f64>) -> Chart {
    let mut data: Vec<(f64, &str)> = category_totals
        .iter()
        .filter(|(_, amount)| **amount > 0.0)
        .map(|(category, amount)| (*amount, category.as_str()))
        .collect();
    data.sort_by(|a, b| b.0.total_cmp(&a.0));

    Chart::new()
        .title(Title::new().text("Categories").subtext("All time"))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .legend(Legend::new().left(20).top(60))
        .series(
            Pie::new()
                .name("Categories")
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

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}

#[cfg(test)]
mod charts_tests {
    use std::collections::BTreeMap;

    use crate::{
        analytics::MonthlyTotal,
        dashboard::charts::{category_chart, monthly_expenses_chart},
    };

    #[test]
    fn monthly_chart_has_a_bar_per_month() {
        let series: Vec<MonthlyTotal> = (1..=12)
            .map(|month| MonthlyTotal {
                month,
                label: format!("M{month}"),
                amount: f64::from(month),
            })
            .collect();

        let options = monthly_expenses_chart(&series, 2024).to_string();

        assert!(options.contains("Monthly Expenses"));
        assert!(options.contains("M12"));
        assert!(options.contains("2024"));
    }

    #[test]
    fn category_chart_skips_zero_totals() {
        let totals = BTreeMap::from([
            ("Food & Dining".to_owned(), 50.0),
            ("Travel".to_owned(), 0.0),
        ]);

        let options = category_chart(&totals).to_string();

        assert!(options.contains("Food & Dining"));
        assert!(!options.contains("Travel"));
    }
}
