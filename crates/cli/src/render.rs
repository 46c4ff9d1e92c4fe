//! Text table and bar chart of a distribution.
//!
//! One line per outcome: the right-aligned key, its percentage (or raw
//! count), then a bar of `bar_char` proportional to the percentage.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use dicedist_eval::{DiceTuple, Distribution};

use crate::config::{DisplayConfig, SortOrder};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RenderOptions {
    pub bar_size: usize,
    pub bar_char: String,
    pub bar_prefix: String,
    pub decimal_places: usize,
    pub sort: SortOrder,
    pub show_counts: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            bar_size: 2,
            bar_char: "=".to_string(),
            bar_prefix: "|".to_string(),
            decimal_places: 2,
            sort: SortOrder::Key,
            show_counts: false,
        }
    }
}

impl RenderOptions {
    /// Defaults overridden by the config file.
    pub(crate) fn from_config(display: &DisplayConfig) -> Self {
        let defaults = RenderOptions::default();
        RenderOptions {
            bar_size: display.bar_size.unwrap_or(defaults.bar_size),
            bar_char: display.bar_char.clone().unwrap_or(defaults.bar_char),
            bar_prefix: display.bar_prefix.clone().unwrap_or(defaults.bar_prefix),
            decimal_places: display.decimal_places.unwrap_or(defaults.decimal_places),
            sort: display.sort.unwrap_or(defaults.sort),
            show_counts: display.show_counts.unwrap_or(defaults.show_counts),
        }
    }
}

fn percent(count: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        return Decimal::ZERO;
    }
    count
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(total))
        .unwrap_or_else(|| {
            count
                .checked_div(total)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .unwrap_or(Decimal::ZERO)
        })
}

fn fixed(value: Decimal, places: usize) -> String {
    let dp = u32::try_from(places).unwrap_or(u32::MAX).min(28);
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven);
    format!("{:.*}", places, rounded)
}

pub(crate) fn render(distribution: &Distribution, options: &RenderOptions) -> Vec<String> {
    let total = distribution.total();
    let entries: Vec<(&DiceTuple, &Decimal)> = match options.sort {
        SortOrder::Key => distribution.iter().collect(),
        SortOrder::Value => distribution.by_value(),
    };

    let digits = entries
        .iter()
        .flat_map(|(key, _)| key.iter())
        .map(|v| v.to_string().len())
        .max()
        .unwrap_or(0);
    let arity = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let key_width = arity * digits + arity.saturating_sub(1);

    let integral = distribution.is_integral();
    let count_text = |count: Decimal| {
        if integral {
            count.trunc().to_string()
        } else {
            fixed(count, options.decimal_places)
        }
    };
    let count_width = entries
        .iter()
        .map(|(_, count)| count_text(**count).len())
        .max()
        .unwrap_or(0);
    let percent_width = "100.".len() + options.decimal_places;

    entries
        .into_iter()
        .map(|(key, count)| {
            let key_text = key
                .iter()
                .map(|v| format!("{v:>digits$}"))
                .collect::<Vec<_>>()
                .join(",");
            let share = percent(*count, total);
            let value_text = if options.show_counts {
                format!("{:>count_width$}", count_text(*count))
            } else {
                format!("{:>percent_width$} %", fixed(share, options.decimal_places))
            };
            let bar = if options.bar_size > 0 {
                let length = share
                    .checked_mul(Decimal::from(options.bar_size))
                    .and_then(|n| n.floor().to_usize())
                    .unwrap_or(0);
                format!("{}{}", options.bar_prefix, options.bar_char.repeat(length))
            } else {
                String::new()
            };
            format!("{key_text:>key_width$}: {value_text} {bar}")
                .trim_end()
                .to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(entries: &[(&[i64], i64)]) -> Distribution {
        entries
            .iter()
            .map(|(k, v)| (k.to_vec(), Decimal::from(*v)))
            .collect()
    }

    #[test]
    fn percentages_with_bars() {
        let d = dist(&[(&[1], 1), (&[2], 3)]);
        let lines = render(&d, &RenderOptions::default());
        assert_eq!(lines[0], format!("1:  25.00 % |{}", "=".repeat(50)));
        assert_eq!(lines[1], format!("2:  75.00 % |{}", "=".repeat(150)));
    }

    #[test]
    fn keys_align_by_widest_element() {
        let d = dist(&[(&[1, 10], 1), (&[-3, 2], 1)]);
        let options = RenderOptions {
            bar_size: 0,
            ..RenderOptions::default()
        };
        assert_eq!(
            render(&d, &options),
            vec!["-3, 2:  50.00 %", " 1,10:  50.00 %"]
        );
    }

    #[test]
    fn counts_sorted_by_value() {
        let d = dist(&[(&[1], 7), (&[2], 10), (&[3], 7)]);
        let options = RenderOptions {
            bar_size: 0,
            show_counts: true,
            sort: SortOrder::Value,
            ..RenderOptions::default()
        };
        assert_eq!(render(&d, &options), vec!["1:  7", "3:  7", "2: 10"]);
    }

    #[test]
    fn fractional_counts_use_decimal_places() {
        let mut d = Distribution::new();
        d.add(vec![1], Decimal::new(15, 1));
        d.add(vec![2], Decimal::new(5, 1));
        let options = RenderOptions {
            bar_size: 0,
            show_counts: true,
            decimal_places: 1,
            ..RenderOptions::default()
        };
        assert_eq!(render(&d, &options), vec!["1: 1.5", "2: 0.5"]);
    }

    #[test]
    fn custom_bar_and_precision() {
        let d = dist(&[(&[0], 1), (&[1], 2)]);
        let options = RenderOptions {
            bar_size: 1,
            bar_char: "#".to_string(),
            bar_prefix: String::new(),
            decimal_places: 3,
            ..RenderOptions::default()
        };
        let lines = render(&d, &options);
        assert_eq!(lines[0], format!("0:  33.333 % {}", "#".repeat(33)));
        assert_eq!(lines[1], format!("1:  66.667 % {}", "#".repeat(66)));
    }

    #[test]
    fn config_overrides_defaults() {
        let display = DisplayConfig {
            bar_size: Some(0),
            sort: Some(SortOrder::Value),
            ..DisplayConfig::default()
        };
        let options = RenderOptions::from_config(&display);
        assert_eq!(options.bar_size, 0);
        assert_eq!(options.sort, SortOrder::Value);
        assert_eq!(options.bar_char, "=");
    }

    #[test]
    fn empty_distribution_renders_nothing() {
        assert!(render(&Distribution::new(), &RenderOptions::default()).is_empty());
    }
}
