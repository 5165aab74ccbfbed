//! Console rendering of a cycle's account records

use crate::types::AccountStats;
use chrono::Local;
use colored::{ColoredString, Colorize};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Clear screen and move the cursor home
const CLEAR_SCREEN: &str = "\x1B[2J\x1B[1;1H";

/// Last observed balance per account ID, kept for the life of the process
#[derive(Debug, Default)]
pub struct BalanceTracker {
    previous: HashMap<String, Decimal>,
}

impl BalanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `balance` for `id` and return the change since the last
    /// observation. The first observation of an ID returns zero.
    pub fn observe(&mut self, id: &str, balance: Decimal) -> Decimal {
        let previous = self
            .previous
            .insert(id.to_string(), balance)
            .unwrap_or(balance);
        balance - previous
    }

    pub fn previous(&self, id: &str) -> Option<Decimal> {
        self.previous.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.previous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }
}

/// Four decimals with an explicit sign, e.g. `+2.5000` or `-3.5000`
pub fn format_increment(increment: Decimal) -> String {
    let rounded = increment.round_dp(4);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("{:.4}", rounded)
    } else {
        format!("+{:.4}", rounded.abs())
    }
}

/// `format_increment` coloured by its printed sign, so a change that rounds to
/// zero stays green
fn styled_increment(increment: Decimal) -> ColoredString {
    let shown = format_increment(increment);
    if shown.starts_with('-') {
        shown.red()
    } else {
        shown.green()
    }
}

struct Column {
    title: &'static str,
    width: usize,
}

const ID: Column = Column { title: "ID", width: 10 };
const NICKNAME: Column = Column { title: "Nickname", width: 15 };
const BALANCE: Column = Column { title: "Balance", width: 18 };
const MINING_TIME: Column = Column { title: "Mining Time", width: 15 };
const PROXY: Column = Column { title: "Proxy", width: 24 };
const STATUS: Column = Column { title: "Status", width: 40 };

/// Renders the account table and the per-account increment block
#[derive(Debug)]
pub struct StatsDisplay {
    balances: BalanceTracker,
    show_proxy: bool,
}

impl StatsDisplay {
    pub fn new(show_proxy: bool) -> Self {
        Self {
            balances: BalanceTracker::new(),
            show_proxy,
        }
    }

    pub fn balances(&self) -> &BalanceTracker {
        &self.balances
    }

    /// Redraw the console for one cycle and update the balance cache
    pub fn render(&mut self, stats: &[AccountStats]) {
        print!("{}", CLEAR_SCREEN);
        println!(
            "Kiva bot | {} accounts | updated {}",
            stats.len(),
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        println!("{}", self.render_table(stats));

        let lines = self.record_increments(stats);
        if !lines.is_empty() {
            println!("\nBalance changes:");
            for line in lines {
                println!("  {}", line);
            }
        }
    }

    fn columns(&self) -> Vec<&'static Column> {
        let mut columns = vec![&ID, &NICKNAME, &BALANCE, &MINING_TIME];
        if self.show_proxy {
            columns.push(&PROXY);
        }
        columns.push(&STATUS);
        columns
    }

    /// Table text for `stats`, one row per account in input order
    pub fn render_table(&self, stats: &[AccountStats]) -> String {
        let columns = self.columns();
        let border = format!(
            "+{}+",
            columns
                .iter()
                .map(|c| "-".repeat(c.width))
                .collect::<Vec<_>>()
                .join("+")
        );

        let mut out = Vec::with_capacity(stats.len() + 4);
        out.push(border.clone());
        out.push(render_row(
            &columns,
            columns.iter().map(|c| c.title.bold().to_string()).collect(),
            columns.iter().map(|c| c.title.to_string()).collect(),
        ));
        out.push(border.clone());

        for account in stats {
            let mut cells = vec![
                or_na(account.id.as_deref()),
                or_na(account.nickname.as_deref()),
                or_na(account.balance.as_deref()),
                or_na(account.mining_time.as_deref()),
            ];
            if self.show_proxy {
                cells.push(or_na(account.proxy.as_deref()));
            }
            cells.push(account.status.to_string());

            let plain: Vec<String> = cells
                .iter()
                .zip(&columns)
                .map(|(cell, column)| fit(cell, column.width - 2))
                .collect();
            let mut styled = plain.clone();
            if let Some(status) = styled.last_mut() {
                *status = if account.status.is_error() {
                    status.red().to_string()
                } else {
                    status.green().to_string()
                };
            }

            out.push(render_row(&columns, styled, plain));
        }

        out.push(border);
        out.join("\n")
    }

    /// One increment line per account with an ID and a numeric balance.
    /// Updates the cache, so calling it twice for the same cycle reports zero
    /// the second time.
    pub fn record_increments(&mut self, stats: &[AccountStats]) -> Vec<String> {
        stats
            .iter()
            .filter_map(|account| {
                let id = account.id.as_deref()?;
                let balance = account.balance_value?;
                let increment = self.balances.observe(id, balance);
                let shown = styled_increment(increment);
                Some(format!(
                    "[{}] {}: {} (increment {})",
                    id,
                    account.nickname.as_deref().unwrap_or("N/A"),
                    account.balance.as_deref().unwrap_or("N/A"),
                    shown
                ))
            })
            .collect()
    }
}

/// `styled` is what gets printed, `plain` is used to compute padding
fn render_row(columns: &[&Column], styled: Vec<String>, plain: Vec<String>) -> String {
    let cells: Vec<String> = columns
        .iter()
        .zip(styled.iter().zip(&plain))
        .map(|(column, (styled, plain))| {
            let pad = (column.width - 2).saturating_sub(plain.chars().count());
            format!(" {}{} ", styled, " ".repeat(pad))
        })
        .collect();
    format!("|{}|", cells.join("|"))
}

fn or_na(value: Option<&str>) -> String {
    value.unwrap_or("N/A").to_string()
}

/// Truncate to `width` characters, marking the cut with an ellipsis
fn fit(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
