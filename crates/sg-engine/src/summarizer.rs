use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sg_types::{Contract, Counterparty, RiskFactor, RiskFactorData, RiskFactorKind};
use std::collections::BTreeMap;

/// Bounds on how much risk state goes into a prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryLimits {
    /// Counterparties listed individually before the "... and K more" tail
    pub max_counterparties: usize,
}

impl Default for SummaryLimits {
    fn default() -> Self {
        Self { max_counterparties: 10 }
    }
}

/// Condenses a risk universe into short, bounded text blocks.
///
/// Each block starts with a header line. Empty inputs produce the header
/// alone. Absent numeric fields are left out of a factor's line and count as
/// zero in portfolio totals.
#[derive(Debug, Clone, Default)]
pub struct Summarizer {
    limits: SummaryLimits,
}

impl Summarizer {
    pub fn new(limits: SummaryLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &SummaryLimits {
        &self.limits
    }

    /// One line per factor, grouped by variant in a fixed order.
    pub fn summarize_risk_factors(&self, factors: &[RiskFactor]) -> String {
        let mut lines = vec!["RISK FACTORS:".to_string()];

        for kind in RiskFactorKind::ALL {
            let group: Vec<&RiskFactor> = factors.iter().filter(|f| f.kind() == kind).collect();
            if group.is_empty() {
                continue;
            }
            lines.push(format!("{}:", kind.as_str().to_uppercase()));
            lines.extend(group.into_iter().map(factor_line));
        }

        lines.join("\n")
    }

    pub fn summarize_counterparties(&self, counterparties: &[Counterparty]) -> String {
        let limit = self.limits.max_counterparties;
        let mut lines = vec!["COUNTERPARTIES:".to_string()];

        for cp in counterparties.iter().take(limit) {
            lines.push(format!(
                "  - {} ({}): Rating={}, PD={:.2}%, Recovery={:.0}%",
                cp.counterparty_id,
                cp.name,
                cp.rating,
                cp.pd * 100.0,
                cp.recovery_rate * 100.0
            ));
        }

        if counterparties.len() > limit {
            lines.push(format!(
                "  ... and {} more counterparties",
                counterparties.len() - limit
            ));
        }

        lines.join("\n")
    }

    /// Contract count, counts by type and net notional by currency
    /// (liabilities negative).
    pub fn summarize_portfolio(&self, contracts: &[Contract]) -> String {
        let mut lines = vec!["PORTFOLIO SUMMARY:".to_string()];
        if contracts.is_empty() {
            return lines.join("\n");
        }

        let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
        let mut by_currency: BTreeMap<&str, Decimal> = BTreeMap::new();
        for contract in contracts {
            *by_type.entry(contract.contract_type.as_str()).or_default() += 1;
            *by_currency.entry(contract.currency.as_str()).or_default() += contract.signed_notional();
        }

        let mut by_type: Vec<(&str, usize)> = by_type.into_iter().collect();
        by_type.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

        let mut by_currency: Vec<(&str, Decimal)> = by_currency.into_iter().collect();
        by_currency.sort_by(|a, b| b.1.abs().cmp(&a.1.abs()).then(a.0.cmp(b.0)));

        lines.push(format!("  Total contracts: {}", contracts.len()));
        lines.push("  By type:".to_string());
        for (contract_type, count) in by_type {
            lines.push(format!("    - {}: {}", contract_type, count));
        }
        lines.push("  Net notional by currency:".to_string());
        for (currency, notional) in by_currency {
            lines.push(format!("    - {}: {}", currency, group_thousands(notional)));
        }

        lines.join("\n")
    }
}

fn factor_line(factor: &RiskFactor) -> String {
    let id = &factor.factor_id;
    match &factor.data {
        RiskFactorData::YieldCurve { tenors, .. } => {
            let mut stats = Vec::new();
            if let Some(avg) = factor.curve_average() {
                stats.push(format!("avg rate = {:.2}%", avg));
            }
            stats.push(format!("tenors = {}", tenors.len()));
            format!("  - {}{}: {}", id, qualifiers(&[factor.currency.as_deref()]), stats.join(", "))
        }
        RiskFactorData::SpreadCurve { rating, .. } => {
            let head = format!(
                "  - {}{}",
                id,
                qualifiers(&[factor.currency.as_deref(), rating.as_deref()])
            );
            match factor.curve_average() {
                Some(avg) => format!("{}: avg spread = {:.0} bps", head, avg),
                None => head,
            }
        }
        RiskFactorData::FxRate { spot_rate, .. } => match spot_rate {
            Some(spot) => format!("  - {}: {:.4}", id, spot),
            None => format!("  - {}", id),
        },
        RiskFactorData::EquityIndex { current_level, .. } => match current_level {
            Some(level) => format!("  - {}: level = {:.2}", id, level),
            None => format!("  - {}", id),
        },
        RiskFactorData::MacroFactor {
            macro_type,
            current_value,
            unit,
        } => {
            let head = format!("  - {}{}", id, qualifiers(&[Some(macro_type.as_str())]));
            match current_value {
                Some(value) => format!("{}: {:.2}{}", head, value, unit),
                None => head,
            }
        }
    }
}

/// ` (a, b)` from the non-empty parts, or nothing.
fn qualifiers(parts: &[Option<&str>]) -> String {
    let present: Vec<&str> = parts
        .iter()
        .flatten()
        .copied()
        .filter(|p| !p.is_empty())
        .collect();
    if present.is_empty() {
        String::new()
    } else {
        format!(" ({})", present.join(", "))
    }
}

/// Whole units with comma thousands separators, e.g. `-8,000,000`.
pub(crate) fn group_thousands(amount: Decimal) -> String {
    let rounded = amount.round_dp(0);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
