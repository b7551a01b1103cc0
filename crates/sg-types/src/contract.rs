use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Contract types held in an ALM book
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    Loan,
    Deposit,
    Bond,
    Swap,
    Forward,
    Option,
    Facility,
}

impl ContractType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::Loan => "loan",
            ContractType::Deposit => "deposit",
            ContractType::Bond => "bond",
            ContractType::Swap => "swap",
            ContractType::Forward => "forward",
            ContractType::Option => "option",
            ContractType::Facility => "facility",
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A position in the portfolio.
///
/// The `linked_*` and `counterparty_id` fields are lookup keys into the
/// universe, not owned data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub contract_id: String,
    pub contract_type: ContractType,
    pub currency: String,
    #[serde(default)]
    pub notional: Option<Decimal>,
    pub maturity_date: NaiveDate,
    #[serde(default)]
    pub linked_yield_curve: Option<String>,
    #[serde(default)]
    pub linked_spread_curve: Option<String>,
    #[serde(default)]
    pub linked_fx_pair: Option<String>,
    #[serde(default)]
    pub linked_equity: Option<String>,
    #[serde(default)]
    pub counterparty_id: Option<String>,
    #[serde(default = "default_is_asset")]
    pub is_asset: bool,
    /// Fixed rate in percent, if applicable.
    #[serde(default)]
    pub rate: Option<f64>,
}

fn default_is_asset() -> bool {
    true
}

impl Contract {
    pub fn new(
        contract_id: &str,
        contract_type: ContractType,
        currency: &str,
        notional: Decimal,
        maturity_date: NaiveDate,
    ) -> Self {
        Self {
            contract_id: contract_id.to_string(),
            contract_type,
            currency: currency.to_string(),
            notional: Some(notional),
            maturity_date,
            linked_yield_curve: None,
            linked_spread_curve: None,
            linked_fx_pair: None,
            linked_equity: None,
            counterparty_id: None,
            is_asset: true,
            rate: None,
        }
    }

    pub fn liability(mut self) -> Self {
        self.is_asset = false;
        self
    }

    pub fn with_yield_curve(mut self, factor_id: &str) -> Self {
        self.linked_yield_curve = Some(factor_id.to_string());
        self
    }

    pub fn with_spread_curve(mut self, factor_id: &str) -> Self {
        self.linked_spread_curve = Some(factor_id.to_string());
        self
    }

    pub fn with_counterparty(mut self, counterparty_id: &str) -> Self {
        self.counterparty_id = Some(counterparty_id.to_string());
        self
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    /// Notional signed by side: positive for assets, negative for liabilities.
    /// A missing notional contributes zero.
    pub fn signed_notional(&self) -> Decimal {
        let notional = self.notional.unwrap_or(Decimal::ZERO);
        if self.is_asset {
            notional
        } else {
            -notional
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn maturity() -> NaiveDate {
        NaiveDate::from_ymd_opt(2027, 12, 31).unwrap()
    }

    #[test]
    fn test_signed_notional() {
        let loan = Contract::new("LOAN001", ContractType::Loan, "CHF", dec!(10000000), maturity());
        assert_eq!(loan.signed_notional(), dec!(10000000));

        let deposit = Contract::new("DEP001", ContractType::Deposit, "CHF", dec!(8000000), maturity()).liability();
        assert_eq!(deposit.signed_notional(), dec!(-8000000));
    }

    #[test]
    fn test_missing_notional_counts_as_zero() {
        let json = r#"{
            "contract_id": "SWAP9",
            "contract_type": "swap",
            "currency": "EUR",
            "maturity_date": "2030-06-30"
        }"#;
        let contract: Contract = serde_json::from_str(json).unwrap();
        assert!(contract.is_asset);
        assert_eq!(contract.notional, None);
        assert_eq!(contract.signed_notional(), Decimal::ZERO);
        assert_eq!(contract.contract_type.to_string(), "swap");
    }
}
