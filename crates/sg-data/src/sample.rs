use chrono::NaiveDate;
use rust_decimal::Decimal;
use sg_types::{
    internal_error, Contract, ContractType, Counterparty, RiskFactor, RiskUniverse, SgResult,
};

fn date(year: i32, month: u32, day: u32) -> SgResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| internal_error!("invalid sample date {}-{}-{}", year, month, day))
}

/// Small CHF-centred demo universe used for demos and tests.
pub fn sample_universe() -> SgResult<RiskUniverse> {
    let swap_tenors = ["1M", "3M", "6M", "1Y", "2Y", "5Y", "10Y", "30Y"];
    let spread_tenors = ["1Y", "2Y", "5Y", "10Y"];

    let risk_factors = vec![
        RiskFactor::yield_curve("CHF_SWAP", "CHF", &swap_tenors, &[1.5, 1.6, 1.7, 1.9, 2.1, 2.5, 2.8, 3.0])
            .with_description("CHF Swap Curve"),
        RiskFactor::yield_curve("EUR_SWAP", "EUR", &swap_tenors, &[3.5, 3.6, 3.7, 3.8, 3.9, 4.0, 4.1, 4.2])
            .with_description("EUR Swap Curve"),
        RiskFactor::spread_curve("CHF_CORP_A", "CHF", "A", &spread_tenors, &[50.0, 60.0, 80.0, 100.0])
            .with_description("CHF Corporate A-rated Spread Curve"),
        RiskFactor::spread_curve("CHF_CORP_BBB", "CHF", "BBB", &spread_tenors, &[100.0, 120.0, 150.0, 180.0])
            .with_description("CHF Corporate BBB-rated Spread Curve"),
        RiskFactor::fx_rate("EURCHF", "EUR", "CHF", 0.95),
        RiskFactor::fx_rate("USDCHF", "USD", "CHF", 0.88),
        RiskFactor::equity_index("SMI", "Swiss Market Index", 11500.0),
        RiskFactor::macro_factor("CH_GDP_GROWTH", "GDP_GROWTH", 1.8, "%")
            .with_description("Switzerland GDP Growth Rate"),
        RiskFactor::macro_factor("CH_UNEMPLOYMENT", "UNEMPLOYMENT", 2.1, "%")
            .with_description("Switzerland Unemployment Rate"),
    ];

    let counterparties = vec![
        Counterparty::new("CP001", "Swiss Industrial Corp", "A", 0.005, 0.50)
            .with_sector("Industrial")
            .with_country("CH"),
        Counterparty::new("CP002", "Euro Retail Ltd", "BBB", 0.015, 0.40)
            .with_sector("Retail")
            .with_country("DE"),
        Counterparty::new("CP003", "Tech Innovations AG", "BBB+", 0.010, 0.45)
            .with_sector("Technology")
            .with_country("CH"),
    ];

    let contracts = vec![
        Contract::new("LOAN001", ContractType::Loan, "CHF", Decimal::from(10_000_000), date(2027, 12, 31)?)
            .with_yield_curve("CHF_SWAP")
            .with_spread_curve("CHF_CORP_A")
            .with_counterparty("CP001")
            .with_rate(3.5),
        Contract::new("LOAN002", ContractType::Loan, "CHF", Decimal::from(5_000_000), date(2029, 6, 30)?)
            .with_yield_curve("CHF_SWAP")
            .with_spread_curve("CHF_CORP_BBB")
            .with_counterparty("CP002")
            .with_rate(4.2),
        Contract::new("DEP001", ContractType::Deposit, "CHF", Decimal::from(8_000_000), date(2026, 3, 31)?)
            .with_yield_curve("CHF_SWAP")
            .with_rate(2.0)
            .liability(),
        Contract::new("BOND001", ContractType::Bond, "EUR", Decimal::from(3_000_000), date(2030, 12, 31)?)
            .with_yield_curve("EUR_SWAP")
            .with_spread_curve("CHF_CORP_A")
            .with_counterparty("CP003")
            .with_rate(4.5),
    ];

    RiskUniverse::new(risk_factors, counterparties, contracts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_types::RiskFactorKind;

    #[test]
    fn test_sample_universe_shape() {
        let universe = sample_universe().unwrap();
        assert_eq!(universe.risk_factors.len(), 9);
        assert_eq!(universe.counterparties.len(), 3);
        assert_eq!(universe.contracts.len(), 4);
        assert_eq!(
            universe.find_factor("SMI").map(|f| f.kind()),
            Some(RiskFactorKind::EquityIndex)
        );
    }

    #[test]
    fn test_sample_contract_links_resolve() {
        let universe = sample_universe().unwrap();
        for contract in &universe.contracts {
            if let Some(curve) = &contract.linked_yield_curve {
                assert!(universe.find_factor(curve).is_some(), "dangling {}", curve);
            }
        }
    }
}
