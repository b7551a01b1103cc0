use serde::{Deserialize, Serialize};
use sg_types::{Scenario, SgError, SgResult};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One shock, flattened together with its scenario's fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRow {
    pub scenario_name: Option<String>,
    pub scenario_description: Option<String>,
    pub scenario_type: String,
    pub probability: Option<f64>,
    pub factor_type: String,
    pub factor_id: String,
    pub shock_type: String,
    pub shock_value: f64,
    pub shock_description: Option<String>,
}

/// Flat view of a scenario set, one row per shock in source order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioTable {
    pub rows: Vec<ScenarioRow>,
    scenario_count: usize,
}

impl ScenarioTable {
    pub const COLUMNS: [&'static str; 9] = [
        "scenario_name",
        "scenario_description",
        "scenario_type",
        "probability",
        "factor_type",
        "factor_id",
        "shock_type",
        "shock_value",
        "shock_description",
    ];

    /// Scenarios without shocks contribute no rows.
    pub fn from_scenarios(scenarios: &[Scenario]) -> Self {
        let rows = scenarios
            .iter()
            .flat_map(|scenario| {
                scenario.shocks.iter().map(move |shock| ScenarioRow {
                    scenario_name: scenario.name.clone(),
                    scenario_description: scenario.description.clone(),
                    scenario_type: scenario.scenario_type.as_str().to_string(),
                    probability: scenario.probability,
                    factor_type: shock.factor_type.as_str().to_string(),
                    factor_id: shock.factor_id.clone(),
                    shock_type: shock.shock_type.as_str().to_string(),
                    shock_value: shock.value,
                    shock_description: shock.description.clone(),
                })
            })
            .collect();

        Self {
            rows,
            scenario_count: scenarios.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of scenarios the table was built from, including shockless ones.
    pub fn scenario_count(&self) -> usize {
        self.scenario_count
    }

    pub fn counts_by_factor_type(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            *counts.entry(row.factor_type.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn counts_by_shock_type(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            *counts.entry(row.shock_type.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Header line followed by one record per row. Absent values are empty cells.
    pub fn write_csv<W: Write>(&self, writer: W) -> SgResult<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        csv_writer
            .write_record(Self::COLUMNS)
            .map_err(|e| SgError::Csv(e.to_string()))?;
        for row in &self.rows {
            csv_writer
                .serialize(row)
                .map_err(|e| SgError::Csv(e.to_string()))?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write the table to `path`, replacing any existing file.
    pub fn save_csv(&self, path: impl AsRef<Path>) -> SgResult<()> {
        let file = File::create(path.as_ref())?;
        self.write_csv(BufWriter::new(file))?;
        tracing::info!(path = %path.as_ref().display(), rows = self.len(), "saved scenario table");
        Ok(())
    }

    pub fn to_csv_string(&self) -> SgResult<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| SgError::Csv(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_types::{FactorType, RiskFactorKind, Shock, ShockType};

    fn scenarios() -> Vec<Scenario> {
        vec![
            Scenario::stress("Rate_Shock", "Rates up")
                .with_shock(Shock::new(RiskFactorKind::YieldCurve, "CHF_SWAP", ShockType::ParallelShiftBps, 200.0))
                .with_shock(
                    Shock::new(RiskFactorKind::EquityIndex, "SMI", ShockType::Multiplicative, 0.7)
                        .with_description("Equities, down 30%"),
                ),
            Scenario::stress("Quiet", "No shocks at all"),
            Scenario::stochastic("Drift", "Mild", 0.25)
                .with_shock(Shock::new(FactorType::from("commodity"), "OIL", ShockType::ParallelShiftPct, 10.0)),
        ]
    }

    #[test]
    fn test_one_row_per_shock() {
        let table = ScenarioTable::from_scenarios(&scenarios());
        assert_eq!(table.len(), 3);
        assert_eq!(table.scenario_count(), 3);

        let names: Vec<Option<&str>> = table.rows.iter().map(|r| r.scenario_name.as_deref()).collect();
        assert_eq!(names, vec![Some("Rate_Shock"), Some("Rate_Shock"), Some("Drift")]);

        let last = &table.rows[2];
        assert_eq!(last.scenario_type, "stochastic");
        assert_eq!(last.probability, Some(0.25));
        assert_eq!(last.factor_type, "commodity");
        assert_eq!(last.shock_value, 10.0);
    }

    #[test]
    fn test_shockless_scenarios_give_empty_table() {
        let table = ScenarioTable::from_scenarios(&[Scenario::stress("Quiet", "Nothing")]);
        assert!(table.is_empty());
        assert_eq!(table.scenario_count(), 1);
    }

    #[test]
    fn test_counts() {
        let table = ScenarioTable::from_scenarios(&scenarios());
        let by_factor = table.counts_by_factor_type();
        assert_eq!(by_factor.get("yield_curve"), Some(&1));
        assert_eq!(by_factor.get("commodity"), Some(&1));

        let by_shock = table.counts_by_shock_type();
        assert_eq!(by_shock.get("multiplicative"), Some(&1));
        assert_eq!(by_shock.values().sum::<usize>(), 3);
    }

    #[test]
    fn test_write_csv() {
        let csv_text = ScenarioTable::from_scenarios(&scenarios()).to_csv_string().unwrap();
        let lines: Vec<&str> = csv_text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], ScenarioTable::COLUMNS.join(","));
        assert_eq!(lines[1], "Rate_Shock,Rates up,stress,,yield_curve,CHF_SWAP,parallel_shift_bps,200.0,");
        assert!(lines[2].ends_with("0.7,\"Equities, down 30%\""));
    }

    #[test]
    fn test_empty_table_still_has_header() {
        let csv_text = ScenarioTable::default().to_csv_string().unwrap();
        assert_eq!(csv_text.trim_end(), ScenarioTable::COLUMNS.join(","));
    }

    #[test]
    fn test_save_csv_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generated_scenarios.csv");
        let table = ScenarioTable::from_scenarios(&scenarios());

        table.save_csv(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, table.to_csv_string().unwrap());

        ScenarioTable::default().save_csv(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 1);
    }
}
