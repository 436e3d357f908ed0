use serde::{Deserialize, Serialize};

use crate::export::{MoneyFormat, PageGeometry};
use crate::report::{DateMode, DistributionMode};

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub company: Company,
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default)]
    pub layout: PageGeometry,
    #[serde(default)]
    pub output: OutputSettings,
}

impl Config {
    pub fn money_format(&self) -> MoneyFormat {
        MoneyFormat {
            symbol: self.report.currency_symbol.clone(),
            decimal_separator: self.report.decimal_separator,
            thousands_separator: self.report.thousands_separator,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Company {
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportSettings {
    pub currency_symbol: String,
    pub decimal_separator: char,
    pub thousands_separator: char,
    pub distribution: DistributionMode,
    pub date_mode: DateMode,
}

impl Default for ReportSettings {
    fn default() -> Self {
        let format = MoneyFormat::default();
        Self {
            currency_symbol: format.symbol,
            decimal_separator: format.decimal_separator,
            thousands_separator: format.thousands_separator,
            distribution: DistributionMode::default(),
            date_mode: DateMode::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    pub output_dir: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            output_dir: "~/.closings/output".to_string(),
        }
    }
}
