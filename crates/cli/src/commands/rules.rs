//! Rule catalog listing

use analyzer_lib::rules::{RuleInfo, RuleScope};
use analyzer_lib::RuleSet;
use anyhow::Result;
use tabled::Tabled;

use crate::output::{color_tier, print_json, print_table, OutputFormat};

/// Row for the rules table
#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "Rule")]
    name: &'static str,
    #[tabled(rename = "Scope")]
    scope: &'static str,
    #[tabled(rename = "Tier")]
    tier: String,
    #[tabled(rename = "Default")]
    default: &'static str,
    #[tabled(rename = "Description")]
    description: &'static str,
}

impl From<&RuleInfo> for RuleRow {
    fn from(rule: &RuleInfo) -> Self {
        Self {
            name: rule.name,
            scope: match rule.scope {
                RuleScope::Container => "container",
                RuleScope::Workload => "workload",
            },
            tier: color_tier(rule.tier),
            default: if rule.enabled_by_default { "on" } else { "off" },
            description: rule.description,
        }
    }
}

/// List every known rule
pub fn list_rules(format: OutputFormat) -> Result<()> {
    let catalog = RuleSet::catalog();

    match format {
        OutputFormat::Json => print_json(&catalog)?,
        OutputFormat::Table => print_table(catalog.iter().map(RuleRow::from).collect()),
    }

    Ok(())
}
