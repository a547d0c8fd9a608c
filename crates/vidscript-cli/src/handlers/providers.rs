//! Providers command handler

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::output::OutputWriter;
use std::collections::BTreeMap;
use vidscript_core::{Capability, FallbackStrategyManager, StrategySummary};

/// Chains keyed by capability name, each in dispatch order
pub fn chains(manager: &FallbackStrategyManager) -> BTreeMap<&'static str, Vec<StrategySummary>> {
    Capability::ALL
        .into_iter()
        .map(|capability| (capability.as_str(), manager.strategies(capability)))
        .collect()
}

/// Handle the providers command
pub fn handle_providers(manager: &FallbackStrategyManager, output: &mut OutputWriter) -> Result<()> {
    let chains = chains(manager);

    if output.format() != OutputFormat::Human {
        return output.data(&chains);
    }

    for capability in Capability::ALL {
        output.section(capability.as_str())?;
        let rows = chains[capability.as_str()]
            .iter()
            .map(|summary| {
                vec![
                    summary.name.clone(),
                    summary.priority.to_string(),
                    if summary.conditional { "yes" } else { "" }.to_string(),
                ]
            })
            .collect::<Vec<_>>();
        if rows.is_empty() {
            output.warning("No strategies configured")?;
        } else {
            output.table(&["Strategy", "Priority", "Conditional"], rows)?;
        }
    }
    Ok(())
}
