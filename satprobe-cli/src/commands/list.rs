//! `satprobe list` command handler

use std::io::Write;

use serde::Serialize;

use satprobe_harness::runner::select;
use satprobe_harness::{Requirement, Scenario, Tier, catalog};

use crate::cli::ListArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `list` command. Needs no configuration or server.
pub fn execute(args: ListArgs, writer: &OutputWriter) -> Result<(), CliError> {
    let report = build_list(args);
    writer.render(&report)
}

fn build_list(args: ListArgs) -> ScenarioList {
    let selection = super::selection(args.filter, args.tier);
    let scenarios = select(catalog::all(), &selection)
        .iter()
        .map(ScenarioEntry::from)
        .collect();
    ScenarioList { scenarios }
}

/// 시나리오 목록
#[derive(Serialize)]
pub struct ScenarioList {
    pub scenarios: Vec<ScenarioEntry>,
}

#[derive(Serialize)]
pub struct ScenarioEntry {
    pub name: String,
    pub summary: String,
    pub tier: Tier,
    pub upgrade: bool,
    pub requires: Vec<Requirement>,
    pub steps: usize,
}

impl From<&Scenario> for ScenarioEntry {
    fn from(scenario: &Scenario) -> Self {
        Self {
            name: scenario.name.clone(),
            summary: scenario.summary.clone(),
            tier: scenario.tier,
            upgrade: scenario.upgrade,
            requires: scenario.requires.clone(),
            steps: scenario.steps.len(),
        }
    }
}

impl Render for ScenarioList {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let width = self
            .scenarios
            .iter()
            .map(|s| s.name.chars().count())
            .max()
            .unwrap_or(0)
            .max("NAME".len());

        writeln!(
            w,
            "{}",
            format!("{:<width$}  {:<5}  {:<7}  {}", "NAME", "TIER", "UPGRADE", "REQUIRES").bold()
        )?;
        for s in &self.scenarios {
            let requires: Vec<&str> = s.requires.iter().map(Requirement::section).collect();
            writeln!(
                w,
                "{:<width$}  {:<5}  {:<7}  {}",
                s.name,
                s.tier.to_string(),
                if s.upgrade { "yes" } else { "" },
                requires.join(",")
            )?;
        }
        writeln!(w)?;
        writeln!(w, "{} scenarios", self.scenarios.len())?;
        Ok(())
    }
}
