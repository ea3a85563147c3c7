//! `satprobe run` command handler

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use satprobe_core::config::SatprobeConfig;
use satprobe_harness::naming::scenario_seed;
use satprobe_harness::runner::{ScenarioResult, select};
use satprobe_harness::{
    EntityApi, FixtureProvisioner, HttpEntityApi, NameStrategy, RandomNames, RunTag,
    ScenarioOutcome, SharedFixtures, StringKind, SuiteReport, SuiteRunner, catalog,
};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `run` command.
///
/// Loads configuration, probes the server, runs the selected scenarios and
/// renders the report. Any failed scenario turns into exit code 4.
pub async fn execute(
    args: RunArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = SatprobeConfig::load(config_path).await?;
    let api = Arc::new(HttpEntityApi::new(&config.server)?);
    api.ping()
        .await
        .map_err(|e| CliError::ServerUnavailable(format!("{}: {e}", config.server.url)))?;
    info!(url = config.server.url.as_str(), "server reachable");

    let report = run_suite(api, config, &args).await?;
    writer.render(&RunSummary::new(&report))?;
    finish(&report)
}

/// 선택한 시나리오를 실행하고 보고서를 반환합니다.
pub async fn run_suite<A: EntityApi>(
    api: Arc<A>,
    mut config: SatprobeConfig,
    args: &RunArgs,
) -> Result<SuiteReport, CliError> {
    let selection = super::selection(args.filter.clone(), args.tier);
    let scenarios = select(catalog::all(), &selection);
    if scenarios.is_empty() {
        return Err(CliError::Command(
            "no scenarios match the selection".to_owned(),
        ));
    }

    if let Some(seed) = args.seed {
        config.naming.seed = Some(seed);
    }
    let name_length = config.naming.default_length;
    satprobe_core::metrics::describe_all();

    let mut runner = SuiteRunner::new(Arc::clone(&api), config);
    if args.shared_org {
        let mut names = RandomNames::new(
            Some(scenario_seed(runner.seed(), "shared-organization")),
            name_length,
        );
        // 시드는 같아도 공유 조직 이름은 실행마다 달라야 합니다.
        let name = RunTag::fresh().apply(names.next_name(StringKind::Alpha), StringKind::Alpha);
        let organization = FixtureProvisioner::new(api)
            .create_organization(&name)
            .await?;
        info!(
            organization = organization.name.as_str(),
            "scenarios share one organization"
        );
        runner = runner.with_shared(SharedFixtures::with_organization(organization));
    }

    Ok(runner.run(&scenarios).await)
}

fn finish(report: &SuiteReport) -> Result<(), CliError> {
    if report.is_success() {
        Ok(())
    } else {
        Err(CliError::ScenariosFailed {
            failed: report.failed(),
            total: report.results.len(),
        })
    }
}

/// 실행 보고서 출력 형태 (건수 포함)
#[derive(Serialize)]
pub struct RunSummary<'a> {
    pub run_id: &'a str,
    pub seed: u64,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: &'a [ScenarioResult],
}

impl<'a> RunSummary<'a> {
    pub fn new(report: &'a SuiteReport) -> Self {
        Self {
            run_id: &report.run_id,
            seed: report.seed,
            passed: report.passed(),
            failed: report.failed(),
            skipped: report.skipped(),
            duration_ms: report.duration_ms(),
            results: &report.results,
        }
    }
}

impl Render for RunSummary<'_> {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        for result in self.results {
            let status = match result.outcome {
                ScenarioOutcome::Passed => "PASS".green().bold(),
                ScenarioOutcome::Failed { .. } => "FAIL".red().bold(),
                ScenarioOutcome::Skipped { .. } => "SKIP".yellow().bold(),
            };
            writeln!(w, "[{status}] {} ({} ms)", result.name, result.duration_ms)?;
            match &result.outcome {
                ScenarioOutcome::Passed => {}
                ScenarioOutcome::Failed { kind, message } => {
                    writeln!(w, "       {kind}: {}", message.red())?;
                }
                ScenarioOutcome::Skipped { reason } => {
                    writeln!(w, "       {reason}")?;
                }
            }
        }

        writeln!(w)?;
        writeln!(
            w,
            "{} passed, {} failed, {} skipped in {} ms",
            self.passed.to_string().green(),
            self.failed.to_string().red(),
            self.skipped.to_string().yellow(),
            self.duration_ms
        )?;
        writeln!(w, "run {} (seed {})", self.run_id, self.seed)?;
        Ok(())
    }
}
