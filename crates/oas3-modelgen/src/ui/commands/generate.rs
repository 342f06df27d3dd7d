use std::path::PathBuf;

use chrono::{Local, Timelike};
use crossterm::style::Stylize;

use crate::{
  generator::{
    orchestrator::{GenerationRun, GenerationStats, ModelGenerator},
    verify::format_report,
  },
  ui::{Colors, GenerateCommand},
  utils::spec::{SpecLoader, document_version, ensure_supported_version, validate_document},
};

fn format_timestamp() -> String {
  let now = Local::now();
  format!("[{:02}:{:02}:{:02}]", now.hour(), now.minute(), now.second())
}

#[derive(Debug, Clone)]
pub struct GenerateConfig {
  pub input: PathBuf,
  pub output: PathBuf,
  pub verify: bool,
  pub verbose: bool,
  pub quiet: bool,
}

impl GenerateConfig {
  pub fn from_command(command: GenerateCommand) -> Self {
    let GenerateCommand {
      input,
      output,
      verify,
      verbose,
      quiet,
    } = command;
    Self {
      input,
      output,
      verify,
      verbose,
      quiet,
    }
  }
}

struct GenerateLogger<'a> {
  config: &'a GenerateConfig,
  colors: &'a Colors,
}

impl<'a> GenerateLogger<'a> {
  fn new(config: &'a GenerateConfig, colors: &'a Colors) -> Self {
    Self { config, colors }
  }

  fn info(&self, message: &str) {
    if !self.config.quiet {
      println!("{} {message}", format_timestamp().with(self.colors.timestamp()));
    }
  }

  fn stat(&self, label: &str, value: String) {
    if !self.config.quiet {
      println!(
        "            {:<25} {}",
        label.with(self.colors.label()),
        value.with(self.colors.value())
      );
    }
  }

  fn log_loading(&self) {
    self.info(
      &format!("Loading OpenAPI document from: {}", self.config.input.display())
        .with(self.colors.primary())
        .to_string(),
    );
  }

  fn log_generating(&self, version: &str) {
    self.info(
      &format!("Generating endpoint models (OpenAPI {version})...")
        .with(self.colors.primary())
        .to_string(),
    );
  }

  fn print_statistics(&self, stats: &GenerationStats) {
    self.stat("Operations:", stats.operations.to_string());
    self.stat("Sections written:", stats.sections_written.to_string());
    self.stat("Models generated:", stats.models_generated.to_string());
    if !stats.warnings.is_empty() {
      self.stat("Warnings:", stats.warnings.len().to_string());
    }
  }

  fn print_warnings(&self, stats: &GenerationStats) {
    if stats.warnings.is_empty() || self.config.quiet {
      return;
    }
    for warning in &stats.warnings {
      eprintln!(
        "{} {}",
        "Warning:".with(self.colors.accent()),
        warning.as_str().with(self.colors.primary())
      );
    }
  }

  fn log_writing(&self) {
    self.info(
      &format!("Writing to: {}", self.config.output.display())
        .with(self.colors.primary())
        .to_string(),
    );
  }

  fn log_success(&self) {
    if !self.config.quiet {
      println!();
      println!(
        "{} {}",
        format_timestamp().with(self.colors.timestamp()),
        "Successfully generated endpoint models".with(self.colors.success())
      );
    }
  }
}

pub async fn generate_models(config: GenerateConfig, colors: &Colors) -> anyhow::Result<()> {
  let logger = GenerateLogger::new(&config, colors);

  logger.log_loading();
  let document = SpecLoader::open(&config.input).await?.parse()?;
  validate_document(&document)?;
  let version = document_version(&document)?;
  ensure_supported_version(&version)?;

  logger.log_generating(&version);
  logger.log_writing();
  let generator = ModelGenerator::new(document)?;
  let GenerationRun { stats, report } = generator.generate(&config.output, config.verify).await?;

  logger.print_statistics(&stats);
  logger.print_warnings(&stats);

  if let Some(report) = report {
    if !report.is_clean() {
      println!();
      println!("{}", format_report(&report).with(colors.error()));
      anyhow::bail!("verification failed with {} mismatch(es)", report.mismatch_count());
    }
    // A clean run gets the full report only when asked for it.
    if config.verbose && !config.quiet {
      println!();
      println!("{}", format_report(&report).with(colors.success()));
    } else {
      logger.stat("Verified models:", report.verified_count.to_string());
    }
  }

  logger.log_success();
  Ok(())
}
