//! Command runner: wires configuration, collaborators and the clean workflow

use crate::clean::{CleanOutcome, Cleaner};
use crate::cli::args::{Cli, Command};
use crate::cli::config::AppConfig;
use crate::error::Result;
use crate::logging::Logger;

pub struct Runner {
    cli: Cli,
    config: AppConfig,
    logger: Logger,
}

impl Runner {
    /// Build a runner from parsed arguments and the process environment
    pub fn new(cli: Cli) -> Result<Self> {
        let config = AppConfig::from_env()?.merge_args(&cli);
        Self::with_config(cli, config)
    }

    pub fn with_config(cli: Cli, config: AppConfig) -> Result<Self> {
        config.validate()?;
        let logger = config.logger();
        Ok(Self { cli, config, logger })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub async fn run(&self) -> Result<CleanOutcome> {
        match &self.cli.command {
            Command::Clean { dry_run, image } => self.clean(image, *dry_run).await,
        }
    }

    async fn clean(&self, image: &str, dry_run: bool) -> Result<CleanOutcome> {
        self.logger.verbose(&format!("Cleaning signature of {}", image));
        if let Some(repository) = &self.config.repository_override {
            self.logger.detail(&format!("Signature repository override: {}", repository));
        }
        if let Some(path) = self.config.keychain().path() {
            self.logger.detail(&format!("Docker config: {}", path.display()));
        }

        let client = self.config.registry_client()?;
        let cleaner = Cleaner::new(
            client.clone(),
            client,
            self.config.keychain(),
            self.config.resolver_config(),
            self.logger.clone(),
        )
        .with_dry_run(dry_run);

        let outcome = cleaner.clean(image).await?;

        if outcome.deleted() {
            self.logger.success(&format!(
                "Signature removed in {}",
                self.logger.format_duration(self.logger.elapsed())
            ));
        }
        Ok(outcome)
    }
}
