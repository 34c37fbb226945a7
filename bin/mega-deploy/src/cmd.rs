use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser};
use mega_deployer::{
    execute, plan, Artifacts, DeployConfig, Phase, RunFailure, RunOptions, RunOutcome,
    StateSnapshot, DEFAULT_GAS_LIMIT,
};
use tracing::{info, warn};

use crate::common::{
    collect_sources, load_config, load_state, write_state, DeployCmdError, LogArgs, Result,
    RpcClient, Solc,
};

/// Deploy changed contracts and inject their dependencies
#[derive(Parser, Debug)]
#[command(name = "mega-deploy", version, about)]
pub struct Cmd {
    /// Directory containing the contract sources
    #[arg(value_name = "CONTRACT_DIR")]
    pub contract_dir: PathBuf,

    /// RPC endpoint of the node that signs and executes transactions
    #[arg(
        short = 'a',
        long = "rpc",
        visible_alias = "address",
        env = "RPC_URL",
        default_value = "http://localhost:8545"
    )]
    pub rpc: String,

    /// Deployment configuration file
    #[arg(short = 'c', long = "config", default_value = "deploy.json")]
    pub config: PathBuf,

    /// State file recording previous deployments. Rewritten after every run.
    #[arg(short = 's', long = "state", default_value = "state.json")]
    pub state: PathBuf,

    /// Suffix of contract source files
    #[arg(short = 'e', long = "ext", default_value = ".sol")]
    pub extension: String,

    /// Print the deployment plan without sending any transaction
    #[arg(short = 'd', long = "dry-run")]
    pub dry_run: bool,

    /// Write the state reached so far when a run fails after planning
    #[arg(long = "persist-partial")]
    pub persist_partial: bool,

    /// Compiler configuration
    #[command(flatten)]
    pub compiler_args: CompilerArgs,

    /// Transaction configuration
    #[command(flatten)]
    pub tx_args: TxArgs,

    /// Logging configuration
    #[command(flatten)]
    pub log_args: LogArgs,
}

/// Compiler arguments.
#[derive(Args, Debug, Clone)]
#[command(next_help_heading = "Compiler Options")]
pub struct CompilerArgs {
    /// Path of the `solc` binary
    #[arg(long = "solc", env = "SOLC", default_value = "solc")]
    pub solc: PathBuf,

    /// Compile without the optimizer
    #[arg(long = "no-optimize")]
    pub no_optimize: bool,
}

impl CompilerArgs {
    /// Compiler to use.
    pub fn solc(&self) -> Solc {
        Solc::new(&self.solc)
    }
}

/// Transaction arguments.
#[derive(Args, Debug, Clone)]
#[command(next_help_heading = "Transaction Options")]
pub struct TxArgs {
    /// Gas limit of every deployment and injection transaction
    #[arg(long = "gas-limit", default_value_t = DEFAULT_GAS_LIMIT)]
    pub gas_limit: u64,

    /// Seconds to wait for a transaction receipt
    #[arg(long = "receipt-timeout", value_name = "SECS", default_value_t = 120)]
    pub receipt_timeout: u64,

    /// Milliseconds between receipt polls
    #[arg(long = "poll-interval", value_name = "MILLIS", default_value_t = 500)]
    pub poll_interval: u64,
}

impl TxArgs {
    /// Creates the chain client for `rpc`.
    pub fn client(&self, rpc: &str) -> Result<RpcClient> {
        if self.poll_interval == 0 {
            return Err(DeployCmdError::InvalidInput("poll interval must be positive".into()));
        }
        Ok(RpcClient::connect(rpc)?
            .with_poll_interval(Duration::from_millis(self.poll_interval))
            .with_receipt_timeout(Duration::from_secs(self.receipt_timeout)))
    }
}

impl Cmd {
    /// Execute the deploy command
    pub async fn run(&self) -> Result<()> {
        // Step 1: compile the contract sources
        let sources = collect_sources(&self.contract_dir, &self.extension)?;
        let artifacts = self.compiler_args.solc().compile(&sources, !self.compiler_args.no_optimize)?;
        info!(contracts = artifacts.len(), sources = sources.len(), "Compiled contracts");

        self.reconcile(&artifacts).await
    }

    /// Reconcile compiled `artifacts` against the configuration, the state file and the node.
    pub async fn reconcile(&self, artifacts: &Artifacts) -> Result<()> {
        // Step 2: load the configuration and what the previous run left behind
        let config = load_config(&self.config)?;
        let prior = load_state(&self.state)?;

        // Step 3: a dry run stops at the plan and never talks to the node
        if self.dry_run {
            return self.preview(&config, artifacts, &prior);
        }

        // Step 4: deploy and inject
        let client = self.tx_args.client(&self.rpc)?;
        let chain_id = client.chain_id().await?;
        info!(chain_id, rpc = %self.rpc, "Connected to node");
        let options = RunOptions { dry_run: false, gas_limit: self.tx_args.gas_limit };

        match execute(&client, &config, &prior, artifacts, &options).await {
            Ok(outcome) => self.finish(outcome),
            Err(failure) => {
                if let Some(snapshot) = failure.snapshot.as_ref().filter(|_| self.persist_partial) {
                    warn!(path = %self.state.display(), "Persisting partial state");
                    write_state(&self.state, snapshot)?;
                }
                Err(failure.into())
            }
        }
    }

    fn preview(
        &self,
        config: &DeployConfig,
        artifacts: &Artifacts,
        prior: &StateSnapshot,
    ) -> Result<()> {
        let plan = plan(config, artifacts, prior)
            .map_err(|error| RunFailure { phase: Phase::Plan, error, snapshot: None })?;
        let json = serde_json::to_string_pretty(plan.snapshot()).map_err(|source| {
            DeployCmdError::JsonSerialize { file: "<stdout>".to_string(), source }
        })?;
        println!("{json}");
        info!(
            deploy = plan.snapshot().len() - plan.unchanged_count(),
            unchanged = plan.unchanged_count(),
            "Dry run complete"
        );
        Ok(())
    }

    fn finish(&self, outcome: RunOutcome) -> Result<()> {
        let RunOutcome { snapshot, report } = outcome;
        write_state(&self.state, &snapshot)?;
        info!(
            deployed = report.deployed,
            unchanged = report.unchanged,
            injected = report.injected,
            skipped = report.skipped_injections,
            state = %self.state.display(),
            "Deployment complete"
        );
        Ok(())
    }
}
