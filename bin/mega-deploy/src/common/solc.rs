//! Compilation of contract sources through `solc --standard-json`.

use std::{
    collections::BTreeMap,
    io::Write,
    path::PathBuf,
    process::{Command, ExitStatus, Stdio},
};

use alloy_json_abi::JsonAbi;
use alloy_primitives::{hex, Bytes};
use mega_deployer::{Artifacts, ContractArtifact};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::Sources;

/// Errors raised while compiling contracts
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The compiler reported errors
    #[error("Compiler error: {}", .0.join("\n"))]
    Diagnostics(Vec<String>),

    /// The compiler could not be run
    #[error("Failed to run compiler '{}': {source}", .path.display())]
    Spawn {
        /// Compiler binary
        path: PathBuf,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// The compiler exited without producing output
    #[error("Compiler exited with {status}: {stderr}")]
    Exit {
        /// Exit status of the compiler process
        status: ExitStatus,
        /// Captured standard error
        stderr: String,
    },

    /// The compiler output could not be parsed
    #[error("Failed to parse compiler output: {0}")]
    Output(#[from] serde_json::Error),

    /// Bytecode still contains library placeholders
    #[error("Contract {0} requires library linking, which is not supported")]
    UnlinkedLibrary(String),

    /// Bytecode is not valid hex
    #[error("Invalid bytecode for contract {contract}: {source}")]
    InvalidBytecode {
        /// Contract name
        contract: String,
        /// The underlying decoding error
        source: hex::FromHexError,
    },

    /// Two source files define a contract with the same name
    #[error("Contract {name} is defined in both {first} and {second}")]
    DuplicateContract {
        /// Contract name
        name: String,
        /// Source file of the first definition
        first: String,
        /// Source file of the second definition
        second: String,
    },
}

/// A `solc` binary.
#[derive(Debug, Clone)]
pub struct Solc {
    path: PathBuf,
}

impl Solc {
    /// Use the compiler at `path`, resolved through `PATH` when it is a bare name.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Compile `sources` and return the artifact of every contract with deployable bytecode.
    pub fn compile(&self, sources: &Sources, optimize: bool) -> Result<Artifacts, CompileError> {
        let input = standard_json_input(sources, optimize);
        debug!(compiler = %self.path.display(), sources = sources.len(), optimize, "Invoking compiler");

        let spawn_err = |source| CompileError::Spawn { path: self.path.clone(), source };
        let mut child = Command::new(&self.path)
            .arg("--standard-json")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input.to_string().as_bytes()).map_err(spawn_err)?;
        }
        let output = child.wait_with_output().map_err(spawn_err)?;

        if output.stdout.is_empty() {
            return Err(CompileError::Exit {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        parse_output(&output.stdout)
    }
}

/// Build the standard JSON input for `sources`.
pub fn standard_json_input(sources: &Sources, optimize: bool) -> serde_json::Value {
    let sources = sources
        .iter()
        .map(|(path, content)| (path.clone(), json!({ "content": content })))
        .collect::<serde_json::Map<_, _>>();
    json!({
        "language": "Solidity",
        "sources": sources,
        "settings": {
            "optimizer": { "enabled": optimize },
            "outputSelection": { "*": { "*": ["abi", "evm.bytecode.object"] } },
        },
    })
}

#[derive(Debug, Deserialize)]
struct StandardJsonOutput {
    #[serde(default)]
    errors: Vec<Diagnostic>,
    #[serde(default)]
    contracts: BTreeMap<String, BTreeMap<String, CompiledContract>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Diagnostic {
    severity: String,
    message: String,
    formatted_message: Option<String>,
}

impl Diagnostic {
    fn text(&self) -> &str {
        self.formatted_message.as_deref().unwrap_or(&self.message).trim()
    }
}

#[derive(Debug, Deserialize)]
struct CompiledContract {
    abi: JsonAbi,
    evm: EvmOutput,
}

#[derive(Debug, Deserialize)]
struct EvmOutput {
    bytecode: BytecodeOutput,
}

#[derive(Debug, Deserialize)]
struct BytecodeOutput {
    object: String,
}

/// Parse the standard JSON output of the compiler.
///
/// Warnings are logged. Any error-severity diagnostic fails the whole compilation. Contracts
/// without bytecode (interfaces, abstract contracts) are left out of the result.
pub fn parse_output(output: &[u8]) -> Result<Artifacts, CompileError> {
    let output: StandardJsonOutput = serde_json::from_slice(output)?;

    let mut errors = Vec::new();
    for diagnostic in &output.errors {
        if diagnostic.severity == "error" {
            errors.push(diagnostic.text().to_string());
        } else {
            warn!(severity = %diagnostic.severity, "{}", diagnostic.text());
        }
    }
    if !errors.is_empty() {
        return Err(CompileError::Diagnostics(errors));
    }

    let mut artifacts = Artifacts::new();
    let mut origins = BTreeMap::<String, String>::new();
    for (file, contracts) in output.contracts {
        for (name, contract) in contracts {
            let object = contract.evm.bytecode.object;
            if object.is_empty() {
                debug!(contract = %name, "Skipping contract without bytecode");
                continue;
            }
            if object.contains("__") {
                return Err(CompileError::UnlinkedLibrary(name));
            }
            let bytecode = hex::decode(&object)
                .map_err(|source| CompileError::InvalidBytecode { contract: name.clone(), source })?;

            if let Some(first) = origins.insert(name.clone(), file.clone()) {
                return Err(CompileError::DuplicateContract { name, first, second: file });
            }
            debug!(contract = %name, source = %file, size = bytecode.len(), "Compiled contract");
            artifacts.insert(
                name.clone(),
                ContractArtifact::new(name, contract.abi, Bytes::from(bytecode)),
            );
        }
    }
    Ok(artifacts)
}
