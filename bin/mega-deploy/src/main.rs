//! `mega-deploy` CLI entry point

use std::process::ExitCode;

use clap::Parser;
use mega_deploy::Cmd;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cmd = Cmd::parse();
    if let Err(e) = cmd.log_args.init() {
        eprintln!("failed because: {e}");
        return ExitCode::FAILURE;
    }

    match cmd.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("failed because: {e}");
            ExitCode::FAILURE
        }
    }
}
