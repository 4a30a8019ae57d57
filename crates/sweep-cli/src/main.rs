use clap::Parser;

mod cli;
pub mod exit_codes;
mod logging;

use cli::args::Cli;
use cli::commands::dispatch;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let code = match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fatal: {e:#}");
            if exit_codes::aborted_mid_run(&e) {
                eprintln!("the run was aborted after dispatch started; no results were written");
            }
            exit_codes::from_error(&e)
        }
    };
    std::process::exit(code);
}
