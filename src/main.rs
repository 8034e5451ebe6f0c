use deploygate::cli::commands::{CliArgs, Commands};
use deploygate::cli::handlers::{handle_build, handle_config, handle_init_script};
use deploygate::util::{init_logging, LoggingConfig};
use deploygate::VERSION;

use clap::Parser;
use tracing::debug;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging(LoggingConfig::from_cli(
        args.log_level.as_deref(),
        args.verbose,
        args.quiet,
    ));

    debug!("deploygate v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Build(build_args) => handle_build(build_args).await,
        Commands::InitScript(init_args) => handle_init_script(init_args).await,
        Commands::Config(config_args) => handle_config(config_args).await,
    };

    std::process::exit(exit_code);
}
