use clap::Parser;
use switchboard::cli::{check, handle_config_init, route, run, Cli, Commands, ConfigCommands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => run::run(args).await,
        Commands::Check(args) => check::handle_check(&args).await,
        Commands::Route(args) => route::handle_route(&args).await,
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
