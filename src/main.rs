use clap::Parser;
use chatroute::cli::{
    backends, handle_completions, handle_config_init, insights, BackendsCommands, Cli, Commands,
    ConfigCommands,
};
use chatroute::config::ChatrouteConfig;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result: anyhow::Result<()> = match cli.command {
        Commands::Serve(args) => chatroute::cli::serve::run_serve(args).await,
        Commands::Backends(BackendsCommands::List(args)) => {
            let config: anyhow::Result<ChatrouteConfig> = if args.config.exists() {
                ChatrouteConfig::load(Some(&args.config)).map_err(Into::into)
            } else {
                Ok(ChatrouteConfig::default())
            };
            config
                .and_then(|config| {
                    let client = Arc::new(chatroute::cli::serve::build_http_client()?);
                    chatroute::cli::serve::load_backends_from_config(&config, client)
                })
                .and_then(|registry| backends::handle_backends_list(&args, &registry))
                .map(|output| println!("{}", output))
        }
        Commands::Insights(args) => {
            insights::handle_insights(&args).map(|output| println!("{}", output))
        }
        Commands::Config(ConfigCommands::Init(args)) => handle_config_init(&args),
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
