use clap::Parser;
use iris_predict::cli::{self, Cli, Commands, ServeArgs};
use iris_predict::error::Result;
use iris_predict::logging::init_logging_simple;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Serve(args)) => {
            cli::run_serve(&cli.config_dir, args).await?;
        }
        Some(Commands::Train(args)) => {
            init_logging_simple();
            let report = cli::run_train(args)?;
            cli::print_train_report(&report, &args.output);
        }
        None => {
            cli::run_serve(&cli.config_dir, &ServeArgs::default()).await?;
        }
    }

    Ok(())
}
