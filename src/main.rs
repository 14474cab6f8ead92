use clap::Parser;

use cache_indexing::cli::Cli;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = cache_indexing::run(&cli) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
