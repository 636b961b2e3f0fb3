use clap::Parser;
use epublint_cli::Cli;

fn main() {
    let cli = Cli::parse();
    std::process::exit(epublint_cli::run(&cli));
}
