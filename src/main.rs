use clap::Parser;

use jcli_lib::cli::{self, Cli};
use jcli_lib::logger;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    if let Err(e) = logger::init_tracing(args.verbose) {
        eprintln!("Error: {}", e);
    }

    let code = cli::report(cli::run(args).await, &mut std::io::stderr());
    if code != 0 {
        std::process::exit(code);
    }
}
