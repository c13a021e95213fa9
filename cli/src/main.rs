//! Binary entrypoint for nmtools

fn main() {
    if let Err(err) = nmtools_cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
