fn main() {
    if let Err(e) = miggen_cli::run(std::env::args().collect()) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
