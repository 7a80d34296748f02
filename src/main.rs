fn main() {
    if let Err(err) = csv_summary::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
