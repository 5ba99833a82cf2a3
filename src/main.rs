fn main() {
    if let Err(err) = exp_search::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
