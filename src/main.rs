fn main() {
    if let Err(err) = record_managed::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
