fn main() {
    if let Err(err) = sankey_cycles::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
