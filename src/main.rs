fn main() {
    if let Err(err) = parkwise_lib::run() {
        log::error!("{err:#}");
        eprintln!("parkwise: {err:#}");
        std::process::exit(1);
    }
}
