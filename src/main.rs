fn main() {
    if let Err(e) = acuassist_lib::run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
