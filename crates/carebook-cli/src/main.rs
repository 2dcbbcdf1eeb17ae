use std::ffi::OsString;

fn main() {
    let args: Vec<OsString> = std::env::args_os().collect();
    if let Err(err) = carebook_core::run(args) {
        eprintln!("carebook: {err:#}");
        std::process::exit(1);
    }
}
