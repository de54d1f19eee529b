use colored::Colorize;

fn main() {
    ridelog::init_logging();
    if let Err(e) = ridelog::run() {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}
