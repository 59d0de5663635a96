pub mod commands;
pub mod steps;

pub fn run(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    if args.is_empty() {
        print_usage();
        return Err("No command provided".into());
    }

    match args[0].as_str() {
        "run" => commands::run::execute(&args[1..]),
        "check" => commands::check::execute(&args[1..]),
        "help" => {
            print_usage();
            Ok(())
        }
        "-h" | "--help" => {
            print_usage();
            Ok(())
        }
        "-v" | "--version" => {
            print_version();
            Ok(())
        }
        _ => {
            eprintln!("Error: Unknown command '{}'", args[0]);
            print_usage();
            Err(format!("Unknown command: {}", args[0]).into())
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

fn print_usage() {
    println!("Gantry - feature-driven end-to-end test harness");
    println!();
    println!("USAGE:");
    println!("    gantry <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    run       Run feature files and write a report");
    println!("    check     Resolve every step against the registry without executing");
    println!("    help      Print this help message");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -v, --version    Print version information");
}

fn print_version() {
    println!("gantry {}", env!("CARGO_PKG_VERSION"));
}
