mod cli;

use jobseek_session::OperationError;

fn main() {
    if let Err(e) = cli::run() {
        // Operation failures were already shown by the console notifier.
        if e.downcast_ref::<OperationError>().is_some() {
            std::process::exit(1);
        }
        eprintln!("{e:#}"); // pretty anyhow chain
        std::process::exit(1);
    }
}
