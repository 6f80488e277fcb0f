use std::process::ExitCode;

fn main() -> ExitCode {
    match efs_csv_feeder::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
