use std::process::ExitCode;

use cnnflow::cli::run_stage_main;
use cnnflow::GetDataStage;

fn main() -> ExitCode {
    run_stage_main(&GetDataStage)
}
