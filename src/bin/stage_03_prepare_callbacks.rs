use std::process::ExitCode;

use cnnflow::cli::run_stage_main;
use cnnflow::PrepareCallbacksStage;

fn main() -> ExitCode {
    run_stage_main(&PrepareCallbacksStage::new())
}
