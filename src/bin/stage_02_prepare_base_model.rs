use std::process::ExitCode;

use cnnflow::cli::run_stage_main;
use cnnflow::PrepareBaseModelStage;

fn main() -> ExitCode {
    run_stage_main(&PrepareBaseModelStage::new())
}
