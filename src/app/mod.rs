mod run;

pub use run::{BootstrapRun, RunState};
