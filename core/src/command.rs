use serde::{Deserialize, Serialize};
use crate::config::ConfigPatch;

/// Commands a driver (the headless runner's IPC loop) can issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum SimCommand {
    Run { count: u64 },
    GetState,
    Reset,
    UpdateParameters { config: ConfigPatch },
    Quit,
}
