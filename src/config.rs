/// Default budget for a single run, generous enough for every bundled program.
pub const DEFAULT_MAX_INSTRUCTIONS: u64 = 1_000_000;

/// Run-time knobs for [`Processor::execute_until_hlt`](crate::Processor::execute_until_hlt)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Config {
    /// Abort once this many instructions ran without reaching `HLT`. `None` runs unbounded.
    pub max_instructions: Option<u64>,
    /// Write a trace line to the output before every instruction
    pub trace: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_instructions: Some(DEFAULT_MAX_INSTRUCTIONS),
            trace: false,
        }
    }
}

impl Config {
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_max_instructions(mut self, max_instructions: Option<u64>) -> Self {
        self.max_instructions = max_instructions;
        self
    }
}
