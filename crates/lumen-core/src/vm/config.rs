//! Interpreter settings

/// Default operand stack capacity
pub const DEFAULT_STACK_MAX: usize = 256;

/// Settings for a [`VM`](super::VM)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmConfig {
    /// Operand stack capacity; pushing past it is a stack overflow
    pub stack_max: usize,

    /// Log the stack and each instruction before it runs
    /// (target `lumen_core::trace`, level TRACE)
    pub trace_execution: bool,

    /// Log the disassembly of every compiled chunk
    /// (target `lumen_core::code`, level DEBUG)
    pub print_code: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            stack_max: DEFAULT_STACK_MAX,
            trace_execution: false,
            print_code: false,
        }
    }
}

impl VmConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_stack_max(mut self, stack_max: usize) -> Self {
        self.stack_max = stack_max;
        self
    }

    #[must_use]
    pub fn with_trace_execution(mut self, enabled: bool) -> Self {
        self.trace_execution = enabled;
        self
    }

    #[must_use]
    pub fn with_print_code(mut self, enabled: bool) -> Self {
        self.print_code = enabled;
        self
    }
}
