//! Interpreter configuration.

/// Interpreter configuration options.
#[derive(Clone, Copy, Debug)]
pub struct InterpreterConfig {
    /// Bytes for both semispaces together.
    pub heap_size: usize,
    /// Value stack capacity in slots.
    pub stack_size: usize,
    /// Deepest frame stack (calls and blocks) before `StackOverflow`.
    pub max_frames: usize,
    /// Print the value of every top-level unit as it is loaded.
    pub echo_results: bool,
    /// Compile with a pc to line table so traces can name lines.
    pub emit_line_numbers: bool,
    /// Byte-reverse floats in object files.
    pub reverse_floats: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            heap_size: 1024 * 1024,
            stack_size: 64 * 1024,
            max_frames: 16 * 1024,
            echo_results: false,
            emit_line_numbers: false,
            reverse_floats: false,
        }
    }
}
