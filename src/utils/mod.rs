pub mod json_path;
pub mod tool_call_assembler;

pub use tool_call_assembler::ToolCallAssembler;
