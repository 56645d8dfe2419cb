pub mod arguments;
pub mod process;

pub use arguments::{assemble, ArgumentVector, AssemblyInput};
pub use process::{launch, ProcessExitTerminator, Terminator};
