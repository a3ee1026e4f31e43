//! Language frontend for casm: the single-line lexer, the label
//! preprocessor and the token scanner the executor parses with.

pub mod lexer;
pub mod preprocess;
pub mod scanner;

pub use lexer::tokenize_line;
pub use preprocess::{preprocess, LabelTable};
pub use scanner::Scanner;
