//! Line-oriented command protocol over a reader/writer pair

pub mod parser;
pub mod session;

pub use parser::CommandParser;
pub use session::{error_code, Session, SessionStats};
