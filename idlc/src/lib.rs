//! A compiler from IDL interface definitions to TypeScript declarations.

pub mod ast;
mod driver;
pub mod emit;
pub mod files;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod registry;
pub mod reporting;
pub mod session;
pub mod source;
pub mod storage;
pub mod target;

pub use driver::{Driver, Status};
pub use session::Session;
