pub mod expr;
pub mod interpreter;
pub mod parser;
pub mod scanner;
pub mod statement;
pub mod store;
pub mod token;
mod trace;
