pub mod ast;
pub mod currencies;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod source;
pub mod token;
