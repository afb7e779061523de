mod symbols;
pub mod xml;

pub use symbols::{PublicResources, SymbolTable};
