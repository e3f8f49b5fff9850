pub mod dir;
pub mod op;
pub mod reg;
