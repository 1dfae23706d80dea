// LP text codec: canonical writer and best-effort parser

pub mod parser;
pub mod writer;

pub use parser::{parse_lp, LpDocument};
pub use writer::write_lp;
