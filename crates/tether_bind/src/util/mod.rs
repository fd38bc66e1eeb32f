mod display;

pub use display::{value_to_string, Appendable};
