//! Pipeline description languages. YAML is the only one.

pub mod yaml;
