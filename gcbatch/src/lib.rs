// src/lib.rs
pub mod batch;
pub mod config;
pub mod error;

pub mod io {
    pub mod targets;
    pub mod peaks;
    pub mod table;
}
