pub mod config;
pub mod csv_dir;
pub mod file;
pub mod stdin;
