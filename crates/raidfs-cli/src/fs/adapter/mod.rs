mod core;
mod filesystem;
mod ops_attr;
mod ops_create;
mod ops_dir;
mod ops_io;
mod types;

pub use types::FuseFs;
