mod file_drop;

pub use file_drop::FileDropIngress;
