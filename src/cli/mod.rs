pub mod compile;
pub mod config_check;
pub mod lint;
