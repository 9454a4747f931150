pub mod common_args;
pub mod point_cmd;
pub mod svi_cmd;
