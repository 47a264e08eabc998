pub mod auth;
pub mod config;
pub mod release;

pub type CmdResult<T> = tagship::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}
