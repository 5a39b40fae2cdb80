mod info;
mod psync;
mod replconf;
mod wait;

pub use info::info;
pub use psync::psync;
pub use replconf::replconf;
pub use wait::wait;
