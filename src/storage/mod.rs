pub mod provider;
pub(crate) mod rclone;
pub(crate) mod transport;
