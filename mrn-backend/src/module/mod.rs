pub mod publisher;
pub mod relay;
pub mod scheduled;
