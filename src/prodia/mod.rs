pub mod client;
pub mod job;
pub mod retry;

pub use client::ProdiaClient;
pub use job::{JobOptions, JobRequest};
pub use retry::RetryPolicy;
