mod key;
mod limiter;
mod rate;
mod warmup;

pub use key::{HostKey, RequestTarget};
pub use limiter::HostLimiter;
pub use rate::Rate;
