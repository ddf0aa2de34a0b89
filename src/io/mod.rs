pub mod gateway;
pub mod http;

#[cfg(test)]
pub mod fake;

pub use gateway::Gateway;
pub use http::HttpGateway;
