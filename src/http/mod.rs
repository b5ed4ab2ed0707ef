pub mod client;
pub mod request;
pub mod response;
pub mod transport;

pub use client::HttpClient;
pub use request::HttpRequest;
pub use response::HttpResponse;
pub use transport::Transport;
