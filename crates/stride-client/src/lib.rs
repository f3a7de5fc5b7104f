pub mod http;
pub mod traits;

pub use http::HttpChatApi;
pub use traits::ChatApi;
