pub mod appstate;
pub mod http;
