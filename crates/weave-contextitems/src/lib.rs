pub mod service;
pub mod trigger;

pub use service::ContextItemService;
