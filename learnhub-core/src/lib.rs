pub mod catalog;
pub mod certificate;
pub mod chatbot;
pub mod curriculum;
pub mod enrollment;
pub mod errors;
pub mod filters;
pub mod models;
pub mod payment;
pub mod placeholder;
pub mod provider;
pub mod session;
pub mod timeout;

pub use catalog::*;
pub use certificate::*;
pub use enrollment::*;
pub use errors::*;
pub use filters::*;
pub use models::*;
pub use payment::*;
pub use placeholder::*;
pub use provider::*;
pub use session::*;
pub use timeout::*;
