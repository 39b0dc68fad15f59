pub mod active_poll;
pub mod invite;
pub mod registration;
pub mod schedule;
pub mod settings;
pub mod training;
pub mod user;

pub use active_poll::*;
pub use invite::*;
pub use registration::*;
pub use schedule::*;
pub use settings::*;
pub use training::*;
pub use user::*;
