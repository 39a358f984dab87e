pub mod alert;
pub mod reading;
pub mod user;

pub use alert::*;
pub use reading::*;
pub use user::*;
