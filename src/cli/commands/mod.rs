mod refresh;
mod search;
mod user;

pub use refresh::cmd_refresh;
pub use search::cmd_search;
pub use user::cmd_create_user;
