/// First position assigned inside a list. Positions are dense from here.
pub const POSITION_BASE: i32 = 0;

pub mod episodes {

    pub const MIN_NUMBER: i32 = 1;

    pub const MAX_NUMBER: i32 = 1000;
}

pub mod limits {

    pub const MAX_LOCAL_SEARCH_RESULTS: u64 = 20;

    pub const MAX_BROWSE_RESULTS: u64 = 50;

    pub const HISTORY_PER_SOURCE: u64 = 50;

    pub const PROFILE_RECENT_EPISODES: u64 = 20;

    pub const DASHBOARD_RECENT_LISTS: u64 = 5;

    pub const MAX_DIRECTORS: usize = 2;

    pub const MAX_CAST: usize = 5;

    pub const MAX_BIO_CHARS: usize = 500;

    pub const MAX_NICKNAME_CHARS: usize = 50;

    pub const MAX_LIST_NAME_CHARS: usize = 100;
}
