pub mod media_factory;
pub use media_factory::MediaFactory;

pub mod media_service;
pub mod media_service_impl;
pub use media_service::{MediaError, MediaService, RefreshSummary, SearchOutcome};
pub use media_service_impl::SeaOrmMediaService;

pub mod episode_service;
pub mod episode_service_impl;
pub use episode_service::{EpisodeError, EpisodeTrackingService, ShowWatchState};
pub use episode_service_impl::SeaOrmEpisodeTrackingService;

pub mod list_service;
pub mod list_service_impl;
pub use list_service::{ListError, ListService};
pub use list_service_impl::SeaOrmListService;

pub mod profile_service;
pub mod profile_service_impl;
pub use profile_service::{ProfileError, ProfileService};
pub use profile_service_impl::SeaOrmProfileService;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{Registration, UserError, UserService};
pub use user_service_impl::SeaOrmUserService;

pub mod scheduler;
pub use scheduler::Scheduler;
