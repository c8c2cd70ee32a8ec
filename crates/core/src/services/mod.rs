//! Feed and reaction services.

pub mod cursor;
pub mod discovery;
pub mod entry_assembler;
pub mod feed;
pub mod ranked_feed;
pub mod reaction;
pub mod reaction_aggregator;
pub mod repositories;

#[cfg(test)]
pub(crate) mod test_support;

pub use cursor::{CursorError, CursorKind, FeedCursor, decode_or_first_page, take_page};
pub use discovery::{DiscoveryParams, DiscoverySort, GeoDiscoveryQuery, IdPage};
pub use entry_assembler::{
    CategoryView, DishMediaEntry, DishView, EntryAssembler, MediaView, RestaurantView, ReviewView,
};
pub use feed::{FeedPage, FeedService};
pub use ranked_feed::{RankedRestaurantFeedQuery, RestaurantFeedParams};
pub use reaction::{MAX_SEEN_BATCH, ReactionService};
pub use reaction_aggregator::{ReactionAggregator, ReactionKey, ReactionSummary, unique_ids};
pub use repositories::Repositories;
