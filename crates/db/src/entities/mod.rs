//! Database entities.

pub mod dish;
pub mod dish_category;
pub mod dish_like;
pub mod dish_media;
pub mod dish_review;
pub mod reaction;
pub mod restaurant;
pub mod user;
pub mod user_seen_dish_media;

pub use dish::Entity as Dish;
pub use dish_category::Entity as DishCategory;
pub use dish_like::Entity as DishLike;
pub use dish_media::Entity as DishMedia;
pub use dish_review::Entity as DishReview;
pub use reaction::Entity as Reaction;
pub use restaurant::Entity as Restaurant;
pub use user::Entity as User;
pub use user_seen_dish_media::Entity as UserSeenDishMedia;
