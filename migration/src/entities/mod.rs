pub mod bookmark;
pub mod campaign;
pub mod campaign_condition_tag;
pub mod campaign_tag;
pub mod campaign_translation;
pub mod comment;
pub mod condition_tag;
pub mod emoji_reaction;
pub mod participation;
pub mod platform;
pub mod reaction;
pub mod tag;

pub use bookmark::Entity as BookmarkEntity;
pub use campaign::Entity as CampaignEntity;
pub use campaign_condition_tag::Entity as CampaignConditionTagEntity;
pub use campaign_tag::Entity as CampaignTagEntity;
pub use campaign_translation::Entity as CampaignTranslationEntity;
pub use comment::Entity as CommentEntity;
pub use condition_tag::Entity as ConditionTagEntity;
pub use emoji_reaction::Entity as EmojiReactionEntity;
pub use participation::Entity as ParticipationEntity;
pub use platform::Entity as PlatformEntity;
pub use reaction::Entity as ReactionEntity;
pub use tag::Entity as TagEntity;
