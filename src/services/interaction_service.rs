//! User interactions: reactions, emoji, bookmarks, participation and
//! comment threads

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use super::campaign_service::CampaignService;
use crate::config::{TS_EXPORT_PATH, get_config};
use crate::errors::CreditHubError;
use crate::storage::{CampaignCounters, Comment, InteractionState, ReactionKind, SeaOrmStorage};

const MAX_EMOJI_CHARS: usize = 8;

/// 评论最深层级（顶层为 0）；更深的回复挂到该层
pub const MAX_COMMENT_DEPTH: usize = 5;

// ============ Request / Response DTOs ============

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ReactionRequest {
    pub kind: ReactionKind,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ReactionResponse {
    pub reaction: Option<ReactionKind>,
    pub counters: CampaignCounters,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct EmojiRequest {
    pub emoji: String,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct EmojiToggleResponse {
    pub emoji: String,
    /// true when the emoji is now set by the user
    pub active: bool,
    pub counts: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ToggleResponse {
    pub active: bool,
    pub changed: bool,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct BatchStateRequest {
    pub campaign_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct CreateCommentRequest {
    pub content: String,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct UpdateCommentRequest {
    pub content: String,
}

/// A comment and its replies; deleted comments keep their place in the
/// thread with empty content
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct CommentNode {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub user_id: Option<String>,
    pub content: String,
    pub is_deleted: bool,
    pub edited: bool,
    pub created_at: DateTime<Utc>,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    fn from_comment(c: &Comment) -> Self {
        let is_deleted = c.deleted_at.is_some();
        Self {
            id: c.id,
            parent_id: c.parent_id,
            user_id: (!is_deleted).then(|| c.user_id.clone()),
            content: if is_deleted {
                String::new()
            } else {
                c.content.clone()
            },
            is_deleted,
            edited: !is_deleted && c.updated_at > c.created_at,
            created_at: c.created_at,
            replies: Vec::new(),
        }
    }
}

/// Arrange a flat, time-ordered comment list into threads
///
/// Replies whose parent is missing are promoted to the top level. Deleted
/// comments without live replies are dropped. Anything nested below
/// [`MAX_COMMENT_DEPTH`] is flattened into the deepest level.
pub fn build_comment_tree(comments: &[Comment]) -> Vec<CommentNode> {
    let ids: HashSet<i64> = comments.iter().map(|c| c.id).collect();
    let mut children: HashMap<Option<i64>, Vec<&Comment>> = HashMap::new();
    for c in comments {
        let parent = c.parent_id.filter(|p| ids.contains(p) && *p != c.id);
        children.entry(parent).or_default().push(c);
    }

    fn flatten(
        parent: i64,
        children: &HashMap<Option<i64>, Vec<&Comment>>,
        seen: &mut HashSet<i64>,
        out: &mut Vec<CommentNode>,
    ) {
        let Some(list) = children.get(&Some(parent)) else {
            return;
        };
        for c in list {
            if !seen.insert(c.id) {
                continue;
            }
            if c.deleted_at.is_none() {
                out.push(CommentNode::from_comment(c));
            }
            flatten(c.id, children, seen, out);
        }
    }

    fn build(
        parent: Option<i64>,
        children: &HashMap<Option<i64>, Vec<&Comment>>,
        depth: usize,
    ) -> Vec<CommentNode> {
        let Some(list) = children.get(&parent) else {
            return Vec::new();
        };
        list.iter()
            .filter_map(|c| {
                let mut node = CommentNode::from_comment(c);
                if depth + 1 < MAX_COMMENT_DEPTH {
                    node.replies = build(Some(c.id), children, depth + 1);
                } else {
                    let mut flat = Vec::new();
                    flatten(c.id, children, &mut HashSet::from([c.id]), &mut flat);
                    flat.sort_by_key(|n| (n.created_at, n.id));
                    node.replies = flat;
                }
                (!node.is_deleted || !node.replies.is_empty()).then_some(node)
            })
            .collect()
    }

    build(None, &children, 0)
}

/// Normalise an emoji reaction value
pub fn validate_emoji(raw: &str) -> Result<String, CreditHubError> {
    let emoji = raw.trim();
    let count = emoji.chars().count();
    if count == 0 || count > MAX_EMOJI_CHARS {
        return Err(CreditHubError::validation("Emoji must be 1 to 8 characters"));
    }
    if emoji.chars().any(|c| c.is_ascii() || c.is_whitespace()) {
        return Err(CreditHubError::validation(format!(
            "'{}' is not an emoji",
            emoji
        )));
    }
    Ok(emoji.to_string())
}

/// Drop duplicates (keeping first occurrence) and cap the list
pub fn dedup_ids(ids: &[i64], limit: usize) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .take(limit)
        .collect()
}

// ============ InteractionService Implementation ============

pub struct InteractionService {
    storage: Arc<SeaOrmStorage>,
    campaigns: CampaignService,
}

impl InteractionService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self {
            campaigns: CampaignService::new(storage.clone()),
            storage,
        }
    }

    // ============ Reactions ============

    /// Set or clear the like/dislike of a user
    pub async fn set_reaction(
        &self,
        campaign_id: i64,
        user_id: &str,
        kind: Option<ReactionKind>,
    ) -> Result<ReactionResponse, CreditHubError> {
        self.campaigns.require_public_campaign(campaign_id).await?;
        let counters = self.storage.set_reaction(campaign_id, user_id, kind).await?;
        Ok(ReactionResponse {
            reaction: kind,
            counters,
        })
    }

    pub async fn toggle_emoji(
        &self,
        campaign_id: i64,
        user_id: &str,
        emoji: &str,
    ) -> Result<EmojiToggleResponse, CreditHubError> {
        let emoji = validate_emoji(emoji)?;
        self.campaigns.require_public_campaign(campaign_id).await?;

        let active = self
            .storage
            .toggle_emoji(campaign_id, user_id, &emoji)
            .await?;
        let counts = self
            .storage
            .emoji_counts(&[campaign_id])
            .await?
            .remove(&campaign_id)
            .unwrap_or_default();

        debug!(
            "InteractionService: emoji {} {} on campaign {} by {}",
            emoji,
            if active { "added" } else { "removed" },
            campaign_id,
            user_id
        );
        Ok(EmojiToggleResponse {
            emoji,
            active,
            counts,
        })
    }

    // ============ Bookmarks / Participation ============

    pub async fn add_bookmark(
        &self,
        campaign_id: i64,
        user_id: &str,
    ) -> Result<ToggleResponse, CreditHubError> {
        self.campaigns.require_public_campaign(campaign_id).await?;
        let changed = self.storage.add_bookmark(campaign_id, user_id).await?;
        Ok(ToggleResponse {
            active: true,
            changed,
        })
    }

    /// Removing works even after the campaign was taken down
    pub async fn remove_bookmark(
        &self,
        campaign_id: i64,
        user_id: &str,
    ) -> Result<ToggleResponse, CreditHubError> {
        let changed = self.storage.remove_bookmark(campaign_id, user_id).await?;
        Ok(ToggleResponse {
            active: false,
            changed,
        })
    }

    pub async fn set_participation(
        &self,
        campaign_id: i64,
        user_id: &str,
        participating: bool,
    ) -> Result<ToggleResponse, CreditHubError> {
        if participating {
            self.campaigns.require_public_campaign(campaign_id).await?;
        }
        let changed = self
            .storage
            .set_participation(campaign_id, user_id, participating)
            .await?;
        Ok(ToggleResponse {
            active: participating,
            changed,
        })
    }

    /// Viewer state for a set of campaigns
    pub async fn batch_state(
        &self,
        user_id: &str,
        ids: &[i64],
    ) -> Result<HashMap<i64, InteractionState>, CreditHubError> {
        let limit = get_config().marketplace.batch_state_limit;
        let ids = dedup_ids(ids, limit);
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut states = self.storage.interaction_states(user_id, &ids).await?;
        for id in &ids {
            states.entry(*id).or_default();
        }
        Ok(states)
    }

    // ============ Comments ============

    fn validate_content(content: &str) -> Result<String, CreditHubError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(CreditHubError::validation("Comment cannot be empty"));
        }
        let max = get_config().marketplace.comment_max_length;
        if content.chars().count() > max {
            return Err(CreditHubError::validation(format!(
                "Comment exceeds {} characters",
                max
            )));
        }
        Ok(content.to_string())
    }

    pub async fn list_comments(&self, campaign_id: i64) -> Result<Vec<CommentNode>, CreditHubError> {
        self.campaigns.require_public_campaign(campaign_id).await?;
        let comments = self.storage.list_comments(campaign_id).await?;
        Ok(build_comment_tree(&comments))
    }

    pub async fn create_comment(
        &self,
        campaign_id: i64,
        user_id: &str,
        req: CreateCommentRequest,
    ) -> Result<CommentNode, CreditHubError> {
        let content = Self::validate_content(&req.content)?;
        self.campaigns.require_public_campaign(campaign_id).await?;

        let parent_id = match req.parent_id {
            Some(parent_id) => {
                let parent = self
                    .storage
                    .get_comment(parent_id)
                    .await?
                    .filter(|p| p.deleted_at.is_none())
                    .ok_or_else(|| {
                        CreditHubError::not_found(format!("Comment {} not found", parent_id))
                    })?;
                if parent.campaign_id != campaign_id {
                    return Err(CreditHubError::validation(
                        "Parent comment belongs to another campaign",
                    ));
                }
                Some(self.reply_target(parent).await?)
            }
            None => None,
        };

        let comment = self
            .storage
            .insert_comment(campaign_id, user_id, parent_id, &content)
            .await?;
        Ok(CommentNode::from_comment(&comment))
    }

    /// 回复挂载点：父评论过深时改挂到最深允许层级的祖先上
    async fn reply_target(&self, parent: Comment) -> Result<i64, CreditHubError> {
        // 自父评论向上直到顶层
        let mut chain = vec![parent.id];
        let mut seen = HashSet::from([parent.id]);
        let mut next = parent.parent_id;
        while let Some(id) = next {
            if !seen.insert(id) {
                break;
            }
            let Some(ancestor) = self.storage.get_comment(id).await? else {
                break;
            };
            chain.push(ancestor.id);
            next = ancestor.parent_id;
        }

        // chain.len() - 1 即父评论深度
        let parent_depth = chain.len() - 1;
        if parent_depth < MAX_COMMENT_DEPTH {
            return Ok(parent.id);
        }
        chain.reverse();
        let target = chain[MAX_COMMENT_DEPTH - 1];
        debug!(
            "InteractionService: reply to comment {} at depth {} re-parented to {}",
            parent.id, parent_depth, target
        );
        Ok(target)
    }

    async fn owned_comment(
        &self,
        id: i64,
        user_id: &str,
        is_admin: bool,
    ) -> Result<Comment, CreditHubError> {
        let comment = self
            .storage
            .get_comment(id)
            .await?
            .filter(|c| c.deleted_at.is_none())
            .ok_or_else(|| CreditHubError::not_found(format!("Comment {} not found", id)))?;
        if comment.user_id != user_id && !is_admin {
            return Err(CreditHubError::forbidden(
                "You can only modify your own comments",
            ));
        }
        Ok(comment)
    }

    /// Authors may edit their own comments
    pub async fn edit_comment(
        &self,
        id: i64,
        user_id: &str,
        req: UpdateCommentRequest,
    ) -> Result<CommentNode, CreditHubError> {
        let content = Self::validate_content(&req.content)?;
        self.owned_comment(id, user_id, false).await?;
        let comment = self.storage.update_comment(id, &content).await?;
        info!("InteractionService: comment {} edited by {}", id, user_id);
        Ok(CommentNode::from_comment(&comment))
    }

    /// Authors delete their own comments; admins delete any
    pub async fn delete_comment(
        &self,
        id: i64,
        user_id: &str,
        is_admin: bool,
    ) -> Result<(), CreditHubError> {
        self.owned_comment(id, user_id, is_admin).await?;
        if !self.storage.soft_delete_comment(id).await? {
            return Err(CreditHubError::not_found(format!("Comment {} not found", id)));
        }
        info!(
            "InteractionService: comment {} deleted by {}{}",
            id,
            user_id,
            if is_admin { " (admin)" } else { "" }
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn comment(id: i64, parent_id: Option<i64>, deleted: bool) -> Comment {
        let created_at = Utc::now() + Duration::seconds(id);
        Comment {
            id,
            campaign_id: 1,
            user_id: format!("user-{}", id),
            parent_id,
            content: format!("comment {}", id),
            created_at,
            updated_at: created_at,
            deleted_at: deleted.then_some(created_at),
        }
    }

    #[test]
    fn test_comment_tree_nesting() {
        let comments = vec![
            comment(1, None, false),
            comment(2, Some(1), false),
            comment(3, None, false),
            comment(4, Some(2), false),
        ];
        let tree = build_comment_tree(&comments);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].id, 1);
        assert_eq!(tree[0].replies[0].id, 2);
        assert_eq!(tree[0].replies[0].replies[0].id, 4);
        assert!(tree[1].replies.is_empty());
    }

    fn count_nodes(nodes: &[CommentNode]) -> usize {
        nodes.iter().map(|n| 1 + count_nodes(&n.replies)).sum()
    }

    fn max_depth(nodes: &[CommentNode]) -> usize {
        nodes
            .iter()
            .map(|n| 1 + max_depth(&n.replies))
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn test_deep_chain_is_flattened_not_dropped() {
        let mut comments = vec![comment(1, None, false)];
        for id in 2..=70 {
            comments.push(comment(id, Some(id - 1), false));
        }
        let tree = build_comment_tree(&comments);
        assert_eq!(count_nodes(&tree), 70);
        assert_eq!(max_depth(&tree), MAX_COMMENT_DEPTH + 1);

        // 最深层按时间排列
        let mut node = &tree[0];
        for _ in 1..MAX_COMMENT_DEPTH {
            node = &node.replies[0];
        }
        let last_level: Vec<i64> = node.replies.iter().map(|n| n.id).collect();
        let expected: Vec<i64> = ((MAX_COMMENT_DEPTH as i64 + 1)..=70).collect();
        assert_eq!(last_level, expected);
    }

    #[test]
    fn test_flattened_level_skips_deleted_but_keeps_their_replies() {
        let mut comments = Vec::new();
        for id in 1..=MAX_COMMENT_DEPTH as i64 {
            comments.push(comment(id, (id > 1).then(|| id - 1), false));
        }
        let deep = MAX_COMMENT_DEPTH as i64;
        comments.push(comment(deep + 1, Some(deep), true));
        comments.push(comment(deep + 2, Some(deep + 1), false));

        let tree = build_comment_tree(&comments);
        assert_eq!(count_nodes(&tree), MAX_COMMENT_DEPTH + 1);
    }

    #[test]
    fn test_comment_tree_masks_deleted() {
        let comments = vec![
            comment(1, None, true),
            comment(2, Some(1), false),
            comment(3, None, true),
        ];
        let tree = build_comment_tree(&comments);
        assert_eq!(tree.len(), 1);
        assert!(tree[0].is_deleted);
        assert_eq!(tree[0].content, "");
        assert_eq!(tree[0].user_id, None);
        assert_eq!(tree[0].replies.len(), 1);
    }

    #[test]
    fn test_comment_tree_promotes_orphans() {
        let comments = vec![comment(5, Some(99), false)];
        let tree = build_comment_tree(&comments);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].parent_id, Some(99));
    }

    #[test]
    fn test_validate_emoji() {
        assert_eq!(validate_emoji(" 🔥 ").unwrap(), "🔥");
        assert!(validate_emoji("👍🏽").is_ok());
        assert!(validate_emoji("").is_err());
        assert!(validate_emoji("lol").is_err());
        assert!(validate_emoji("🔥 🔥").is_err());
    }

    #[test]
    fn test_dedup_ids() {
        assert_eq!(dedup_ids(&[3, 1, 3, 2, 1], 10), vec![3, 1, 2]);
        assert_eq!(dedup_ids(&[1, 2, 3, 4], 2), vec![1, 2]);
    }
}
