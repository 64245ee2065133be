// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword-triggered auto-replies.
//!
//! Rules live in the store; matching runs against an explicit in-memory cache
//! owned by [`AutoReply`]. Every mutation writes through the store and then
//! reloads the cache in full, never partially. There is a small window
//! between the write and the reload where an inbound message can match stale
//! rules; inbound traffic and rule edits are both operator-scale, so the
//! window is accepted.

use std::sync::Arc;

use arc_swap::ArcSwap;

use waauto_bus::{DashboardEvent, EventBus};
use waauto_core::chat_id;
use waauto_core::error::WaautoError;
use waauto_core::types::{
    AutoReplyRule, Direction, IncomingMessage, LogKind, LogStatus, MatchMode,
};
use waauto_storage::Database;
use waauto_storage::queries::{logs, rules, settings};

use crate::dispatcher::Dispatcher;

/// Setting key for the global enable flag.
const ENABLED_KEY: &str = "auto_reply_enabled";

/// Partial update for a rule; `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct RuleUpdate {
    pub keyword: Option<String>,
    pub reply: Option<String>,
    pub match_mode: Option<MatchMode>,
    pub enabled: Option<bool>,
}

/// Snapshot the matcher scans. Swapped wholesale on reload.
struct RuleCache {
    rules: Vec<AutoReplyRule>,
    enabled: bool,
}

/// Auto-reply component: rule cache, matcher, and write-through mutations.
pub struct AutoReply {
    db: Database,
    dispatcher: Arc<Dispatcher>,
    bus: EventBus,
    cache: ArcSwap<RuleCache>,
}

impl AutoReply {
    /// Build the component and load the initial cache from the store.
    pub async fn new(
        db: Database,
        dispatcher: Arc<Dispatcher>,
        bus: EventBus,
    ) -> Result<Self, WaautoError> {
        let this = Self {
            db,
            dispatcher,
            bus,
            cache: ArcSwap::from_pointee(RuleCache {
                rules: Vec::new(),
                enabled: true,
            }),
        };
        this.reload().await?;
        Ok(this)
    }

    /// Reload the cache in full: enabled rules (newest first) plus the flag.
    pub async fn reload(&self) -> Result<(), WaautoError> {
        let rules = rules::list_enabled_rules(&self.db).await?;
        let enabled = settings::get_setting(&self.db, ENABLED_KEY)
            .await?
            .map(|v| v == "1")
            .unwrap_or(true);
        tracing::debug!(rules = rules.len(), enabled, "auto-reply cache reloaded");
        self.cache.store(Arc::new(RuleCache { rules, enabled }));
        Ok(())
    }

    /// Whether auto-replies fire at all.
    pub fn is_enabled(&self) -> bool {
        self.cache.load().enabled
    }

    /// Persist the global flag, then reload.
    pub async fn set_enabled(&self, enabled: bool) -> Result<(), WaautoError> {
        settings::set_setting(&self.db, ENABLED_KEY, if enabled { "1" } else { "0" }).await?;
        self.reload().await
    }

    /// Find the first cached rule matching `text`.
    ///
    /// Returns `None` when disabled or the text is empty. Matching lower-cases
    /// and trims both sides; `exact` compares equality, `contains` looks for
    /// the keyword as a substring. First match in cache order wins; there is
    /// no specificity ranking.
    pub fn find_match(&self, text: &str) -> Option<AutoReplyRule> {
        let cache = self.cache.load();
        if !cache.enabled {
            return None;
        }
        let body = text.trim().to_lowercase();
        if body.is_empty() {
            return None;
        }

        for rule in &cache.rules {
            let keyword = rule.keyword.trim().to_lowercase();
            let hit = match rule.match_mode {
                MatchMode::Exact => body == keyword,
                MatchMode::Contains => body.contains(&keyword),
            };
            if hit {
                return Some(rule.clone());
            }
        }
        None
    }

    /// Create a rule. Returns its id.
    pub async fn add_rule(
        &self,
        keyword: &str,
        reply: &str,
        match_mode: MatchMode,
        enabled: bool,
    ) -> Result<i64, WaautoError> {
        validate_rule(keyword, reply)?;
        let id = rules::insert_rule(&self.db, keyword, reply, match_mode, enabled).await?;
        self.reload().await?;
        Ok(id)
    }

    /// Apply a partial update; absent fields keep their stored values.
    /// Returns false when the rule does not exist.
    pub async fn update_rule(&self, id: i64, update: RuleUpdate) -> Result<bool, WaautoError> {
        let Some(existing) = rules::get_rule(&self.db, id).await? else {
            return Ok(false);
        };

        let keyword = update.keyword.unwrap_or(existing.keyword);
        let reply = update.reply.unwrap_or(existing.reply);
        let match_mode = update.match_mode.unwrap_or(existing.match_mode);
        let enabled = update.enabled.unwrap_or(existing.enabled);
        validate_rule(&keyword, &reply)?;

        let found = rules::update_rule(&self.db, id, &keyword, &reply, match_mode, enabled).await?;
        self.reload().await?;
        Ok(found)
    }

    /// Delete a rule. Returns false when the rule does not exist.
    pub async fn delete_rule(&self, id: i64) -> Result<bool, WaautoError> {
        let found = rules::delete_rule(&self.db, id).await?;
        self.reload().await?;
        Ok(found)
    }

    /// Flip one rule on or off. Returns false when the rule does not exist.
    pub async fn set_rule_enabled(&self, id: i64, enabled: bool) -> Result<bool, WaautoError> {
        let found = rules::set_rule_enabled(&self.db, id, enabled).await?;
        self.reload().await?;
        Ok(found)
    }

    /// Process one inbound message: log it, relay it to the dashboard, and
    /// fire the first matching reply.
    ///
    /// A failed reply send is noted and swallowed: an automated reply that
    /// did not go out is not itself operator-facing. Storage failures
    /// propagate.
    pub async fn handle_incoming(&self, msg: &IncomingMessage) -> Result<(), WaautoError> {
        let phone = chat_id::display_phone(&msg.from);
        let kind = if msg.has_media {
            LogKind::Media
        } else {
            LogKind::Text
        };
        logs::append_log(
            &self.db,
            phone,
            &msg.body,
            Direction::Received,
            kind,
            LogStatus::Received,
        )
        .await?;

        self.bus.publish(DashboardEvent::MessageReceived {
            from: msg.from.clone(),
            body: msg.body.clone(),
            timestamp: msg.timestamp,
        });

        if let Some(rule) = self.find_match(&msg.body) {
            match self.dispatcher.send(&msg.from, &rule.reply, None).await {
                Ok(_) => {
                    tracing::info!(rule_id = rule.id, phone, "auto-reply sent");
                }
                Err(e) => {
                    tracing::warn!(rule_id = rule.id, phone, error = %e, "auto-reply send failed");
                }
            }
        }
        Ok(())
    }
}

fn validate_rule(keyword: &str, reply: &str) -> Result<(), WaautoError> {
    if keyword.trim().is_empty() {
        return Err(WaautoError::Internal(
            "rule keyword must not be empty".to_string(),
        ));
    }
    if reply.trim().is_empty() {
        return Err(WaautoError::Internal(
            "rule reply must not be empty".to_string(),
        ));
    }
    Ok(())
}
