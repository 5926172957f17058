use serenity::model::channel::Reaction;
use tracing::{debug, error};

use crate::bot::start::BotContext;
use crate::service::broadcast::reactions::ReactionOutcome;

/// Handle a reaction being added to any message.
pub async fn handle_reaction_add(app: &BotContext, reaction: Reaction) {
    let Some(user_id) = reaction.user_id else {
        return;
    };
    let emoji = reaction.emoji.to_string();

    match app
        .reactions
        .add_reaction(reaction.message_id.get(), &emoji, user_id.get())
        .await
    {
        Ok(ReactionOutcome::Updated) => {
            debug!(message_id = reaction.message_id.get(), %emoji, "reaction added");
        }
        Ok(ReactionOutcome::RateLimited) => {
            debug!(user_id = user_id.get(), "reaction rate limited");
        }
        Ok(_) => {}
        Err(e) => error!("Failed to process reaction add: {e}"),
    }
}

/// Handle a reaction being removed from any message.
pub async fn handle_reaction_remove(app: &BotContext, reaction: Reaction) {
    let Some(user_id) = reaction.user_id else {
        return;
    };
    let emoji = reaction.emoji.to_string();

    match app
        .reactions
        .remove_reaction(reaction.message_id.get(), &emoji, user_id.get())
        .await
    {
        Ok(ReactionOutcome::Updated) => {
            debug!(message_id = reaction.message_id.get(), %emoji, "reaction removed");
        }
        Ok(_) => {}
        Err(e) => error!("Failed to process reaction remove: {e}"),
    }
}
