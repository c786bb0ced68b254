//! Card database lookup command.

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::warn;

use crate::error::ServiceError;
use crate::platform::{Card, CardLookup, SearchMode};

use super::{CommandOutcome, TextCommand, TextContext, missing_argument};

fn card_reply(card: &Card) -> String {
    format!("**{}** ({})\n{}\n{}", card.name, card.code, card.type_line, card.text)
}

/// `!card <name>` — fuzzy lookup against the external card database.
///
/// The database is an external service the bot does not own; a lookup failure
/// is reported in the reply and never escalates past this command.
pub struct CardCommand {
    lookup: Arc<dyn CardLookup>,
}

impl CardCommand {
    /// Build the handler over a card database client.
    pub fn new(lookup: Arc<dyn CardLookup>) -> Self {
        Self { lookup }
    }
}

impl TextCommand for CardCommand {
    fn name(&self) -> &str {
        "card"
    }
    fn help(&self) -> &str {
        "card <name> — look a card up in the card database"
    }
    fn aliases(&self) -> &[&str] {
        &["card", "c"]
    }
    fn execute(
        &self,
        ctx: TextContext,
    ) -> BoxFuture<'static, Result<CommandOutcome, ServiceError>> {
        let lookup = self.lookup.clone();
        Box::pin(async move {
            let query = ctx.args.trim().to_string();
            if query.is_empty() {
                return Ok(missing_argument("card", "card name"));
            }
            match lookup.search(&query, SearchMode::Fuzzy).await {
                Ok(cards) => match cards.first() {
                    Some(card) => Ok(CommandOutcome::new(
                        "card",
                        format!("found `{}` for `{query}`", card.name),
                        card_reply(card),
                    )),
                    None => Ok(CommandOutcome::new(
                        "card",
                        format!("no match for `{query}`"),
                        format!("No card found matching `{query}`."),
                    )),
                },
                Err(err) => {
                    warn!(query, error = %err, "card lookup failed");
                    Ok(CommandOutcome::new(
                        "card",
                        "card service unavailable",
                        "The card database is unavailable right now. Try again later.",
                    ))
                }
            }
        })
    }
}
