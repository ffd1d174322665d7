//! Telegram adapter: presenter implementation and the bot dispatcher.
//!
//! Translates teloxide updates into core events (text, button choice,
//! photo, shared contact) and sends everything the core emits through
//! the Bot API. All routing decisions live in the core; this module only
//! maps update shapes to [`DialogEvent`]s and action tokens to handler
//! calls.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dialog::{DialogEngine, DialogEvent};
use crate::disclosure::{DisclosureHandler, FollowupAction};
use crate::presenter::{Choice, PresentError, Presenter};

pub mod ui;

/// Sends core messages through the Telegram Bot API.
pub struct TelegramPresenter {
    bot: Bot,
}

impl TelegramPresenter {
    /// Wrap a bot handle.
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Presenter for TelegramPresenter {
    async fn present(
        &self,
        user_id: i64,
        text: &str,
        choices: &[Choice],
    ) -> Result<(), PresentError> {
        let mut req = self.bot.send_message(ChatId(user_id), text);
        if !choices.is_empty() {
            req = req.reply_markup(ui::choice_keyboard(choices));
        }
        match req.await {
            Ok(_) => Ok(()),
            Err(e) => Err(PresentError(e.to_string())),
        }
    }
}

/// Shared dependencies injected into teloxide handlers via `dptree::deps!`.
#[derive(Clone)]
struct SharedState {
    engine: Arc<DialogEngine>,
    disclosure: Arc<DisclosureHandler>,
}

/// Run the bot event loop until stopped (Ctrl+C).
///
/// # Errors
///
/// Returns an error if the dispatcher fails to start.
pub async fn run_telegram(
    bot: Bot,
    engine: Arc<DialogEngine>,
    disclosure: Arc<DisclosureHandler>,
) -> anyhow::Result<()> {
    let shared = SharedState { engine, disclosure };

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    info!("telegram dispatcher starting");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![shared])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

/// Handle an incoming Telegram message.
///
/// Shared contacts and photos feed the active dialog directly; slash
/// commands start flows; any other text goes to the dialog, or falls
/// back to the menu when no dialog is active.
async fn handle_message(msg: Message, state: SharedState) -> ResponseResult<()> {
    let user_id = match msg.from {
        Some(ref user) => i64::try_from(user.id.0).unwrap_or(0),
        None => return Ok(()),
    };

    debug!(user_id, "telegram message received");

    let result = if let Some(contact) = msg.contact() {
        let event = DialogEvent::Contact(contact.phone_number.clone());
        state.engine.handle_event(user_id, event).await
    } else if let Some(photo) = msg.photo().and_then(<[_]>::last) {
        let event = DialogEvent::Media(photo.file.id.clone());
        state.engine.handle_event(user_id, event).await
    } else if let Some(text) = msg.text() {
        if let Some(command) = slash_command(text) {
            dispatch_command(command, &state, user_id).await
        } else if state.engine.has_dialog(user_id).await {
            let event = DialogEvent::Text(text.to_owned());
            state.engine.handle_event(user_id, event).await
        } else {
            state.engine.main_menu(user_id).await
        }
    } else {
        debug!(user_id, "unsupported message type, ignoring");
        return Ok(());
    };

    if let Err(e) = result {
        warn!(user_id, error = %e, "failed to reply to message");
    }
    Ok(())
}

/// Extract a slash command name, stripping arguments and the
/// `@bot_name` suffix (e.g. `/start@poputka_bot` is `start`).
fn slash_command(text: &str) -> Option<&str> {
    let without_slash = text.strip_prefix('/')?;
    let command = without_slash
        .split_whitespace()
        .next()
        .unwrap_or(without_slash);
    Some(command.split('@').next().unwrap_or(command))
}

async fn dispatch_command(
    command: &str,
    state: &SharedState,
    user_id: i64,
) -> Result<(), PresentError> {
    match command {
        "start" => state.engine.language_prompt(user_id).await,
        "create" => state.engine.start_create(user_id).await,
        "search" => state.engine.start_search(user_id).await,
        "mytrips" => state.engine.my_trips(user_id).await,
        _ => state.engine.main_menu(user_id).await,
    }
}

/// Handle an inline keyboard callback.
///
/// Recognized token families: `lang:` (language selection), `menu:`
/// (top-level actions), `phone:` (contact disclosure), and
/// `full:`/`wait:`/`del:` (trip lifecycle actions). Anything else is a
/// dialog step choice.
async fn handle_callback(bot: Bot, query: CallbackQuery, state: SharedState) -> ResponseResult<()> {
    let user_id = i64::try_from(query.from.id.0).unwrap_or(0);

    let Some(data) = query.data.as_deref() else {
        bot.answer_callback_query(&query.id).await?;
        return Ok(());
    };

    debug!(user_id, data, "callback received");

    let result = if let Some(language) = data.strip_prefix("lang:") {
        match state.engine.set_language(user_id, language).await {
            Ok(()) => state.engine.main_menu(user_id).await,
            Err(e) => Err(e),
        }
    } else if let Some(menu_action) = data.strip_prefix("menu:") {
        match menu_action {
            "create" => state.engine.start_create(user_id).await,
            "search" => state.engine.start_search(user_id).await,
            "mytrips" => state.engine.my_trips(user_id).await,
            _ => state.engine.main_menu(user_id).await,
        }
    } else if let Some(id) = data.strip_prefix("phone:") {
        match Uuid::parse_str(id) {
            Ok(trip_id) => state.disclosure.reveal(user_id, trip_id).await,
            Err(_) => {
                warn!(user_id, data, "malformed phone token");
                Ok(())
            }
        }
    } else if let Some((action, trip_id)) = FollowupAction::parse(data) {
        if let Err(e) = state.disclosure.act(action, trip_id).await {
            warn!(user_id, %trip_id, error = %e, "trip action failed");
        }
        bot.answer_callback_query(&query.id).text("✅").await?;
        return Ok(());
    } else {
        state
            .engine
            .handle_event(user_id, DialogEvent::Choice(data.to_owned()))
            .await
    };

    if let Err(e) = result {
        warn!(user_id, error = %e, "failed to reply to callback");
    }

    bot.answer_callback_query(&query.id).await?;
    Ok(())
}
