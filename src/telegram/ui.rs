//! Inline keyboard and text helpers for Telegram messages.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::presenter::Choice;

/// Maximum buttons per keyboard row.
const ROW_WIDTH: usize = 3;

/// Lay out choices as an inline keyboard, up to [`ROW_WIDTH`] per row.
pub fn choice_keyboard(choices: &[Choice]) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = choices
        .chunks(ROW_WIDTH)
        .map(|row| {
            row.iter()
                .map(|c| InlineKeyboardButton::callback(c.label.clone(), c.action.clone()))
                .collect()
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}
