use clap::ValueEnum;
use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};

/// Color scheme of the practice screen.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    ValueEnum,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn correct(&self) -> Style {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    }

    pub fn incorrect(&self) -> Style {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    }

    /// Words and characters not yet typed.
    pub fn upcoming(&self) -> Style {
        match self {
            Theme::Dark => Style::default()
                .add_modifier(Modifier::BOLD)
                .add_modifier(Modifier::DIM),
            Theme::Light => Style::default().fg(Color::DarkGray),
        }
    }

    pub fn active_word(&self) -> Style {
        self.upcoming().add_modifier(Modifier::UNDERLINED)
    }

    pub fn accent(&self) -> Style {
        match self {
            Theme::Dark => Style::default().fg(Color::Magenta),
            Theme::Light => Style::default().fg(Color::Blue),
        }
    }

    pub fn status(&self) -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::ITALIC)
    }
}
