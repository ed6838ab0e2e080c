//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Locale;
use crate::markdown::diagram::ViewportAction;
use crate::widgets::brainwriting::{BrainwritingSession, Method};
use crate::widgets::eisenhower::{EisenhowerMatrix, MatrixStats, Priority};
use crate::widgets::matching::{GameSnapshot, SelectOutcome, Settled};
use crate::widgets::prompt::{PromptBuilder, PromptForm};
use crate::widgets::swot::{Quadrant, Strategies, SwotMatrix};
use crate::widgets::ExportFile;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Json,
    Csv,
    /// Plain-text report; SWOT only.
    Report,
}

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    SetLocale {
        locale: Locale,
    },

    // Matching-pairs game
    GameLoad {
        slug: String,
    },
    GameConfigure {
        pairs: usize,
    },
    GameStart,
    GameRestart,
    GameExit,
    GameSelect {
        #[serde(rename = "cardId")]
        card_id: String,
    },

    // SWOT
    SwotSetProject {
        name: String,
        #[serde(default)]
        description: String,
    },
    SwotAdd {
        quadrant: Quadrant,
        text: String,
    },
    SwotEdit {
        quadrant: Quadrant,
        index: usize,
        text: String,
    },
    SwotRemove {
        quadrant: Quadrant,
        index: usize,
    },
    SwotClear,
    SwotExport {
        format: ExportFormat,
    },
    SwotImport {
        filename: String,
        content: String,
    },

    // Eisenhower
    EisenhowerAdd {
        quadrant: Priority,
        text: String,
    },
    EisenhowerEdit {
        quadrant: Priority,
        id: Uuid,
        text: String,
    },
    EisenhowerToggle {
        quadrant: Priority,
        id: Uuid,
    },
    EisenhowerRemove {
        quadrant: Priority,
        id: Uuid,
    },
    EisenhowerClear,
    EisenhowerShowCompleted {
        show: bool,
    },
    EisenhowerExport {
        format: ExportFormat,
    },
    EisenhowerImport {
        filename: String,
        content: String,
    },

    // Brain-writing
    BrainwritingSetup {
        name: String,
        method: Method,
        rounds: u32,
        minutes: u32,
    },
    BrainwritingAddParticipant {
        name: String,
    },
    BrainwritingRemoveParticipant {
        name: String,
    },
    BrainwritingStart,
    BrainwritingIdea {
        participant: String,
        index: usize,
        text: String,
    },
    BrainwritingEndRound,
    BrainwritingNextRound,
    BrainwritingReset,
    BrainwritingExport {
        format: ExportFormat,
    },

    // Diagram viewer; `diagram` is the block's position among the page's diagrams.
    DiagramView {
        diagram: usize,
        action: ViewportAction,
    },

    // Prompt builder
    PromptUpdate {
        form: PromptForm,
    },
    PromptBuild,
    PromptReset,
    PromptExport,
}

impl ClientWsMessage {
    /// Handling this message reads files from the content root.
    pub fn reads_content(&self) -> bool {
        matches!(self, ClientWsMessage::GameLoad { .. } | ClientWsMessage::PromptBuild)
    }
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Locale {
        locale: Locale,
    },
    Game {
        game: GameSnapshot,
    },
    GameSelection {
        outcome: SelectOutcome,
        game: GameSnapshot,
    },
    /// Sent once the reveal delay of a comparison has elapsed.
    GameSettled {
        settled: Settled,
        game: GameSnapshot,
    },
    Swot {
        swot: SwotMatrix,
        strategies: Strategies,
    },
    Eisenhower {
        eisenhower: EisenhowerMatrix,
        stats: MatrixStats,
    },
    Brainwriting {
        session: BrainwritingSession,
    },
    /// Once per second while a round runs.
    BrainwritingTick {
        round: u32,
        #[serde(rename = "timeLeft")]
        time_left: u32,
    },
    Prompt {
        prompt: PromptBuilder,
    },
    Diagram {
        diagram: usize,
        scale: f32,
        fullscreen: bool,
        /// False when the gesture was ignored (wheel without modifier).
        consumed: bool,
    },
    Export {
        file: ExportFile,
    },
    Error {
        message: String,
    },
}

//
// HTTP response DTOs
//

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct LocaleOut {
    pub code: &'static str,
    pub name: &'static str,
    pub flag: &'static str,
}

impl From<Locale> for LocaleOut {
    fn from(l: Locale) -> Self {
        LocaleOut { code: l.code(), name: l.native_name(), flag: l.flag() }
    }
}

#[derive(Debug, Serialize)]
pub struct LocalesOut {
    pub default: &'static str,
    pub locales: Vec<LocaleOut>,
}
