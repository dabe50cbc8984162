#![allow(dead_code)]

use std::{sync::Arc, time::SystemTime};

use tokio::sync::mpsc;
use uuid::Uuid;

use millionaire_back::{
    config::AppConfig,
    dao::{
        game_store::{GameStore, MemoryGameStore},
        models::{AnswerLetter, AnswerSet, QuestionEntity},
    },
    dto::sse::ServerEvent,
    state::{AppState, ClientRole, SharedState},
};

/// Every generated question has `B` as its right answer.
pub const CORRECT: &str = "B";
pub const WRONG: &str = "A";

pub fn question(n: usize) -> QuestionEntity {
    let now = SystemTime::now();
    QuestionEntity {
        id: Uuid::new_v4(),
        content: format!("Question {n}?"),
        answers: AnswerSet {
            a: format!("{n}a"),
            b: format!("{n}b"),
            c: format!("{n}c"),
            d: format!("{n}d"),
        },
        correct_answer: AnswerLetter::B,
        created_at: now,
        updated_at: now,
    }
}

pub fn bank(size: usize) -> Vec<QuestionEntity> {
    (0..size).map(question).collect()
}

/// State backed by an in-memory store holding `size` questions.
pub fn state_with_bank(size: usize) -> (SharedState, MemoryGameStore) {
    let store = MemoryGameStore::with_questions(bank(size));
    let state = AppState::with_store(
        AppConfig::default(),
        Arc::new(store.clone()) as Arc<dyn GameStore>,
    );
    (state, store)
}

/// A registered stream client whose events can be drained synchronously.
pub struct Listener {
    rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl Listener {
    pub fn attach(state: &SharedState, client_id: &str, role: ClientRole) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        state.hub().register(client_id, role, tx);
        Self { rx }
    }

    /// Every event received so far, greeting included.
    pub fn drain(&mut self) -> Vec<(String, serde_json::Value)> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            let envelope: serde_json::Value =
                serde_json::from_str(&event.data).expect("valid envelope");
            events.push((event.event, envelope["data"].clone()));
        }
        events
    }

    /// Payloads of every drained event named `name`.
    pub fn named(&mut self, name: &str) -> Vec<serde_json::Value> {
        self.drain()
            .into_iter()
            .filter(|(event, _)| event == name)
            .map(|(_, data)| data)
            .collect()
    }
}
