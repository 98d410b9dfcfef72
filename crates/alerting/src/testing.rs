//! In-process fakes for the collaborator traits.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use common::{ChatTransport, Error, Result, Update, VolatilityRecord, VolatilitySource};

/// Replays scripted fetch results, then repeats the last one.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<Vec<VolatilityRecord>>>>,
    last: Mutex<Vec<VolatilityRecord>>,
    pub calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<Vec<VolatilityRecord>>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn repeating(records: Vec<VolatilityRecord>) -> Self {
        let source = Self::new(Vec::new());
        *source.last.lock().unwrap() = records;
        source
    }
}

#[async_trait]
impl VolatilitySource for ScriptedSource {
    async fn fetch(&self) -> Result<Vec<VolatilityRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(records)) => {
                *self.last.lock().unwrap() = records.clone();
                Ok(records)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last.lock().unwrap().clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub chat_id: String,
    pub text: String,
    pub reply_to: Option<i64>,
}

/// Records outbound traffic and replays scripted `getUpdates` results.
/// Once the script is exhausted `get_updates` never resolves.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<SentMessage>>,
    pub documents: Mutex<Vec<PathBuf>>,
    pub fail_sends: AtomicBool,
    pub webhook_deletes: AtomicUsize,
    updates: Mutex<VecDeque<Result<Vec<Update>>>>,
}

impl RecordingTransport {
    pub fn with_updates(script: Vec<Result<Vec<Update>>>) -> Self {
        Self {
            updates: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|m| m.text.clone()).collect()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_message(&self, chat_id: &str, text: &str, reply_to: Option<i64>) -> Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(Error::Http("connection reset by peer".into()));
        }
        self.sent.lock().unwrap().push(SentMessage {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
            reply_to,
        });
        Ok(())
    }

    async fn send_document(&self, _chat_id: &str, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no such file",
            )));
        }
        self.documents.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    async fn get_updates(&self, _offset: Option<i64>, _timeout_secs: u64) -> Result<Vec<Update>> {
        let next = self.updates.lock().unwrap().pop_front();
        match next {
            Some(r) => r,
            None => std::future::pending().await,
        }
    }

    async fn delete_webhook(&self) -> Result<()> {
        self.webhook_deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn text_update(update_id: i64, user_id: i64, text: &str) -> Update {
    serde_json::from_value(serde_json::json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id * 10,
            "chat": { "id": -100 },
            "from": { "id": user_id, "is_bot": false },
            "text": text
        }
    }))
    .unwrap()
}
