//! Scripted `Generator` for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::llm_client::{Generation, GenerationRequest, Generator, LlmError, Usage};

pub enum Script {
    Reply(String),
    Fail,
    Hang(Duration),
}

pub struct ScriptedGenerator {
    script: Script,
    calls: AtomicUsize,
    last: Mutex<Option<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn replying(content: &str) -> Self {
        Self::new(Script::Reply(content.to_string()))
    }

    pub fn failing() -> Self {
        Self::new(Script::Fail)
    }

    pub fn hanging(for_: Duration) -> Self {
        Self::new(Script::Hang(for_))
    }

    fn new(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(request.clone());
        match &self.script {
            Script::Reply(content) => Ok(Generation {
                content: content.clone(),
                usage: Usage {
                    input_tokens: 42,
                    output_tokens: 7,
                },
            }),
            Script::Fail => Err(LlmError::Api {
                status: 529,
                message: "overloaded_error: provider shard eu-3 saturated".to_string(),
            }),
            Script::Hang(d) => {
                tokio::time::sleep(*d).await;
                Err(LlmError::EmptyContent)
            }
        }
    }
}
