//! MemoryBank agent: a keyed, tagged context store shared by the agents
//!
//! Entries live in memory behind an async `RwLock` and are mirrored to
//! `index.json` (tags and timestamps) and `content.json` (bodies) in the
//! configured directory after every mutation. Disk failures are logged and
//! never fail the call.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tool_common::CapabilityDescriptor;

use crate::agent::{action_of, error_reply, field, str_field, unknown_action, Agent, AgentContext};
use crate::error::AgentError;

crate::define_actions! {
    pub enum MemoryAction {
        Store => "store",
        Retrieve => "retrieve",
        Update => "update",
        Delete => "delete",
        List => "list",
    }
}

const DESCRIPTION: &str = "You are the MemoryBank agent, responsible for storing and retrieving \
    information about the codebase. You act as a context engine that maintains an index of code \
    snippets, file structures, and other information other agents can retrieve quickly.";

const INDEX_FILE: &str = "index.json";
const CONTENT_FILE: &str = "content.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryMetadata {
    #[serde(default)]
    pub tags: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl MemoryMetadata {
    fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|t| self.tags.contains(t))
    }
}

#[derive(Debug, Default)]
struct MemoryStore {
    index: BTreeMap<String, MemoryMetadata>,
    content: BTreeMap<String, Value>,
}

impl MemoryStore {
    /// Load both files from `dir`; anything missing or unreadable yields an empty store
    fn load(dir: &Path) -> Self {
        let index_path = dir.join(INDEX_FILE);
        let content_path = dir.join(CONTENT_FILE);
        if !index_path.exists() || !content_path.exists() {
            return Self::default();
        }

        let loaded = (|| -> Result<Self, AgentError> {
            let index = serde_json::from_str(&std::fs::read_to_string(&index_path)?)?;
            let content = serde_json::from_str(&std::fs::read_to_string(&content_path)?)?;
            Ok(Self { index, content })
        })();

        match loaded {
            Ok(store) => {
                tracing::info!(count = store.index.len(), dir = %dir.display(), "loaded memories");
                store
            }
            Err(e) => {
                tracing::error!(dir = %dir.display(), "failed to load memory: {}", e);
                Self::default()
            }
        }
    }

    async fn save(&self, dir: &Path) {
        let result: Result<(), AgentError> = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(dir.join(INDEX_FILE), serde_json::to_vec_pretty(&self.index)?).await?;
            tokio::fs::write(dir.join(CONTENT_FILE), serde_json::to_vec_pretty(&self.content)?)
                .await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => tracing::debug!(count = self.index.len(), "saved memories"),
            Err(e) => tracing::error!(dir = %dir.display(), "failed to save memory: {}", e),
        }
    }

    fn entry(&self, key: &str, metadata: &MemoryMetadata) -> Value {
        json!({
            "key": key,
            "content": self.content.get(key).cloned().unwrap_or(Value::Null),
            "metadata": metadata,
        })
    }
}

/// Text used for substring queries: strings as-is, anything else as JSON
fn searchable(content: &Value) -> String {
    match content {
        Value::String(s) => s.to_lowercase(),
        other => other.to_string().to_lowercase(),
    }
}

/// `tags` as a list of strings; non-string entries are ignored
fn tags_of(message: &Value) -> Option<Vec<String>> {
    match message.get("tags") {
        None | Some(Value::Null) => None,
        Some(tags) => Some(
            tags.as_array()
                .map(|a| a.iter().filter_map(Value::as_str).map(String::from).collect())
                .unwrap_or_default(),
        ),
    }
}

pub struct MemoryBankAgent {
    descriptor: CapabilityDescriptor,
    memory_dir: PathBuf,
    store: RwLock<MemoryStore>,
}

impl MemoryBankAgent {
    /// Create the agent, loading any memories persisted under `memory_dir`
    pub fn new(memory_dir: impl Into<PathBuf>) -> Self {
        let memory_dir = memory_dir.into();
        if let Err(e) = std::fs::create_dir_all(&memory_dir) {
            tracing::warn!(dir = %memory_dir.display(), "could not create memory dir: {}", e);
        }
        let store = MemoryStore::load(&memory_dir);

        Self {
            descriptor: CapabilityDescriptor::new("memory_bank", DESCRIPTION, MemoryAction::schema()),
            memory_dir,
            store: RwLock::new(store),
        }
    }

    pub fn memory_dir(&self) -> &Path {
        &self.memory_dir
    }

    async fn store(&self, message: &Value, ctx: &AgentContext) -> Value {
        let Some(key) = str_field(message, "key") else {
            return error_reply("Missing key for memory");
        };
        let Some(content) = field(message, "content") else {
            return error_reply("Missing content for memory");
        };

        let mut store = self.store.write().await;
        store.content.insert(key.to_string(), content.clone());
        store.index.insert(
            key.to_string(),
            MemoryMetadata {
                tags: tags_of(message).unwrap_or_default(),
                timestamp: ctx.timestamp,
            },
        );
        store.save(&self.memory_dir).await;

        json!({
            "status": "success",
            "message": format!("Memory stored with key: {}", key),
            "key": key,
        })
    }

    async fn retrieve(&self, message: &Value) -> Value {
        let store = self.store.read().await;

        if let Some(key) = str_field(message, "key") {
            return match store.index.get(key) {
                Some(metadata) => json!({
                    "status": "success",
                    "key": key,
                    "content": store.content.get(key).cloned().unwrap_or(Value::Null),
                    "metadata": metadata,
                }),
                None => error_reply(format!("Memory not found with key: {}", key)),
            };
        }

        let query = str_field(message, "query").map(str::to_lowercase);
        let tags = tags_of(message).unwrap_or_default();
        if query.is_none() && tags.is_empty() {
            return error_reply("Must provide either key, query, or tags");
        }

        let results: Vec<Value> = store
            .index
            .iter()
            .filter(|(_, metadata)| tags.is_empty() || metadata.has_any_tag(&tags))
            .filter(|(key, _)| match &query {
                Some(q) => store
                    .content
                    .get(*key)
                    .is_some_and(|content| searchable(content).contains(q.as_str())),
                None => true,
            })
            .map(|(key, metadata)| store.entry(key, metadata))
            .collect();

        json!({
            "status": "success",
            "count": results.len(),
            "results": results,
        })
    }

    async fn update(&self, message: &Value, ctx: &AgentContext) -> Value {
        let Some(key) = str_field(message, "key") else {
            return error_reply("Missing key for memory update");
        };

        let mut store = self.store.write().await;
        if !store.content.contains_key(key) {
            return error_reply(format!("Memory not found with key: {}", key));
        }

        if let Some(content) = message.get("content").filter(|c| !c.is_null()) {
            store.content.insert(key.to_string(), content.clone());
        }
        let tags = tags_of(message);
        if let Some(metadata) = store.index.get_mut(key) {
            if let Some(tags) = tags {
                metadata.tags = tags;
            }
            metadata.timestamp = ctx.timestamp;
        }
        store.save(&self.memory_dir).await;

        json!({
            "status": "success",
            "message": format!("Memory updated with key: {}", key),
            "key": key,
        })
    }

    async fn delete(&self, message: &Value) -> Value {
        let Some(key) = str_field(message, "key") else {
            return error_reply("Missing key for memory deletion");
        };

        let mut store = self.store.write().await;
        if store.content.remove(key).is_none() {
            return error_reply(format!("Memory not found with key: {}", key));
        }
        store.index.remove(key);
        store.save(&self.memory_dir).await;

        json!({
            "status": "success",
            "message": format!("Memory deleted with key: {}", key),
        })
    }

    async fn list(&self, message: &Value) -> Value {
        let tags = tags_of(message).unwrap_or_default();
        let store = self.store.read().await;

        let keys: Vec<&str> = store
            .index
            .iter()
            .filter(|(_, metadata)| tags.is_empty() || metadata.has_any_tag(&tags))
            .map(|(key, _)| key.as_str())
            .collect();

        json!({
            "status": "success",
            "count": keys.len(),
            "keys": keys,
        })
    }
}

#[async_trait]
impl Agent for MemoryBankAgent {
    fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    async fn process(&self, message: &Value, ctx: &AgentContext) -> Result<Value, AgentError> {
        let action = action_of(message);
        let reply = match MemoryAction::from_name(action) {
            Some(MemoryAction::Store) => self.store(message, ctx).await,
            Some(MemoryAction::Retrieve) => self.retrieve(message).await,
            Some(MemoryAction::Update) => self.update(message, ctx).await,
            Some(MemoryAction::Delete) => self.delete(message).await,
            Some(MemoryAction::List) => self.list(message).await,
            None => unknown_action(action, MemoryAction::names()),
        };
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::AgentRegistry;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn ctx() -> AgentContext {
        AgentContext::new(Arc::new(AgentRegistry::new()))
    }

    async fn call(agent: &MemoryBankAgent, message: Value) -> Value {
        agent.process(&message, &ctx()).await.unwrap()
    }

    #[tokio::test]
    async fn test_store_and_retrieve_by_key() {
        let dir = TempDir::new().unwrap();
        let agent = MemoryBankAgent::new(dir.path());

        let reply = call(
            &agent,
            json!({"action": "store", "key": "db", "content": "Postgres 16", "tags": ["infra"]}),
        )
        .await;
        assert_eq!(reply["message"], "Memory stored with key: db");

        let reply = call(&agent, json!({"action": "retrieve", "key": "db"})).await;
        assert_eq!(reply["content"], "Postgres 16");
        assert_eq!(reply["metadata"]["tags"], json!(["infra"]));

        let reply = call(&agent, json!({"action": "retrieve", "key": "cache"})).await;
        assert_eq!(reply["message"], "Memory not found with key: cache");
    }

    #[tokio::test]
    async fn test_store_validation() {
        let dir = TempDir::new().unwrap();
        let agent = MemoryBankAgent::new(dir.path());

        let reply = call(&agent, json!({"action": "store", "content": "x"})).await;
        assert_eq!(reply["message"], "Missing key for memory");
        let reply = call(&agent, json!({"action": "store", "key": "k"})).await;
        assert_eq!(reply["message"], "Missing content for memory");
    }

    #[tokio::test]
    async fn test_retrieve_by_query_and_tags() {
        let dir = TempDir::new().unwrap();
        let agent = MemoryBankAgent::new(dir.path());
        call(&agent, json!({"action": "store", "key": "a", "content": "Uses Redis", "tags": ["cache"]})).await;
        call(&agent, json!({"action": "store", "key": "b", "content": "Uses Postgres", "tags": ["db"]})).await;

        let reply = call(&agent, json!({"action": "retrieve", "query": "uses"})).await;
        assert_eq!(reply["count"], 2);

        let reply = call(&agent, json!({"action": "retrieve", "query": "redis"})).await;
        assert_eq!(reply["count"], 1);
        assert_eq!(reply["results"][0]["key"], "a");

        let reply = call(&agent, json!({"action": "retrieve", "tags": ["db"]})).await;
        assert_eq!(reply["results"][0]["key"], "b");

        let reply = call(&agent, json!({"action": "retrieve", "query": "redis", "tags": ["db"]})).await;
        assert_eq!(reply["count"], 0);

        let reply = call(&agent, json!({"action": "retrieve"})).await;
        assert_eq!(reply["message"], "Must provide either key, query, or tags");
    }

    #[tokio::test]
    async fn test_update_delete_list() {
        let dir = TempDir::new().unwrap();
        let agent = MemoryBankAgent::new(dir.path());
        call(&agent, json!({"action": "store", "key": "a", "content": "one", "tags": ["x"]})).await;
        call(&agent, json!({"action": "store", "key": "b", "content": "two"})).await;

        let reply = call(&agent, json!({"action": "update", "key": "a", "tags": ["y"]})).await;
        assert_eq!(reply["status"], "success");
        let reply = call(&agent, json!({"action": "retrieve", "key": "a"})).await;
        assert_eq!(reply["content"], "one");
        assert_eq!(reply["metadata"]["tags"], json!(["y"]));

        let reply = call(&agent, json!({"action": "list", "tags": ["y"]})).await;
        assert_eq!(reply["keys"], json!(["a"]));

        let reply = call(&agent, json!({"action": "delete", "key": "a"})).await;
        assert_eq!(reply["message"], "Memory deleted with key: a");
        let reply = call(&agent, json!({"action": "list"})).await;
        assert_eq!(reply["count"], 1);
        assert_eq!(reply["keys"], json!(["b"]));

        let reply = call(&agent, json!({"action": "update", "key": "a", "content": "z"})).await;
        assert_eq!(reply["message"], "Memory not found with key: a");
    }

    #[tokio::test]
    async fn test_memories_survive_reload() {
        let dir = TempDir::new().unwrap();
        {
            let agent = MemoryBankAgent::new(dir.path());
            call(&agent, json!({"action": "store", "key": "k", "content": {"nested": true}})).await;
        }
        assert!(dir.path().join(INDEX_FILE).exists());
        assert!(dir.path().join(CONTENT_FILE).exists());

        let agent = MemoryBankAgent::new(dir.path());
        let reply = call(&agent, json!({"action": "retrieve", "key": "k"})).await;
        assert_eq!(reply["content"], json!({"nested": true}));
    }

    #[tokio::test]
    async fn test_corrupt_files_start_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(INDEX_FILE), "not json").unwrap();
        std::fs::write(dir.path().join(CONTENT_FILE), "{}").unwrap();

        let agent = MemoryBankAgent::new(dir.path());
        let reply = call(&agent, json!({"action": "list"})).await;
        assert_eq!(reply["count"], 0);
    }
}
