//! End-to-end tests over in-memory duplex pipes

#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use promptforge_mcp::{McpServer, ServerInfo, ServerState};
use promptforge_persistence::{PersistenceService, Store, StoreError};
use promptforge_types::{
    Agent, ExportBundle, Instruction, InstructionCategory, NewAgent, NewInstruction, NewSkill,
    Settings, Skill, BUNDLE_VERSION,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf};

const TIMEOUT: Duration = Duration::from_secs(5);

struct TestClient {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
    next_id: u64,
}

impl TestClient {
    async fn send_raw(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        self.writer.flush().await.unwrap();
    }

    async fn recv(&mut self) -> Value {
        let line = tokio::time::timeout(TIMEOUT, self.lines.next_line())
            .await
            .expect("timed out waiting for response")
            .unwrap()
            .expect("channel closed");
        serde_json::from_str(&line).unwrap()
    }

    async fn request(&mut self, method: &str, params: Value) -> Value {
        let id = self.next_id;
        self.next_id += 1;
        let msg = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        self.send_raw(&msg.to_string()).await;
        let response = self.recv().await;
        assert_eq!(response["id"], id);
        response
    }

    async fn call_tool(&mut self, name: &str, arguments: Value) -> Value {
        let response = self
            .request("tools/call", json!({ "name": name, "arguments": arguments }))
            .await;
        assert!(response.get("error").is_none(), "unexpected error: {response}");
        response["result"].clone()
    }
}

async fn connect(server: &McpServer) -> TestClient {
    let (client_end, server_end) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_end);
    server.start(server_read, server_write).await;

    let (client_read, client_write) = tokio::io::split(client_end);
    TestClient {
        lines: BufReader::new(client_read).lines(),
        writer: client_write,
        next_id: 1,
    }
}

fn scenario_bundle() -> ExportBundle {
    let now = Utc::now();
    let agent = Agent::new(
        "a1".into(),
        NewAgent {
            name: "Researcher".into(),
            system_prompt: "You research.".into(),
            skills: vec!["s1".into(), "s_missing".into()],
            instructions: vec!["i1".into()],
            ..NewAgent::default()
        },
        now,
    );
    let skills = vec![
        Skill::new("s1".into(), NewSkill::prompt("Concise", "Be concise."), now),
        Skill::new("s2".into(), NewSkill::prompt("my skill", "Mine."), now),
    ];
    let instruction = |id: &str, name: &str, category, priority, enabled| {
        Instruction::new(
            id.into(),
            NewInstruction {
                name: name.into(),
                category,
                priority,
                enabled,
                content: format!("{name} content"),
                ..NewInstruction::default()
            },
            now,
        )
    };
    let mut i1 = instruction("i1", "Cite", InstructionCategory::General, 5, true);
    i1.content = "Always cite sources.".into();
    let instructions = vec![
        i1,
        instruction("i2", "B", InstructionCategory::Security, 5, true),
        instruction("i3", "A", InstructionCategory::Security, 5, true),
        instruction("i4", "Off", InstructionCategory::Security, 9, false),
    ];

    ExportBundle {
        agents: vec![agent],
        skills,
        instructions,
        settings: Settings::default(),
        exported_at: now,
        version: BUNDLE_VERSION.to_string(),
    }
}

async fn sqlite_server() -> (TempDir, PersistenceService, McpServer, TestClient) {
    let dir = tempfile::tempdir().unwrap();
    let store = PersistenceService::new(dir.path().join("forge.db")).await.unwrap();
    store.import_all(&scenario_bundle()).await.unwrap();

    let server = McpServer::new(Arc::new(store.clone()), ServerInfo::default());
    let client = connect(&server).await;
    (dir, store, server, client)
}

#[tokio::test]
async fn test_initialize_handshake() {
    let (_dir, _store, server, mut client) = sqlite_server().await;

    let response = client.request("initialize", json!({})).await;
    assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(response["result"]["serverInfo"]["name"], "prompt-forge");
    assert!(response["result"]["capabilities"]["tools"].is_object());

    // Notification: no response, next frame answers the ping
    client
        .send_raw(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .await;
    let pong = client.request("ping", json!({})).await;
    assert_eq!(pong["result"], json!({}));

    let tools = client.request("tools/list", json!({})).await;
    assert_eq!(tools["result"]["tools"].as_array().unwrap().len(), 6);

    server.stop().await;
}

#[tokio::test]
async fn test_apply_agent_resolves_and_counts_usage() {
    let (_dir, store, server, mut client) = sqlite_server().await;

    let result = client.call_tool("apply_agent", json!({ "agent_id": "a1" })).await;
    assert_eq!(result["isError"], false);

    let applied = &result["structuredContent"];
    let skill_ids: Vec<&str> = applied["resolved_skills"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(skill_ids, vec!["s1"]);
    assert_eq!(applied["resolved_instructions"][0]["id"], "i1");
    assert_eq!(applied["resolved_instructions"].as_array().unwrap().len(), 1);
    assert_eq!(applied["usage"]["recorded"], true);
    assert_eq!(applied["agent"]["usage_count"], 1);

    let text = result["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("Be concise."));
    assert!(text.contains("Always cite sources."));

    let stored = store.get_agent("a1").await.unwrap().unwrap();
    assert_eq!(stored.usage_count, 1);
    assert!(stored.last_used_at.is_some());

    server.stop().await;
}

#[tokio::test]
async fn test_apply_unknown_agent_changes_nothing() {
    let (_dir, store, server, mut client) = sqlite_server().await;

    let result = client.call_tool("apply_agent", json!({ "agent_id": "ghost" })).await;
    assert_eq!(result["isError"], true);
    assert_eq!(result["structuredContent"]["error"]["kind"], "not_found");

    for agent in store.list_agents().await.unwrap() {
        assert_eq!(agent.usage_count, 0);
    }
    server.stop().await;
}

#[tokio::test]
async fn test_get_agent_and_list_agents() {
    let (_dir, _store, server, mut client) = sqlite_server().await;

    let list = client.call_tool("list_agents", json!({})).await;
    let agents = list["structuredContent"]["agents"].as_array().unwrap();
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0]["id"], "a1");
    assert!(agents[0].get("system_prompt").is_none());

    let full = client.call_tool("get_agent", json!({ "agent_id": "a1" })).await;
    assert_eq!(full["structuredContent"]["system_prompt"], "You research.");

    let missing = client.call_tool("get_agent", json!({})).await;
    assert_eq!(missing["structuredContent"]["error"]["kind"], "validation_error");

    server.stop().await;
}

#[tokio::test]
async fn test_get_skill_by_name_case_insensitive() {
    let (_dir, _store, server, mut client) = sqlite_server().await;

    let result = client.call_tool("get_skill", json!({ "id_or_name": "My Skill" })).await;
    assert_eq!(result["structuredContent"]["id"], "s2");

    let alias = client.call_tool("get_skill", json!({ "skill_id": "s1" })).await;
    assert_eq!(alias["structuredContent"]["name"], "Concise");

    let missing = client.call_tool("get_skill", json!({ "id_or_name": "nope" })).await;
    assert_eq!(missing["isError"], true);

    let list = client.call_tool("list_skills", json!({})).await;
    assert_eq!(list["structuredContent"]["skills"].as_array().unwrap().len(), 2);

    server.stop().await;
}

#[tokio::test]
async fn test_get_instructions_ordering_and_filter() {
    let (_dir, _store, server, mut client) = sqlite_server().await;

    let security = client
        .call_tool("get_instructions", json!({ "category": "security" }))
        .await;
    let names: Vec<&str> = security["structuredContent"]["instructions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["A", "B"]);

    let all = client.call_tool("get_instructions", json!({})).await;
    assert_eq!(all["structuredContent"]["instructions"].as_array().unwrap().len(), 3);

    let unknown = client
        .call_tool("get_instructions", json!({ "category": "poetry" }))
        .await;
    assert_eq!(unknown["isError"], false);
    assert!(unknown["structuredContent"]["instructions"].as_array().unwrap().is_empty());

    server.stop().await;
}

#[tokio::test]
async fn test_resources() {
    let (_dir, _store, server, mut client) = sqlite_server().await;

    let list = client.request("resources/list", json!({})).await;
    let uris: Vec<&str> = list["result"]["resources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["uri"].as_str().unwrap())
        .collect();
    assert_eq!(
        uris,
        vec!["prompt-forge://agents/a1", "prompt-forge://instructions/all"]
    );

    let digest = client
        .request("resources/read", json!({ "uri": "prompt-forge://instructions/all" }))
        .await;
    let text = digest["result"]["contents"][0]["text"].as_str().unwrap();
    assert!(text.contains("Always cite sources."));
    assert!(!text.contains("Off content"));

    let agent = client
        .request("resources/read", json!({ "uri": "prompt-forge://agents/a1" }))
        .await;
    assert_eq!(agent["result"]["contents"][0]["mimeType"], "application/json");

    let missing = client
        .request("resources/read", json!({ "uri": "prompt-forge://agents/zzz" }))
        .await;
    assert_eq!(missing["error"]["code"], -32602);

    server.stop().await;
}

#[tokio::test]
async fn test_bad_requests_keep_channel_open() {
    let (_dir, _store, server, mut client) = sqlite_server().await;

    client.send_raw("{not json").await;
    let parse_error = client.recv().await;
    assert_eq!(parse_error["error"]["code"], -32700);
    assert_eq!(parse_error["id"], Value::Null);

    let unknown_method = client.request("tools/explode", json!({})).await;
    assert_eq!(unknown_method["error"]["code"], -32601);

    let unknown_tool = client
        .request("tools/call", json!({ "name": "delete_everything" }))
        .await;
    assert_eq!(unknown_tool["error"]["code"], -32602);

    let bad_arguments = client
        .request("tools/call", json!({ "name": "get_agent", "arguments": [1, 2] }))
        .await;
    assert_eq!(bad_arguments["error"]["code"], -32602);

    client.send_raw(r#"{"jsonrpc":"1.0","id":99,"method":"ping"}"#).await;
    let wrong_version = client.recv().await;
    assert_eq!(wrong_version["error"]["code"], -32600);
    assert_eq!(wrong_version["id"], 99);

    client.send_raw(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#).await;
    let null_id = client.recv().await;
    assert_eq!(null_id["id"], Value::Null);
    assert_eq!(null_id["result"], json!({}));

    let pong = client.request("ping", json!({})).await;
    assert!(pong.get("result").is_some());

    server.stop().await;
}

// ----------------------------------------------------------------------------
// Lifecycle
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_start_stop_are_idempotent() {
    let (_dir, _store, server, _client) = sqlite_server().await;
    assert_eq!(server.status().state, ServerState::Running);

    // Second start is a no-op, the first channel stays attached
    let (_, other) = tokio::io::duplex(1024);
    let (r, w) = tokio::io::split(other);
    assert_eq!(server.start(r, w).await.state, ServerState::Running);

    assert_eq!(server.stop().await.state, ServerState::Stopped);
    assert_eq!(server.stop().await.state, ServerState::Stopped);
}

#[tokio::test]
async fn test_client_hangup_stops_server() {
    let (_dir, _store, server, client) = sqlite_server().await;
    drop(client);

    tokio::time::timeout(TIMEOUT, server.stopped()).await.unwrap();
    assert_eq!(server.status().state, ServerState::Stopped);

    // Can be started again on a new channel
    let mut client = connect(&server).await;
    assert_eq!(server.status().state, ServerState::Running);
    client.request("ping", json!({})).await;
    server.stop().await;
}

/// In-memory store with injectable latency and usage failures
#[derive(Default)]
struct MemoryStore {
    agents: Mutex<Vec<Agent>>,
    fail_usage: bool,
    delay: Option<Duration>,
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_agents(&self) -> promptforge_persistence::Result<Vec<Agent>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.agents.lock().unwrap().clone())
    }

    async fn get_agent(&self, id: &str) -> promptforge_persistence::Result<Option<Agent>> {
        Ok(self.agents.lock().unwrap().iter().find(|a| a.id == id).cloned())
    }

    async fn list_skills(&self) -> promptforge_persistence::Result<Vec<Skill>> {
        Ok(Vec::new())
    }

    async fn list_instructions(&self) -> promptforge_persistence::Result<Vec<Instruction>> {
        Ok(Vec::new())
    }

    async fn record_agent_usage(
        &self,
        id: &str,
        at: DateTime<Utc>,
    ) -> promptforge_persistence::Result<Option<Agent>> {
        if self.fail_usage {
            return Err(StoreError::Corrupt {
                column: "usage_count".into(),
                reason: "disk is read-only".into(),
            });
        }
        let mut agents = self.agents.lock().unwrap();
        Ok(agents.iter_mut().find(|a| a.id == id).map(|agent| {
            agent.record_usage(at);
            agent.clone()
        }))
    }
}

fn memory_store(fail_usage: bool, delay: Option<Duration>) -> Arc<MemoryStore> {
    let agent = Agent::new("a1".into(), NewAgent::default(), Utc::now());
    Arc::new(MemoryStore {
        agents: Mutex::new(vec![agent]),
        fail_usage,
        delay,
    })
}

#[tokio::test]
async fn test_usage_failure_still_returns_composite() {
    let store = memory_store(true, None);
    let server = McpServer::new(store.clone(), ServerInfo::default());
    let mut client = connect(&server).await;

    let result = client.call_tool("apply_agent", json!({ "agent_id": "a1" })).await;
    assert_eq!(result["isError"], false);
    let usage = &result["structuredContent"]["usage"];
    assert_eq!(usage["recorded"], false);
    assert!(usage["error"].as_str().unwrap().contains("disk is read-only"));
    assert_eq!(result["structuredContent"]["agent"]["id"], "a1");

    assert_eq!(store.agents.lock().unwrap()[0].usage_count, 0);
    server.stop().await;
}

#[tokio::test]
async fn test_stop_drains_in_flight_request() {
    let store = memory_store(false, Some(Duration::from_millis(300)));
    let server = McpServer::new(store, ServerInfo::default());
    let mut client = connect(&server).await;

    client
        .send_raw(
            &json!({
                "jsonrpc": "2.0", "id": 1, "method": "tools/call",
                "params": { "name": "list_agents" }
            })
            .to_string(),
        )
        .await;
    // Let the server pick the request up before stopping
    tokio::time::sleep(Duration::from_millis(50)).await;

    let status = server.stop().await;
    assert_eq!(status.state, ServerState::Stopped);

    let response = client.recv().await;
    assert_eq!(response["id"], 1);
    assert_eq!(response["result"]["isError"], false);
    assert_eq!(status.served_requests, 1);
}
