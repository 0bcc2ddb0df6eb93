//! Integration tests against a real SQLite file

use chrono::Utc;
use promptforge_persistence::{PersistenceService, StoreError};
use promptforge_types::{
    ExportBundle, ForgeError, InstructionCategory, NewAgent, NewInstruction, NewSkill, SkillType,
    ThemeMode,
};
use tempfile::TempDir;

async fn open_store() -> (TempDir, PersistenceService) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = PersistenceService::new(dir.path().join("forge.db"))
        .await
        .expect("open store");
    (dir, store)
}

#[tokio::test]
async fn test_agent_crud() {
    let (_dir, store) = open_store().await;

    let created = store
        .create_agent(NewAgent {
            name: "Reviewer".into(),
            system_prompt: "Review carefully.".into(),
            ..NewAgent::default()
        })
        .await
        .unwrap();
    assert_eq!(created.usage_count, 0);

    let fetched = store.get_agent(&created.id).await.unwrap().unwrap();
    assert_eq!(fetched, created);

    let mut edited = fetched.clone();
    edited.name = "Strict Reviewer".into();
    let updated = store.update_agent(&edited).await.unwrap();
    assert_eq!(updated.name, "Strict Reviewer");
    assert!(updated.updated_at >= created.updated_at);

    store.delete_agent(&created.id).await.unwrap();
    assert!(store.get_agent(&created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_and_delete_missing_return_not_found() {
    let (_dir, store) = open_store().await;
    let mut ghost = store.create_agent(NewAgent::default()).await.unwrap();
    store.delete_agent(&ghost.id).await.unwrap();

    ghost.name = "Ghost".into();
    let err = store.update_agent(&ghost).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    let err = store.delete_skill("nope").await.unwrap_err();
    let forge: ForgeError = err.into();
    assert_eq!(forge.kind(), "not_found");
}

#[tokio::test]
async fn test_update_agent_does_not_touch_usage() {
    let (_dir, store) = open_store().await;
    let agent = store.create_agent(NewAgent::default()).await.unwrap();

    store.record_agent_usage(&agent.id, Utc::now()).await.unwrap();

    // `agent` is a stale copy with usage_count 0
    let mut stale = agent.clone();
    stale.description = "edited".into();
    let updated = store.update_agent(&stale).await.unwrap();
    assert_eq!(updated.usage_count, 1);
    assert!(updated.last_used_at.is_some());
}

#[tokio::test]
async fn test_concurrent_usage_increments_are_not_lost() {
    let (_dir, store) = open_store().await;
    let agent = store.create_agent(NewAgent::default()).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let store = store.clone();
        let id = agent.id.clone();
        handles.push(tokio::spawn(async move {
            store.record_agent_usage(&id, Utc::now()).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let agent = store.get_agent(&agent.id).await.unwrap().unwrap();
    assert_eq!(agent.usage_count, 20);
}

#[tokio::test]
async fn test_record_usage_unknown_agent() {
    let (_dir, store) = open_store().await;
    let result = store.record_agent_usage("missing", Utc::now()).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_agents_ordered_by_usage_then_name() {
    let (_dir, store) = open_store().await;
    for name in ["Charlie", "Alpha", "Bravo"] {
        store
            .create_agent(NewAgent {
                name: name.into(),
                ..NewAgent::default()
            })
            .await
            .unwrap();
    }
    let charlie = store
        .list_agents()
        .await
        .unwrap()
        .into_iter()
        .find(|a| a.name == "Charlie")
        .unwrap();
    store.record_agent_usage(&charlie.id, Utc::now()).await.unwrap();

    let names: Vec<String> = store
        .list_agents()
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.name)
        .collect();
    assert_eq!(names, vec!["Charlie", "Alpha", "Bravo"]);
}

#[tokio::test]
async fn test_skill_type_mismatch_rejected() {
    let (_dir, store) = open_store().await;
    let mut input = NewSkill::prompt("Broken", "x");
    input.skill_type = SkillType::Workflow;

    let err = store.create_skill(input).await.unwrap_err();
    match ForgeError::from(err) {
        ForgeError::Validation { field, .. } => assert_eq!(field, "definition"),
        other => panic!("expected validation error, got {:?}", other),
    }
    assert!(store.list_skills().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_instruction_priority_clamped_on_update() {
    let (_dir, store) = open_store().await;
    let mut instruction = store
        .create_instruction(NewInstruction {
            name: "Security".into(),
            category: InstructionCategory::Security,
            ..NewInstruction::default()
        })
        .await
        .unwrap();
    assert_eq!(instruction.priority, 5);

    instruction.priority = 42;
    let updated = store.update_instruction(&instruction).await.unwrap();
    assert_eq!(updated.priority, 10);
    assert_eq!(updated.category, InstructionCategory::Security);
}

#[tokio::test]
async fn test_deleting_skill_leaves_agent_references() {
    let (_dir, store) = open_store().await;
    let skill = store
        .create_skill(NewSkill::prompt("Temp", "t"))
        .await
        .unwrap();
    let agent = store
        .create_agent(NewAgent {
            skills: vec![skill.id.clone()],
            ..NewAgent::default()
        })
        .await
        .unwrap();

    store.delete_skill(&skill.id).await.unwrap();

    let agent = store.get_agent(&agent.id).await.unwrap().unwrap();
    assert_eq!(agent.skills, vec![skill.id]);
}

#[tokio::test]
async fn test_settings_default_and_save() {
    let (_dir, store) = open_store().await;
    let mut settings = store.get_settings().await.unwrap();
    assert_eq!(settings.mcp_server_port, 3333);

    settings.theme.mode = ThemeMode::Light;
    settings.data_directory = Some("/tmp/forge".into());
    store.save_settings(&settings).await.unwrap();

    assert_eq!(store.get_settings().await.unwrap(), settings);
}

#[tokio::test]
async fn test_export_import_round_trip() {
    let (_dir, source) = open_store().await;
    source.seed_defaults_if_empty().await.unwrap();
    source.record_agent_usage("default", Utc::now()).await.unwrap();
    let bundle = source.export_all().await.unwrap();
    assert_eq!(bundle.version, "1.0");

    let (_dir2, target) = open_store().await;
    target
        .create_agent(NewAgent {
            name: "Replaced".into(),
            ..NewAgent::default()
        })
        .await
        .unwrap();
    target.import_all(&bundle).await.unwrap();

    let restored = target.export_all().await.unwrap();
    assert_eq!(restored.agents, bundle.agents);
    assert_eq!(restored.skills, bundle.skills);
    assert_eq!(restored.instructions, bundle.instructions);
    assert_eq!(restored.agents[0].usage_count, 1);
}

#[tokio::test]
async fn test_failed_import_leaves_store_untouched() {
    let (_dir, store) = open_store().await;
    store.seed_defaults_if_empty().await.unwrap();
    let before = store.export_all().await.unwrap();

    let mut bundle: ExportBundle = before.clone();
    bundle.agents.push(bundle.agents[0].clone()); // duplicate primary key
    bundle.skills.clear();

    assert!(store.import_all(&bundle).await.is_err());

    let after = store.export_all().await.unwrap();
    assert_eq!(after.agents, before.agents);
    assert_eq!(after.skills, before.skills);
    assert_eq!(after.instructions, before.instructions);
}

#[tokio::test]
async fn test_import_rejects_unknown_version() {
    let (_dir, store) = open_store().await;
    let mut bundle = store.export_all().await.unwrap();
    bundle.version = "2.0".into();

    let err = ForgeError::from(store.import_all(&bundle).await.unwrap_err());
    assert_eq!(err.kind(), "validation_error");
}

#[tokio::test]
async fn test_seed_runs_once() {
    let (_dir, store) = open_store().await;
    assert!(store.seed_defaults_if_empty().await.unwrap());
    assert!(!store.seed_defaults_if_empty().await.unwrap());

    let agents = store.list_agents().await.unwrap();
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0].id, "default");
    assert_eq!(store.list_skills().await.unwrap().len(), 2);
    assert_eq!(store.list_instructions().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_reopen_preserves_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("forge.db");
    {
        let store = PersistenceService::new(&path).await.unwrap();
        store.seed_defaults_if_empty().await.unwrap();
    }
    let store = PersistenceService::new(&path).await.unwrap();
    assert!(!store.is_empty().await.unwrap());
}
