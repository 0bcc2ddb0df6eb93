//! First-run data: one assistant agent wired to two prompt skills and two
//! instructions

use chrono::{DateTime, Utc};
use promptforge_types::{
    Agent, Instruction, InstructionCategory, Personality, Skill, SkillDefinition, SkillType,
};
use tracing::info;

use crate::error::Result;
use crate::{insert_agent, insert_instruction, insert_skill, PersistenceService};

pub fn default_agent(now: DateTime<Utc>) -> Agent {
    Agent {
        id: "default".to_string(),
        name: "Claude Assistant".to_string(),
        description: "The default assistant - helpful, harmless, and honest.".to_string(),
        avatar_emoji: "🧠".to_string(),
        personality: Personality {
            tone: "friendly".to_string(),
            verbosity: "balanced".to_string(),
            creativity: 0.7,
            formality: 0.5,
            traits: vec![
                "helpful".to_string(),
                "thoughtful".to_string(),
                "clear".to_string(),
            ],
        },
        system_prompt: "You are a helpful, harmless, and honest AI assistant. You aim to be \
                        direct and concise while being warm and personable."
            .to_string(),
        skills: vec!["code-review".to_string(), "explain-code".to_string()],
        instructions: vec!["code-style".to_string(), "communication".to_string()],
        tags: vec!["default".to_string()],
        usage_count: 0,
        last_used_at: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn default_skills(now: DateTime<Utc>) -> Vec<Skill> {
    vec![
        Skill {
            id: "code-review".to_string(),
            name: "Code Review".to_string(),
            description: "Perform thorough code reviews with constructive feedback".to_string(),
            icon_emoji: "🔍".to_string(),
            skill_type: SkillType::Prompt,
            definition: SkillDefinition::prompt(
                "Review the following code for:\n\
                 - Bugs and potential issues\n\
                 - Performance optimizations\n\
                 - Code style and best practices\n\
                 - Security concerns\n\n\
                 Provide specific, actionable feedback.",
            ),
            enabled: true,
            created_at: now,
            updated_at: now,
        },
        Skill {
            id: "explain-code".to_string(),
            name: "Explain Code".to_string(),
            description: "Explain code in clear, simple terms".to_string(),
            icon_emoji: "📚".to_string(),
            skill_type: SkillType::Prompt,
            definition: SkillDefinition::prompt(
                "Explain this code step by step:\n\
                 1. What does it do overall?\n\
                 2. Break down each important section\n\
                 3. Highlight any clever or tricky parts\n\
                 4. Suggest improvements if applicable",
            ),
            enabled: true,
            created_at: now,
            updated_at: now,
        },
    ]
}

pub fn default_instructions(now: DateTime<Utc>) -> Vec<Instruction> {
    vec![
        Instruction {
            id: "code-style".to_string(),
            name: "Code Style Guidelines".to_string(),
            description: "Standard code formatting and style rules".to_string(),
            icon_emoji: "📐".to_string(),
            category: InstructionCategory::CodeStyle,
            content: "# Code Style Guidelines\n\n\
                      - Use meaningful variable and function names\n\
                      - Keep functions small and focused\n\
                      - Add comments for complex logic, not obvious code\n\
                      - Follow the language's official style guide\n\
                      - Group related code together\n\
                      - Avoid deep nesting"
                .to_string(),
            priority: 7,
            tags: vec!["code".to_string(), "style".to_string()],
            enabled: true,
            created_at: now,
            updated_at: now,
        },
        Instruction {
            id: "communication".to_string(),
            name: "Communication Style".to_string(),
            description: "How to communicate responses".to_string(),
            icon_emoji: "💬".to_string(),
            category: InstructionCategory::Communication,
            content: "# Communication Style\n\n\
                      - Be direct and concise\n\
                      - Start with the answer, then explain\n\
                      - Use code examples when helpful\n\
                      - Format responses with markdown\n\
                      - Acknowledge uncertainty honestly"
                .to_string(),
            priority: 8,
            tags: vec!["communication".to_string()],
            enabled: true,
            created_at: now,
            updated_at: now,
        },
    ]
}

impl PersistenceService {
    /// Insert the default records when the store holds nothing yet
    ///
    /// Returns true when the defaults were written.
    pub async fn seed_defaults_if_empty(&self) -> Result<bool> {
        if !self.is_empty().await? {
            return Ok(false);
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        insert_agent(&mut *tx, &default_agent(now)).await?;
        for skill in default_skills(now) {
            insert_skill(&mut *tx, &skill).await?;
        }
        for instruction in default_instructions(now) {
            insert_instruction(&mut *tx, &instruction).await?;
        }
        tx.commit().await?;

        info!("Seeded default agent, skills and instructions");
        Ok(true)
    }
}
