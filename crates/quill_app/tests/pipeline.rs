use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use quill_app::Orchestrator;
use quill_domain::{AgentName, ChatModel, DocumentSearch, Prompt, VerificationStatus};
use quill_env::Distance;
use quill_indexer::{FileLoader, HashEmbedder, MemoryIndex, ParagraphChunker, Retriever};

const PLAN: &str = "GOAL: Report the Q4 budget overrun\n\nPLAN:\nStep 1: [Research Agent] - Find the overrun\nStep 2: [Writer Agent] - Summarize it\nStep 3: [Verifier Agent] - Check it";
const NOTES: &str = "RESEARCH NOTES:\n- Q4 budget overrun is $180K [Source: q4_project_status.md]\n\nSOURCES USED:\n- q4_project_status.md\n\nINFORMATION GAPS:\n- None";
const DRAFT: &str = "The Q4 project is $180K over budget [Source: q4_project_status.md].";

/// Replays fixed responses and keeps the prompts it was sent.
struct Script {
    responses: Mutex<VecDeque<&'static str>>,
    prompts: Mutex<Vec<String>>,
}

impl Script {
    fn new(responses: [&'static str; 4]) -> Self {
        Self { responses: Mutex::new(responses.into()), prompts: Mutex::default() }
    }
}

#[async_trait]
impl ChatModel for Script {
    async fn invoke(&self, prompt: Prompt) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.content);
        let response = self.responses.lock().unwrap().pop_front();
        response.map(str::to_string).ok_or_else(|| anyhow::anyhow!("script exhausted"))
    }
}

type HashRetriever = Retriever<HashEmbedder, MemoryIndex>;

async fn retriever(dir: &Path) -> Arc<HashRetriever> {
    std::fs::write(
        dir.join("q4_project_status.md"),
        "# Q4 Project Status\n\nThe Q4 budget overrun is $180K.\n\nDatabase performance risk is owned by Lisa Patel.",
    )
    .unwrap();
    std::fs::write(
        dir.join("weekly_report_dec8.md"),
        "# Weekly Report\n\nTeam velocity was 42 story points.",
    )
    .unwrap();
    std::fs::write(dir.join("ignored.csv"), "a,b\n1,2").unwrap();

    let retriever = Retriever::new(
        FileLoader::new(vec!["md".to_string(), "txt".to_string()]),
        ParagraphChunker::new(1000),
        HashEmbedder::new(512),
        MemoryIndex::new(Distance::Cosine),
    );
    let report = retriever.load(dir).await.unwrap();
    assert_eq!(report.files_indexed, 2);
    Arc::new(retriever)
}

#[tokio::test]
async fn test_approved_task_publishes_draft() {
    let dir = tempfile::tempdir().unwrap();
    let search = retriever(dir.path()).await;
    let model = Arc::new(Script::new([
        PLAN,
        NOTES,
        DRAFT,
        "VERIFICATION STATUS: PASS\n\nISSUES:\n- None\n\nMISSING CITATIONS:\n- None\n\nHALLUCINATIONS:\n- None\n\nRECOMMENDATION:\nAPPROVE",
    ]));
    let orchestrator = Orchestrator::new(model.clone(), search.clone(), 5);

    let actual = orchestrator.run("What is the Q4 budget overrun?").await.unwrap();

    assert!(actual.completed);
    assert_eq!(actual.final_output, DRAFT);
    assert_eq!(actual.final_output, actual.draft);
    assert_eq!(actual.citations, vec!["q4_project_status.md".to_string()]);
    assert!(actual.issues_found.is_empty());
    assert_eq!(actual.agent_trace.len(), 8);

    let distances: Vec<f32> = actual.retrieved_docs.iter().map(|doc| doc.distance).collect();
    assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(actual.retrieved_docs.len(), search.stats().await.total_chunks.min(5));

    let prompts = model.prompts.lock().unwrap().clone();
    assert!(prompts[1].contains("The Q4 budget overrun is $180K."));
    assert!(prompts[3].contains(DRAFT));
}

#[tokio::test]
async fn test_rejected_task_reaches_terminal_state() {
    let dir = tempfile::tempdir().unwrap();
    let search = retriever(dir.path()).await;
    let model = Arc::new(Script::new([
        PLAN,
        NOTES,
        "The CEO, Jane Doe, approved a $180K overrun.",
        "VERIFICATION STATUS: ISSUES FOUND\n\nISSUES:\n- CEO is not mentioned in the notes\n\nHALLUCINATIONS:\n- Jane Doe is the CEO\n\nRECOMMENDATION:\nREJECT",
    ]));
    let orchestrator = Orchestrator::new(model, search, 5).max_revisions(3);

    let actual = orchestrator.run("Who approved the Q4 overrun?").await.unwrap();

    assert!(!actual.completed);
    assert_eq!(actual.final_output, "");
    assert_eq!(actual.revisions, 0);
    let result = actual.verification_result.clone().unwrap();
    assert_eq!(result.status, VerificationStatus::IssuesFound);
    assert!(!result.is_approved());
    assert_eq!(
        actual.issues_found,
        vec![
            "CEO is not mentioned in the notes".to_string(),
            "Hallucination: Jane Doe is the CEO".to_string(),
        ]
    );
    let last = actual.agent_trace.last().unwrap();
    assert_eq!((last.agent, last.action.as_str()), (AgentName::Verifier, "Verification completed"));
}

#[tokio::test]
async fn test_second_load_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let search = retriever(dir.path()).await;
    let before = search.stats().await;

    let report = search.load(dir.path()).await.unwrap();

    assert!(report.already_loaded);
    assert_eq!(search.stats().await, before);
}
