use std::sync::Arc;

use async_trait::async_trait;
use quill_domain::{
    AgentName, AgentTrace, ChatModel, PlannerInput, PlannerOutput, Prompt, Section, SectionSchema,
    Template, TraceEvent,
};
use tracing::{debug, info};

use super::Stage;
use crate::TemplateEngine;

const TEMPERATURE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum PlanField {
    Goal,
    Plan,
}

const SECTIONS: &[Section<PlanField>] = &[
    Section::new("GOAL:", PlanField::Goal),
    Section::new("PLAN:", PlanField::Plan),
];

const SCHEMA: SectionSchema<PlanField> = SectionSchema::new(SECTIONS);

/// Turns the free-text task into a goal and an ordered list of steps.
pub struct Planner<M> {
    model: Arc<M>,
}

impl<M> Planner<M> {
    pub fn new(model: Arc<M>) -> Self {
        Self { model }
    }
}

/// Reads the goal from the first line after `GOAL:` and collects every line
/// starting with `Step`, keeping the text after its first colon.
pub fn parse_plan(text: &str) -> PlannerOutput {
    let extracted = SCHEMA.extract(text);
    let goal = extracted.first_line(PlanField::Goal).unwrap_or_default().trim().to_string();
    let steps_text = extracted.get(PlanField::Plan).unwrap_or(text);
    let plan = steps_text
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("Step"))
        .map(|line| match line.split_once(':') {
            Some((_, step)) => step.trim().to_string(),
            None => line.to_string(),
        })
        .collect();

    PlannerOutput { goal, plan }
}

#[async_trait]
impl<M: ChatModel> Stage for Planner<M> {
    type Input = PlannerInput;
    type Output = PlannerOutput;

    async fn run(&self, input: PlannerInput, trace: &mut AgentTrace) -> anyhow::Result<PlannerOutput> {
        trace.push(TraceEvent::new(AgentName::Planner, "Creating plan").input(input.task.clone()));
        info!(task = %input.task, "Planning");

        let content = TemplateEngine::default().render(Template::new("planner.md"), &input)?;
        let response = self.model.invoke(Prompt::new(content).temperature(TEMPERATURE)).await?;
        debug!(response_len = response.len(), "Planner responded");

        let output = parse_plan(&response);
        trace.push(
            TraceEvent::new(AgentName::Planner, "Plan created")
                .output(format!("Goal: {}, Steps: {}", output.goal, output.plan.len())),
        );
        info!(goal = %output.goal, steps = output.plan.len(), "Plan created");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_utils::ScriptedModel;

    #[test]
    fn test_parse_plan() {
        let fixture = "GOAL: Summarize Q4 risks\n\nPLAN:\nStep 1: [Research Agent] - Find risks\nStep 2: [Writer Agent] - Draft summary\nStep 3 without colon\n";

        let actual = parse_plan(fixture);

        let expected = PlannerOutput {
            goal: "Summarize Q4 risks".to_string(),
            plan: vec![
                "[Research Agent] - Find risks".to_string(),
                "[Writer Agent] - Draft summary".to_string(),
                "Step 3 without colon".to_string(),
            ],
        };
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_parse_plan_without_markers() {
        let fixture = "I'd suggest:\nStep 1: Research\nStep 2: Write";

        let actual = parse_plan(fixture);

        assert_eq!(actual.goal, "");
        assert_eq!(actual.plan, vec!["Research".to_string(), "Write".to_string()]);
    }

    #[tokio::test]
    async fn test_run_records_start_and_end() {
        let model = Arc::new(ScriptedModel::new(["GOAL: g\nPLAN:\nStep 1: a\nStep 2: b"]));
        let planner = Planner::new(model.clone());
        let mut trace = AgentTrace::default();

        let actual = planner
            .run(PlannerInput { task: "Summarize Q4".to_string() }, &mut trace)
            .await
            .unwrap();

        assert_eq!(actual.plan.len(), 2);
        let events: Vec<_> = trace.iter().map(|e| (e.action.as_str(), e.output.as_deref())).collect();
        assert_eq!(
            events,
            vec![("Creating plan", None), ("Plan created", Some("Goal: g, Steps: 2"))]
        );
        let prompts = model.prompts();
        assert!(prompts[0].content.contains("User Request: Summarize Q4"));
        assert_eq!(prompts[0].temperature, Some(0.1));
    }
}
