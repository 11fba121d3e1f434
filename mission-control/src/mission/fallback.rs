//! Deterministic stand-ins used when an AI-service call fails

use mission_types::{
    ActionItem, ActionPriority, AgentContribution, DetailedPlan, MissionResult, ObjectiveAnalysis,
    PlanPhase, ResourceRef, RiskEntry,
};

pub fn analysis() -> ObjectiveAnalysis {
    ObjectiveAnalysis {
        category: "general".to_string(),
        complexity: "medium".to_string(),
        required_expertise: strings(&["strategy", "execution", "analysis"]),
        estimated_duration: "2-4 weeks".to_string(),
    }
}

pub fn contribution(agent_id: &str) -> AgentContribution {
    AgentContribution {
        agent_id: agent_id.to_string(),
        agent_name: display_name(agent_id),
        analysis: format!("Analysis from {agent_id} perspective"),
        recommendations: vec![format!("Recommendation from {agent_id}")],
        resources: Some(Vec::new()),
    }
}

/// `roxy` -> `Roxy`
pub fn display_name(agent_id: &str) -> String {
    let mut chars = agent_id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A complete three-phase plan built only from the objective and contributions
pub fn mission_result(objective: &str, contributions: &[AgentContribution]) -> MissionResult {
    MissionResult {
        executive_summary: format!(
            "Mission Control has analyzed your objective: \"{objective}\". Based on the analysis from {} AI agents, we've created a comprehensive plan to help you achieve this goal.",
            contributions.len()
        ),
        detailed_plan: DetailedPlan {
            overview: format!(
                "This plan outlines the key steps and strategies to accomplish: {objective}"
            ),
            phases: vec![
                phase(
                    "Phase 1: Planning & Preparation",
                    "Establish foundation and gather resources",
                    "1-2 weeks",
                    &[
                        "Define clear success metrics",
                        "Identify required resources",
                        "Set up tracking systems",
                        "Establish team roles",
                    ],
                ),
                phase(
                    "Phase 2: Execution",
                    "Implement core strategies and tactics",
                    "4-6 weeks",
                    &[
                        "Execute primary initiatives",
                        "Monitor progress regularly",
                        "Adjust strategies as needed",
                        "Maintain stakeholder communication",
                    ],
                ),
                phase(
                    "Phase 3: Optimization",
                    "Refine and scale successful approaches",
                    "2-3 weeks",
                    &[
                        "Analyze performance data",
                        "Optimize underperforming areas",
                        "Scale successful tactics",
                        "Document learnings",
                    ],
                ),
            ],
        },
        action_items: vec![
            action(
                "1",
                "Define Success Metrics",
                "Establish clear, measurable KPIs for tracking progress",
                ActionPriority::High,
                "2-3 hours",
            ),
            action(
                "2",
                "Create Project Timeline",
                "Develop detailed timeline with milestones",
                ActionPriority::High,
                "3-4 hours",
            ),
            action(
                "3",
                "Identify Resources",
                "List all required tools, budget, and team members",
                ActionPriority::Medium,
                "2 hours",
            ),
        ],
        resources: vec![
            ResourceRef {
                kind: "tool".to_string(),
                title: "Project Management Software".to_string(),
                description: "Use tools like Asana, Trello, or Monday.com to track progress"
                    .to_string(),
                url: None,
            },
            ResourceRef {
                kind: "template".to_string(),
                title: "Strategic Planning Template".to_string(),
                description: "Structured template for organizing your strategy".to_string(),
                url: None,
            },
        ],
        agent_contributions: contributions.to_vec(),
        risks: vec![
            RiskEntry {
                risk: "Resource Constraints".to_string(),
                impact: "May delay timeline or reduce scope".to_string(),
                mitigation: "Prioritize critical tasks and consider phased approach".to_string(),
            },
            RiskEntry {
                risk: "Market Changes".to_string(),
                impact: "Strategy may need adjustment".to_string(),
                mitigation: "Build flexibility into plan and monitor market regularly".to_string(),
            },
        ],
        success_metrics: strings(&[
            "Achievement of primary objective",
            "Timeline adherence",
            "Resource efficiency",
            "Stakeholder satisfaction",
            "ROI on invested resources",
        ]),
    }
}

fn phase(name: &str, description: &str, duration: &str, tasks: &[&str]) -> PlanPhase {
    PlanPhase {
        name: name.to_string(),
        description: description.to_string(),
        duration: duration.to_string(),
        tasks: strings(tasks),
    }
}

fn action(
    id: &str,
    title: &str,
    description: &str,
    priority: ActionPriority,
    estimated_time: &str,
) -> ActionItem {
    ActionItem {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        priority,
        assigned_to: None,
        estimated_time: Some(estimated_time.to_string()),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_capitalizes_first_letter() {
        assert_eq!(display_name("roxy"), "Roxy");
        assert_eq!(display_name("vex-2"), "Vex-2");
        assert_eq!(display_name(""), "");
    }

    #[test]
    fn test_contribution_shape() {
        let fallback = contribution("blaze");
        assert_eq!(fallback.agent_name, "Blaze");
        assert_eq!(fallback.analysis, "Analysis from blaze perspective");
        assert_eq!(fallback.recommendations, vec!["Recommendation from blaze"]);
        assert_eq!(fallback.resources, Some(vec![]));
    }

    #[test]
    fn test_mission_result_is_complete() {
        let contributions = vec![contribution("roxy"), contribution("echo")];
        let result = mission_result("Launch a podcast", &contributions);

        assert!(result.executive_summary.contains("\"Launch a podcast\""));
        assert!(result.executive_summary.contains("from 2 AI agents"));
        assert_eq!(result.detailed_plan.phases.len(), 3);
        assert_eq!(result.action_items.len(), 3);
        assert_eq!(result.resources.len(), 2);
        assert_eq!(result.risks.len(), 2);
        assert_eq!(result.success_metrics.len(), 5);
        assert_eq!(result.agent_contributions, contributions);
        assert_eq!(result.action_items[2].priority, ActionPriority::Medium);
    }
}
