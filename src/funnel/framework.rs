//! Catalog of the copywriting and behavioral frameworks the server knows about.
//!
//! Framework identifiers are opaque labels to the engine: unknown identifiers
//! are scored like any other, they just get a generic focus line in prompts
//! and fallback text.

use serde::Serialize;

/// Identifier of the Fogg Behavior Model framework.
pub const FOGG_FRAMEWORK: &str = "Fogg";

/// Focus used for identifiers that are not in the catalog.
pub const GENERIC_FOCUS: &str = "conversion improvement";

/// Static description of a known framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameworkInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub focus: &'static str,
}

/// All known frameworks, in presentation order.
pub const FRAMEWORKS: [FrameworkInfo; 9] = [
    FrameworkInfo {
        id: "PAS",
        name: "Problem-Agitation-Solution",
        description: "Identify pain points, amplify urgency, present clear solution",
        focus: "emotional triggers and problem-solving",
    },
    FrameworkInfo {
        id: FOGG_FRAMEWORK,
        name: "Fogg Behavior Model",
        description: "Behavior = Motivation × Ability × Trigger",
        focus: "reducing friction and increasing motivation",
    },
    FrameworkInfo {
        id: "Nielsen",
        name: "Nielsen's Usability Heuristics",
        description: "User interface design principles for better UX",
        focus: "usability and user experience optimization",
    },
    FrameworkInfo {
        id: "AIDA",
        name: "Attention-Interest-Desire-Action",
        description: "Classic marketing funnel progression",
        focus: "progressive engagement and conversion",
    },
    FrameworkInfo {
        id: "Cialdini",
        name: "Cialdini's Persuasion Principles",
        description: "Social proof, scarcity, authority, commitment",
        focus: "psychological persuasion triggers",
    },
    FrameworkInfo {
        id: "SCARF",
        name: "Status-Certainty-Autonomy-Relatedness-Fairness",
        description: "Neuroleadership model for reducing threat response",
        focus: "psychological safety and trust building",
    },
    FrameworkInfo {
        id: "JTBD",
        name: "Jobs To Be Done",
        description: "Focus on the job users are hiring your product to do",
        focus: "user motivation and outcome achievement",
    },
    FrameworkInfo {
        id: "TOTE",
        name: "Test-Operate-Test-Exit",
        description: "Iterative improvement and feedback loops",
        focus: "continuous optimization and user feedback",
    },
    FrameworkInfo {
        id: "ELM",
        name: "Elaboration Likelihood Model",
        description: "Central vs peripheral route to persuasion",
        focus: "cognitive processing and persuasion depth",
    },
];

/// Look up a framework by identifier, ignoring ASCII case.
pub fn lookup(id: &str) -> Option<&'static FrameworkInfo> {
    FRAMEWORKS.iter().find(|f| f.id.eq_ignore_ascii_case(id.trim()))
}

/// Focus line for prompts and fallback text.
pub fn focus_for(id: &str) -> &'static str {
    lookup(id).map(|f| f.focus).unwrap_or(GENERIC_FOCUS)
}

/// Whether the identifier names the Fogg Behavior Model.
pub fn is_fogg(id: &str) -> bool {
    id.trim().eq_ignore_ascii_case(FOGG_FRAMEWORK)
}
