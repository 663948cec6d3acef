use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::framework::is_fogg;

/// Label of the synthetic variant produced by Fogg step reordering.
pub const FOGG_VARIANT_LABEL: &str = "Fogg-BM";

// ============================================================================
// Input
// ============================================================================

/// One funnel step as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Caller-assigned step index. Falls back to the step's position when absent.
    #[serde(rename = "stepIndex", default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    /// Observed conversion rate of the step (0.0-1.0).
    #[serde(rename = "observedCR")]
    pub observed_cr: f64,
    /// Declared question load.
    #[serde(rename = "Qs", default, skip_serializing_if = "Option::is_none")]
    pub qs: Option<f64>,
    /// Declared invasiveness.
    #[serde(rename = "Is", default, skip_serializing_if = "Option::is_none")]
    pub is: Option<f64>,
    /// Declared difficulty.
    #[serde(rename = "Ds", default, skip_serializing_if = "Option::is_none")]
    pub ds: Option<f64>,
    /// Question records; plain strings or `{question, invasiveness, difficulty}` objects.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<Question>,
    /// Question texts, used for prompting only.
    #[serde(rename = "questionTexts", default, skip_serializing_if = "Vec::is_empty")]
    pub question_texts: Vec<String>,
    /// Boost count, opaque to scoring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boosts: Option<f64>,
}

impl Step {
    /// Create a step with just an observed conversion rate
    pub fn new(observed_cr: f64) -> Self {
        Self {
            index: None,
            observed_cr,
            qs: None,
            is: None,
            ds: None,
            questions: Vec::new(),
            question_texts: Vec::new(),
            boosts: None,
        }
    }

    /// Set the step index
    pub fn with_index(mut self, index: i64) -> Self {
        self.index = Some(index);
        self
    }

    /// Set declared complexity inputs
    pub fn with_complexity(mut self, qs: f64, is: f64, ds: f64) -> Self {
        self.qs = Some(qs);
        self.is = Some(is);
        self.ds = Some(ds);
        self
    }

    /// Add a question record
    pub fn with_question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self
    }

    /// Index used as the suggestion table key, `None` when negative.
    pub fn resolved_index(&self, position: usize) -> Option<usize> {
        match self.index {
            Some(index) => usize::try_from(index).ok(),
            None => Some(position),
        }
    }

    /// Whether any of Qs, Is or Ds was declared.
    pub fn has_declared_complexity(&self) -> bool {
        self.qs.is_some() || self.is.is_some() || self.ds.is_some()
    }

    /// Question texts for prompting, preferring `questionTexts`.
    pub fn question_labels(&self) -> Vec<String> {
        if !self.question_texts.is_empty() {
            return self.question_texts.clone();
        }
        self.questions
            .iter()
            .filter(|q| !q.text.is_empty())
            .map(|q| q.text.clone())
            .collect()
    }
}

/// A question within a step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "QuestionRepr")]
pub struct Question {
    #[serde(rename = "question")]
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invasiveness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<f64>,
}

impl Question {
    /// Create a question with text only
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            invasiveness: None,
            difficulty: None,
        }
    }

    /// Set invasiveness and difficulty
    pub fn with_attributes(mut self, invasiveness: f64, difficulty: f64) -> Self {
        self.invasiveness = Some(invasiveness);
        self.difficulty = Some(difficulty);
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionRepr {
    Text(String),
    Detailed {
        #[serde(default, alias = "text")]
        question: String,
        #[serde(default)]
        invasiveness: Option<f64>,
        #[serde(default)]
        difficulty: Option<f64>,
    },
}

impl From<QuestionRepr> for Question {
    fn from(repr: QuestionRepr) -> Self {
        match repr {
            QuestionRepr::Text(text) => Question::new(text),
            QuestionRepr::Detailed {
                question,
                invasiveness,
                difficulty,
            } => Question {
                text: question,
                invasiveness,
                difficulty,
            },
        }
    }
}

/// One framework's suggestion for one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkSuggestion {
    #[serde(default)]
    pub framework: String,
    #[serde(default)]
    pub suggestion: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    /// Percentage points; clamped downstream.
    #[serde(default)]
    pub estimated_uplift_pp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motivation_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_score: Option<f64>,
}

fn default_confidence() -> f64 {
    0.5
}

impl FrameworkSuggestion {
    /// Create a suggestion record
    pub fn new(
        framework: impl Into<String>,
        suggestion: impl Into<String>,
        reasoning: impl Into<String>,
        confidence: f64,
        estimated_uplift_pp: f64,
    ) -> Self {
        Self {
            framework: framework.into(),
            suggestion: suggestion.into(),
            reasoning: reasoning.into(),
            confidence,
            estimated_uplift_pp,
            motivation_score: None,
            trigger_score: None,
        }
    }

    /// Attach Fogg motivation and trigger scores
    pub fn with_fogg_scores(mut self, motivation: f64, trigger: f64) -> Self {
        self.motivation_score = Some(motivation);
        self.trigger_score = Some(trigger);
        self
    }
}

/// Per-step, per-framework suggestions keyed by step index then framework id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "TableEntries", into = "TableEntries")]
pub struct SuggestionTable {
    entries: TableEntries,
}

type TableEntries = BTreeMap<usize, BTreeMap<String, FrameworkSuggestion>>;

impl From<TableEntries> for SuggestionTable {
    /// Map keys are authoritative for the framework label.
    fn from(mut entries: TableEntries) -> Self {
        for (framework, suggestion) in entries.values_mut().flat_map(|step| step.iter_mut()) {
            if suggestion.framework != *framework {
                suggestion.framework = framework.clone();
            }
        }
        Self { entries }
    }
}

impl From<SuggestionTable> for TableEntries {
    fn from(table: SuggestionTable) -> Self {
        table.entries
    }
}

impl SuggestionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record under its own framework label, replacing any previous one.
    pub fn insert(&mut self, step_index: usize, suggestion: FrameworkSuggestion) {
        self.entries
            .entry(step_index)
            .or_default()
            .insert(suggestion.framework.clone(), suggestion);
    }

    /// Builder form of [`SuggestionTable::insert`]
    pub fn with(mut self, step_index: usize, suggestion: FrameworkSuggestion) -> Self {
        self.insert(step_index, suggestion);
        self
    }

    pub fn get(&self, step_index: usize, framework: &str) -> Option<&FrameworkSuggestion> {
        self.entries.get(&step_index)?.get(framework)
    }

    pub fn contains(&self, step_index: usize, framework: &str) -> bool {
        self.get(step_index, framework).is_some()
    }

    /// All records for a step, keyed by framework.
    pub fn step(&self, step_index: usize) -> Option<&BTreeMap<String, FrameworkSuggestion>> {
        self.entries.get(&step_index)
    }

    /// The Fogg record for a step stored under `label`.
    ///
    /// Any other spelling of "Fogg" is used only when `label` has no record.
    pub fn fogg(&self, step_index: usize, label: &str) -> Option<&FrameworkSuggestion> {
        let records = self.entries.get(&step_index)?;
        records.get(label).or_else(|| {
            records
                .iter()
                .find(|(framework, _)| is_fogg(framework))
                .map(|(_, suggestion)| suggestion)
        })
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything the engine needs for one evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunnelInput {
    pub steps: Vec<Step>,
    pub frameworks: Vec<String>,
    #[serde(default)]
    pub suggestions: SuggestionTable,
}

// ============================================================================
// Derived records
// ============================================================================

/// Projection of one step under a per-step uplift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepAssessment {
    #[serde(rename = "stepIndex")]
    pub step_index: usize,
    #[serde(rename = "base_CR")]
    pub base_cr: f64,
    /// Clamped decimal uplift.
    pub uplift: f64,
    #[serde(rename = "new_CR")]
    pub new_cr: f64,
    /// Running product up to and including this step.
    #[serde(rename = "cumulative_CR")]
    pub cumulative_cr: f64,
}

/// Fogg Behavior Model terms for one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoggMetrics {
    #[serde(rename = "stepIndex")]
    pub step_index: usize,
    pub motivation: f64,
    pub ability: f64,
    pub trigger: f64,
    pub fogg_score: f64,
    /// Step complexity (SC_s).
    pub complexity: f64,
}

/// Result of Fogg scoring and reordering for a whole funnel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoggAnalysis {
    pub metrics: Vec<FoggMetrics>,
    /// Step positions, highest Fogg score first.
    pub recommended_order: Vec<usize>,
    #[serde(rename = "reordered_CR")]
    pub reordered_cr: f64,
    pub uplift_pp: f64,
    #[serde(rename = "CR_total")]
    pub cr_total: f64,
}

/// Per-step suggestion carried by a variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSuggestion {
    #[serde(rename = "stepIndex")]
    pub step_index: usize,
    pub suggestion: String,
    pub reasoning: String,
    pub confidence: f64,
}

/// One candidate optimization scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub framework: String,
    /// Permutation of step positions.
    pub step_order: Vec<usize>,
    #[serde(rename = "CR_total")]
    pub cr_total: f64,
    pub uplift_pp: f64,
    pub suggestions: Vec<VariantSuggestion>,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fogg_metrics: Option<Vec<FoggMetrics>>,
}

/// Expected outcome of following one framework's recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecommendation {
    pub framework: String,
    #[serde(rename = "recommendedOrder")]
    pub recommended_order: Vec<usize>,
    #[serde(rename = "expected_CR_total")]
    pub expected_cr_total: f64,
    /// Mean clamped per-step uplift in percentage points.
    #[serde(rename = "expectedUplift")]
    pub expected_uplift: f64,
    pub reasoning: String,
}

/// Engine output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelReport {
    #[serde(rename = "baselineCR")]
    pub baseline_cr: f64,
    /// Projection with framework-averaged uplifts.
    #[serde(rename = "predicted_CR_total")]
    pub predicted_cr_total: f64,
    pub assessments: Vec<StepAssessment>,
    pub variants: Vec<Variant>,
    pub order_recommendations: Vec<OrderRecommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fogg: Option<FoggAnalysis>,
    /// The complete suggestion table the numbers were derived from.
    pub suggestions: SuggestionTable,
}
