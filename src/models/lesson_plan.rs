use serde::{Deserialize, Serialize};

/// Typed view over a recovered lesson-plan object.
///
/// Models drift between field names across generations (`title` vs `week`,
/// `weekOverview` vs `overallLearningObjective`), so every field is optional and
/// the known aliases are accepted. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPlan {
    #[serde(default, alias = "week")]
    pub title: Option<String>,
    #[serde(default)]
    pub grade_level: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default, alias = "overallLearningObjective")]
    pub week_overview: Option<String>,
    #[serde(default)]
    pub week_objectives: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub daily_plan: Vec<DailyPlan>,
    #[serde(default)]
    pub assessment: Option<WeeklyAssessment>,
}

/// The week's assessment arrives either as prose or split into formative
/// checks and a summative task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeeklyAssessment {
    Text(String),
    Breakdown {
        #[serde(default)]
        formative: Vec<String>,
        #[serde(default)]
        summative: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPlan {
    #[serde(default)]
    pub day: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub learning_objectives: Vec<String>,
    #[serde(default, skip_serializing)]
    pub learning_objective: Option<String>,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub assessment: Option<String>,
    #[serde(default)]
    pub differentiation: Option<Differentiation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Differentiation {
    #[serde(default)]
    pub support: Option<String>,
    #[serde(default)]
    pub challenge: Option<String>,
}

impl LessonPlan {
    /// Reads a plan out of already-validated JSON. Returns `None` when the
    /// payload is not an object of a recognizable shape. A day's singular
    /// `learningObjective` is folded into `learningObjectives`.
    pub fn from_json(json: &str) -> Option<Self> {
        match serde_json::from_str::<LessonPlan>(json) {
            Ok(mut plan) => {
                for day in &mut plan.daily_plan {
                    if day.learning_objectives.is_empty() {
                        if let Some(objective) = day.learning_objective.take() {
                            day.learning_objectives.push(objective);
                        }
                    }
                }
                Some(plan)
            }
            Err(e) => {
                tracing::debug!(error = %e, "Recovered JSON does not match lesson plan shape");
                None
            }
        }
    }

    /// True when nothing a renderer could show was recovered.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.grade_level.is_none()
            && self.subject.is_none()
            && self.week_overview.is_none()
            && self.week_objectives.is_empty()
            && self.materials.is_empty()
            && self.daily_plan.is_empty()
            && self.assessment.is_none()
    }
}
