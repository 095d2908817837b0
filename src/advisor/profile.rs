//! Financial profile model.
//!
//! The shape is fixed: every leaf is always serialized, as `null` or `[]` when
//! nothing was learned. Deserialization fills missing keys, resets a
//! section that is not an object and wraps a scalar given for a list, so any
//! JSON object parsed into a `Profile` comes back out schema-complete. Scalar leaves stay loosely typed
//! because the model answers with numbers, ranges and prose interchangeably.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A nullable scalar leaf.
pub type Leaf = Option<Value>;

/// A nested section. Anything other than an object (`null`, a string, a
/// list) leaves the section at its default instead of failing the document.
fn section<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
        _ => T::default(),
    })
}

/// A list leaf. A lone scalar is kept as a one-element list.
fn list<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        scalar => vec![scalar],
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Profile {
    #[serde(deserialize_with = "section")]
    pub user_profile: UserProfile,
    #[serde(deserialize_with = "section")]
    pub financial_goals: FinancialGoals,
    #[serde(deserialize_with = "section")]
    pub risk_appetite: RiskAppetite,
    #[serde(deserialize_with = "section")]
    pub lifestyle_and_preferences: LifestyleAndPreferences,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(deserialize_with = "section")]
    pub demographics: Demographics,
    #[serde(deserialize_with = "section")]
    pub financial_snapshot: FinancialSnapshot,
    #[serde(deserialize_with = "section")]
    pub investment_profile: InvestmentProfile,
    #[serde(deserialize_with = "section")]
    pub behavioral_traits: BehavioralTraits,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Demographics {
    pub current_age: Leaf,
    pub target_retirement_age: Leaf,
    pub marital_status: Leaf,
    pub dependents: Leaf,
    pub location: Leaf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinancialSnapshot {
    pub monthly_income: Leaf,
    pub monthly_expenses: Leaf,
    pub current_savings_rate: Leaf,
    pub expected_income_growth_rate: Leaf,
    pub job_stability: Leaf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InvestmentProfile {
    pub risk_tolerance: Leaf,
    pub investment_experience: Leaf,
    pub investment_knowledge: Leaf,
    #[serde(deserialize_with = "list")]
    pub preferred_investment_types: Vec<Value>,
    pub investment_time_horizon: Leaf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BehavioralTraits {
    pub savings_discipline: Leaf,
    pub spending_pattern: Leaf,
    pub financial_goal_clarity: Leaf,
    pub money_motivation: Leaf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinancialGoals {
    #[serde(deserialize_with = "list")]
    pub short_term: Vec<Value>,
    #[serde(deserialize_with = "list")]
    pub medium_term: Vec<Value>,
    #[serde(deserialize_with = "list")]
    pub long_term: Vec<Value>,
}

impl FinancialGoals {
    pub fn is_empty(&self) -> bool {
        self.short_term.is_empty() && self.medium_term.is_empty() && self.long_term.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskAppetite {
    #[serde(deserialize_with = "section")]
    pub risk_appetite_indicators: RiskAppetiteIndicators,
    #[serde(deserialize_with = "section")]
    pub market_behavior_patterns: MarketBehaviorPatterns,
    #[serde(deserialize_with = "section")]
    pub financial_psychology: FinancialPsychology,
    #[serde(deserialize_with = "section")]
    pub experience_and_knowledge: ExperienceAndKnowledge,
    #[serde(deserialize_with = "section")]
    pub behavioral_traits: RiskBehavioralTraits,
    #[serde(deserialize_with = "section")]
    pub life_context: LifeContext,
    #[serde(deserialize_with = "section")]
    pub stress_responses: StressResponses,
    #[serde(deserialize_with = "section")]
    pub confidence_and_biases: ConfidenceAndBiases,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskAppetiteIndicators {
    pub risk_tolerance_score: Leaf,
    pub risk_capacity_score: Leaf,
    pub loss_tolerance_percentage: Leaf,
    pub recovery_time_comfort: Leaf,
    pub volatility_comfort: Leaf,
    pub sleep_at_night_threshold: Leaf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketBehaviorPatterns {
    pub bear_market_response: Leaf,
    pub bull_market_response: Leaf,
    pub market_crash_history: Leaf,
    pub fomo_susceptibility: Leaf,
    pub panic_selling_tendency: Leaf,
    pub market_timing_attempts: Leaf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialPsychology {
    pub money_relationship: Leaf,
    pub biggest_financial_fear: Leaf,
    pub motivating_financial_goal: Leaf,
    pub decision_making_under_pressure: Leaf,
    pub regret_aversion: Leaf,
    pub optimism_bias: Leaf,
    pub anchoring_tendency: Leaf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceAndKnowledge {
    pub years_investing: Leaf,
    pub investment_knowledge_level: Leaf,
    pub past_major_losses: Leaf,
    pub recovery_from_losses: Leaf,
    pub learning_from_mistakes: Leaf,
    pub financial_education: Leaf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskBehavioralTraits {
    pub planning_horizon: Leaf,
    pub research_depth: Leaf,
    pub herd_mentality: Leaf,
    pub patience_level: Leaf,
    pub discipline_score: Leaf,
    pub emotional_control: Leaf,
    pub diversification_understanding: Leaf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifeContext {
    pub age: Leaf,
    pub income_stability: Leaf,
    pub dependents: Leaf,
    pub major_expenses_timeline: Leaf,
    pub career_stage: Leaf,
    pub health_status: Leaf,
    pub insurance_coverage: Leaf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressResponses {
    pub portfolio_down_10_percent: Leaf,
    pub portfolio_down_20_percent: Leaf,
    pub portfolio_down_30_percent: Leaf,
    pub unexpected_expense: Leaf,
    pub job_loss_scenario: Leaf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceAndBiases {
    pub investment_confidence: Leaf,
    pub overconfidence_signs: Leaf,
    pub analysis_paralysis: Leaf,
    pub confirmation_bias: Leaf,
    pub recency_bias: Leaf,
    pub home_bias: Leaf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LifestyleAndPreferences {
    #[serde(deserialize_with = "section")]
    pub current_lifestyle: CurrentLifestyle,
    #[serde(deserialize_with = "section")]
    pub future_aspirations: FutureAspirations,
    #[serde(deserialize_with = "section")]
    pub financial_philosophy: FinancialPhilosophy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CurrentLifestyle {
    pub housing_type: Leaf,
    pub transportation_mode: Leaf,
    pub social_spending: Leaf,
    pub travel_frequency: Leaf,
    #[serde(deserialize_with = "list")]
    pub hobbies_and_interests: Vec<Value>,
    pub health_and_fitness: Leaf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FutureAspirations {
    pub desired_lifestyle: Leaf,
    pub work_life_balance: Leaf,
    pub geographic_preferences: Leaf,
    pub career_ambitions: Leaf,
    pub family_plans: Leaf,
    pub retirement_vision: Leaf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinancialPhilosophy {
    pub relationship_with_money: Leaf,
    pub spending_vs_saving: Leaf,
    pub risk_comfort: Leaf,
    pub wealth_definition: Leaf,
}

impl Profile {
    /// The all-null schema, pretty-printed, as embedded in the extraction prompt.
    pub fn schema_json() -> String {
        serde_json::to_string_pretty(&Profile::default()).unwrap_or_default()
    }

    /// At least an income or expense figure, or one goal.
    pub fn has_minimum_info(&self) -> bool {
        let snapshot = &self.user_profile.financial_snapshot;
        snapshot.monthly_income.is_some()
            || snapshot.monthly_expenses.is_some()
            || !self.financial_goals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Collect every key path of a JSON value.
    fn key_paths(value: &Value, prefix: &str, out: &mut Vec<String>) {
        if let Value::Object(map) = value {
            for (key, child) in map {
                let path = format!("{prefix}/{key}");
                out.push(path.clone());
                key_paths(child, &path, out);
            }
        }
    }

    fn schema_paths() -> Vec<String> {
        let mut paths = Vec::new();
        key_paths(&serde_json::to_value(Profile::default()).unwrap(), "", &mut paths);
        paths.sort();
        paths
    }

    #[test]
    fn default_serializes_every_leaf() {
        let value = serde_json::to_value(Profile::default()).unwrap();
        assert!(value["userProfile"]["demographics"]["currentAge"].is_null());
        assert_eq!(value["userProfile"]["investmentProfile"]["preferredInvestmentTypes"], json!([]));
        assert_eq!(value["financialGoals"]["longTerm"], json!([]));
        assert!(value["riskAppetite"]["risk_appetite_indicators"]["sleep_at_night_threshold"].is_null());
        assert!(value["riskAppetite"]["stress_responses"]["portfolio_down_30_percent"].is_null());
        assert!(value["lifestyleAndPreferences"]["financialPhilosophy"]["wealthDefinition"].is_null());
        assert_eq!(schema_paths().len(), 107);
    }

    #[test]
    fn partial_object_comes_back_complete() {
        let partial = json!({
            "userProfile": { "demographics": { "currentAge": 34, "location": "Lisbon" } },
            "financialGoals": { "shortTerm": [{ "goal": "emergency fund", "amount": 10000 }] }
        });
        let profile: Profile = serde_json::from_value(partial).unwrap();
        assert_eq!(profile.user_profile.demographics.current_age, Some(json!(34)));
        assert_eq!(profile.financial_goals.short_term.len(), 1);

        let mut paths = Vec::new();
        key_paths(&serde_json::to_value(&profile).unwrap(), "", &mut paths);
        paths.sort();
        assert_eq!(paths, schema_paths());
    }

    #[test]
    fn null_sections_and_lists_are_tolerated() {
        let reply = json!({
            "userProfile": null,
            "financialGoals": { "shortTerm": null, "longTerm": ["retire at 55"] },
            "riskAppetite": { "life_context": null }
        });
        let profile: Profile = serde_json::from_value(reply).unwrap();
        assert_eq!(profile.user_profile, UserProfile::default());
        assert!(profile.financial_goals.short_term.is_empty());
        assert_eq!(profile.financial_goals.long_term, vec![json!("retire at 55")]);
    }

    #[test]
    fn malformed_section_does_not_wipe_siblings() {
        let reply = json!({
            "userProfile": {
                "demographics": "thirty-something",
                "financialSnapshot": { "monthlyIncome": 5000 },
                "behavioralTraits": ["frugal"]
            },
            "financialGoals": { "shortTerm": ["car"] }
        });
        let profile: Profile = serde_json::from_value(reply).unwrap();
        assert_eq!(profile.user_profile.demographics, Demographics::default());
        assert_eq!(profile.user_profile.behavioral_traits, BehavioralTraits::default());
        assert_eq!(
            profile.user_profile.financial_snapshot.monthly_income,
            Some(json!(5000))
        );
        assert_eq!(profile.financial_goals.short_term, vec![json!("car")]);
    }

    #[test]
    fn scalar_in_list_position_is_wrapped() {
        let reply = json!({
            "userProfile": { "investmentProfile": { "preferredInvestmentTypes": "index funds" } },
            "financialGoals": { "longTerm": 42 }
        });
        let profile: Profile = serde_json::from_value(reply).unwrap();
        assert_eq!(
            profile.user_profile.investment_profile.preferred_investment_types,
            vec![json!("index funds")]
        );
        assert_eq!(profile.financial_goals.long_term, vec![json!(42)]);
    }

    #[test]
    fn unknown_keys_are_dropped() {
        let reply = json!({ "notes": "extra", "userProfile": { "demographics": { "shoeSize": 44 } } });
        let profile: Profile = serde_json::from_value(reply).unwrap();
        let value = serde_json::to_value(&profile).unwrap();
        assert!(value.get("notes").is_none());
        assert!(value["userProfile"]["demographics"].get("shoeSize").is_none());
    }

    #[test]
    fn schema_json_is_pretty_and_complete() {
        let schema = Profile::schema_json();
        assert!(schema.contains("\"monthlyIncome\": null"));
        assert!(schema.contains("\"hobbiesAndInterests\": []"));
        assert!(schema.contains('\n'));
    }

    #[test]
    fn minimum_info() {
        assert!(!Profile::default().has_minimum_info());

        let mut with_income = Profile::default();
        with_income.user_profile.financial_snapshot.monthly_income = Some(json!(5200));
        assert!(with_income.has_minimum_info());

        let mut with_goal = Profile::default();
        with_goal.financial_goals.medium_term.push(json!("buy a flat"));
        assert!(with_goal.has_minimum_info());
    }
}
