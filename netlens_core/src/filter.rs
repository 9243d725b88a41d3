//! Filter rules and their evaluation
//!
//! A call stays visible when it satisfies every active include rule and no
//! active exclude rule. Inside one rule all defined criteria are ANDed;
//! undefined or empty criteria match everything.

use crate::call::CallRecord;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user-defined include/exclude predicate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRule {
    pub id: String,

    pub name: String,

    /// Single-method form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Method-set form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<String>>,

    /// Case-insensitive URL substring
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_errors: Option<bool>,

    /// Exact codes ("404") or class wildcards ("4XX")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_code_filter: Option<Vec<String>>,

    #[serde(default)]
    pub is_active: bool,

    #[serde(default)]
    pub is_exclude: bool,
}

impl FilterRule {
    /// An active include rule with no criteria
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            is_active: true,
            ..Default::default()
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods = Some(methods.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_url_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.url_pattern = Some(pattern.into());
        self
    }

    pub fn with_errors(mut self) -> Self {
        self.include_errors = Some(true);
        self
    }

    pub fn with_response_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.response_code_filter = Some(codes.into_iter().map(Into::into).collect());
        self
    }

    pub fn excluding(mut self) -> Self {
        self.is_exclude = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Split a multi-method draft into one single-method rule per method.
    ///
    /// Each rule is named `"<name> (<METHOD>)"`. An empty method list keeps
    /// the draft as one general rule.
    pub fn for_methods(draft: &FilterRule, methods: &[String]) -> Vec<FilterRule> {
        if methods.is_empty() {
            return vec![FilterRule {
                id: Uuid::new_v4().to_string(),
                method: None,
                methods: None,
                ..draft.clone()
            }];
        }

        methods
            .iter()
            .map(|method| FilterRule {
                id: Uuid::new_v4().to_string(),
                name: format!("{} ({})", draft.name, method),
                method: Some(method.clone()),
                methods: None,
                ..draft.clone()
            })
            .collect()
    }

    /// Whether the rule defines no criteria at all
    pub fn is_vacuous(&self) -> bool {
        non_empty(&self.method).is_none()
            && non_empty_list(&self.methods).is_none()
            && non_empty(&self.url_pattern).is_none()
            && self.include_errors != Some(true)
            && non_empty_list(&self.response_code_filter).is_none()
    }

    /// AND of every criterion this rule defines
    pub fn matches(&self, call: &CallRecord) -> bool {
        if let Some(method) = non_empty(&self.method) {
            if call.method != method {
                return false;
            }
        }

        if let Some(methods) = non_empty_list(&self.methods) {
            if !methods.iter().any(|m| *m == call.method) {
                return false;
            }
        }

        if let Some(pattern) = non_empty(&self.url_pattern) {
            if !call.url.to_lowercase().contains(&pattern.to_lowercase()) {
                return false;
            }
        }

        if self.include_errors == Some(true) && !call.is_error() {
            return false;
        }

        if let Some(codes) = non_empty_list(&self.response_code_filter) {
            if !matches_response_code(call.status, codes) {
                return false;
            }
        }

        true
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn non_empty_list(value: &Option<Vec<String>>) -> Option<&[String]> {
    value.as_deref().filter(|l| !l.is_empty())
}

/// Whether `status` matches any of the patterns.
///
/// A pattern ending in `XX` matches a three-digit status starting with the
/// pattern's first character; anything else must equal the status exactly.
pub fn matches_response_code<S: AsRef<str>>(status: u16, patterns: &[S]) -> bool {
    let status_str = status.to_string();

    patterns.iter().any(|pattern| {
        let pattern = pattern.as_ref();
        if pattern.ends_with("XX") {
            match pattern.chars().next() {
                Some(prefix) => status_str.len() == 3 && status_str.starts_with(prefix),
                None => false,
            }
        } else {
            status_str == pattern
        }
    })
}

/// Active rules split into include and exclude groups
#[derive(Debug, Clone)]
pub struct FilterPlan<'a> {
    include: Vec<&'a FilterRule>,
    exclude: Vec<&'a FilterRule>,
}

impl<'a> FilterPlan<'a> {
    pub fn new(rules: &'a [FilterRule]) -> Self {
        let (exclude, include) = rules
            .iter()
            .filter(|r| r.is_active)
            .partition(|r| r.is_exclude);
        Self { include, exclude }
    }

    pub fn include_rules(&self) -> &[&'a FilterRule] {
        &self.include
    }

    pub fn exclude_rules(&self) -> &[&'a FilterRule] {
        &self.exclude
    }

    /// Include stage (all include rules) then exclude stage (no exclude rule)
    pub fn admits(&self, call: &CallRecord) -> bool {
        self.include.iter().all(|rule| rule.matches(call))
            && !self.exclude.iter().any(|rule| rule.matches(call))
    }
}

/// The calls that survive the active rules, in their original order
pub fn evaluate(calls: &[CallRecord], rules: &[FilterRule]) -> Vec<CallRecord> {
    let plan = FilterPlan::new(rules);
    calls.iter().filter(|c| plan.admits(c)).cloned().collect()
}

/// Ordered collection of saved filter rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    rules: Vec<FilterRule>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: Vec<FilterRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Add a rule under a fresh id, active
    pub fn add(&mut self, rule: FilterRule) -> &FilterRule {
        let rule = FilterRule {
            id: Uuid::new_v4().to_string(),
            is_active: true,
            ..rule
        };
        tracing::debug!("Adding filter {} ({})", rule.name, rule.id);
        self.rules.push(rule);
        &self.rules[self.rules.len() - 1]
    }

    /// Patch a rule in place; returns false when the id is unknown
    pub fn update(&mut self, id: &str, patch: impl FnOnce(&mut FilterRule)) -> bool {
        match self.rules.iter_mut().find(|r| r.id == id) {
            Some(rule) => {
                patch(rule);
                rule.id = id.to_string();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<FilterRule> {
        let idx = self.rules.iter().position(|r| r.id == id)?;
        Some(self.rules.remove(idx))
    }

    /// Flip `is_active`; returns the new state
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let rule = self.rules.iter_mut().find(|r| r.id == id)?;
        rule.is_active = !rule.is_active;
        Some(rule.is_active)
    }

    /// Find by id or unique id prefix
    pub fn find(&self, id: &str) -> Option<&FilterRule> {
        self.rules
            .iter()
            .find(|r| r.id == id)
            .or_else(|| {
                let mut hits = self.rules.iter().filter(|r| r.id.starts_with(id));
                match (hits.next(), hits.next()) {
                    (Some(rule), None) => Some(rule),
                    _ => None,
                }
            })
    }

    pub fn clear(&mut self) {
        tracing::debug!("Clearing {} filters", self.rules.len());
        self.rules.clear();
    }

    pub fn plan(&self) -> FilterPlan<'_> {
        FilterPlan::new(&self.rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::fixtures::call;

    fn urls(calls: &[CallRecord]) -> Vec<&str> {
        calls.iter().map(|c| c.url.as_str()).collect()
    }

    fn sample_calls() -> Vec<CallRecord> {
        vec![
            call("1", "GET", "/api/users", 200),
            call("2", "POST", "/api/users", 201),
            call("3", "GET", "/api/orders", 404),
            call("4", "DELETE", "/API/orders/7", 500),
            call("5", "GET", "/static/app.js", 304),
        ]
    }

    #[test]
    fn test_response_code_wildcards() {
        assert!(matches_response_code(404, &["4XX"]));
        assert!(!matches_response_code(404, &["400"]));
        assert!(matches_response_code(200, &["2XX", "404"]));
        assert!(matches_response_code(404, &["2XX", "404"]));
        assert!(!matches_response_code(0, &["0XX"]));
        assert!(!matches_response_code(404, &["XX"]));
        assert!(!matches_response_code(404, &[] as &[&str]));
    }

    #[test]
    fn test_scenario_a_single_include_rule() {
        let calls = vec![call("a", "GET", "/a", 200), call("b", "GET", "/b", 404)];
        let rules = vec![FilterRule::new("client errors").with_response_codes(["4XX"])];

        assert_eq!(urls(&evaluate(&calls, &rules)), vec!["/b"]);
    }

    #[test]
    fn test_no_rules_keeps_everything() {
        let calls = sample_calls();
        assert_eq!(evaluate(&calls, &[]), calls);
    }

    #[test]
    fn test_vacuous_rule_matches_every_call() {
        let rule = FilterRule::new("anything");
        assert!(rule.is_vacuous());
        assert_eq!(evaluate(&sample_calls(), &[rule]).len(), 5);

        let empty_codes = FilterRule::new("empty").with_response_codes(Vec::<String>::new());
        assert!(empty_codes.is_vacuous());
        assert_eq!(evaluate(&sample_calls(), &[empty_codes]).len(), 5);
    }

    #[test]
    fn test_criteria_within_rule_are_anded() {
        let rule = FilterRule::new("get orders")
            .with_method("GET")
            .with_url_pattern("ORDERS");
        assert_eq!(urls(&evaluate(&sample_calls(), &[rule])), vec!["/api/orders"]);
    }

    #[test]
    fn test_include_rules_are_anded() {
        let rules = vec![
            FilterRule::new("gets").with_method("GET"),
            FilterRule::new("errors").with_errors(),
        ];
        assert_eq!(urls(&evaluate(&sample_calls(), &rules)), vec!["/api/orders"]);
    }

    #[test]
    fn test_exclude_dominates_include() {
        let rules = vec![
            FilterRule::new("api").with_url_pattern("/api"),
            FilterRule::new("no errors").with_errors().excluding(),
        ];
        assert_eq!(
            urls(&evaluate(&sample_calls(), &rules)),
            vec!["/api/users", "/api/users"]
        );
    }

    #[test]
    fn test_any_exclude_rule_drops_call() {
        let rules = vec![
            FilterRule::new("no posts").with_method("POST").excluding(),
            FilterRule::new("no static").with_url_pattern("static").excluding(),
        ];
        assert_eq!(
            urls(&evaluate(&sample_calls(), &rules)),
            vec!["/api/users", "/api/orders", "/API/orders/7"]
        );
    }

    #[test]
    fn test_inactive_rules_are_ignored() {
        let rules = vec![FilterRule::new("posts").with_method("POST").inactive()];
        assert_eq!(evaluate(&sample_calls(), &rules).len(), 5);
    }

    #[test]
    fn test_methods_set_form() {
        let rule = FilterRule::new("writes").with_methods(["POST", "DELETE"]);
        assert_eq!(
            urls(&evaluate(&sample_calls(), &[rule])),
            vec!["/api/users", "/API/orders/7"]
        );
    }

    #[test]
    fn test_method_match_is_exact() {
        let rule = FilterRule::new("lower").with_method("get");
        assert!(evaluate(&sample_calls(), &[rule]).is_empty());
    }

    #[test]
    fn test_error_criterion_uses_status_or_error_field() {
        let mut flagged = call("x", "GET", "/flagged", 200);
        flagged.error = Some("net::ERR_FAILED".to_string());
        let calls = vec![flagged, call("y", "GET", "/ok", 200)];

        let rules = vec![FilterRule::new("errors").with_errors()];
        assert_eq!(urls(&evaluate(&calls, &rules)), vec!["/flagged"]);
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let rules = vec![FilterRule::new("api").with_url_pattern("api")];
        let once = evaluate(&sample_calls(), &rules);
        let twice = evaluate(&once, &rules);
        assert_eq!(once, twice);
        assert_eq!(once, evaluate(&sample_calls(), &rules));
    }

    #[test]
    fn test_for_methods_splits_draft() {
        let draft = FilterRule::new("Orders").with_url_pattern("orders");
        let rules = FilterRule::for_methods(&draft, &["GET".to_string(), "POST".to_string()]);

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].name, "Orders (GET)");
        assert_eq!(rules[1].method.as_deref(), Some("POST"));
        assert_eq!(rules[1].url_pattern.as_deref(), Some("orders"));
        assert_ne!(rules[0].id, rules[1].id);
        assert_eq!(FilterRule::for_methods(&draft, &[]).len(), 1);
    }

    #[test]
    fn test_filter_set_lifecycle() {
        let mut set = FilterSet::new();
        let id = set.add(FilterRule::new("errors").with_errors().inactive()).id.clone();
        assert!(set.rules()[0].is_active);

        assert!(set.update(&id, |r| r.url_pattern = Some("api".to_string())));
        assert_eq!(set.rules()[0].url_pattern.as_deref(), Some("api"));
        assert!(!set.update("missing", |_| {}));

        assert_eq!(set.toggle(&id), Some(false));
        assert!(set.plan().include_rules().is_empty());

        assert_eq!(set.find(&id[..8]).map(|r| r.name.as_str()), Some("errors"));
        assert!(set.remove(&id).is_some());
        assert!(set.is_empty());
    }

    #[test]
    fn test_rule_json_shape() {
        let json = r#"{"id":"1","name":"legacy","method":"GET","isActive":true,"includeHeaders":false}"#;
        let rule: FilterRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.method.as_deref(), Some("GET"));
        assert!(rule.is_active);
        assert!(!rule.is_exclude);

        let out = serde_json::to_value(&rule).unwrap();
        assert_eq!(out["isExclude"], false);
        assert!(out.get("responseCodeFilter").is_none());
    }
}
