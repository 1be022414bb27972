//! Panel and aggregate logging through ordinary dispatch.
//!
//! A [`LogRequest`] names the variables and possessions to record, the
//! collection attributes whose length to record, and derived values. The
//! group forwards it as one of the reserved logging commands, and every
//! agent answers with a map of those attributes. Derived values are then
//! computed by the group from each agent's attributes. Panel logging keeps
//! one [`PanelRecord`] per agent; aggregate logging folds the numeric
//! values into an [`AggregateRecord`].

use std::fmt;

use indexmap::IndexMap;

use cohort_core::{Agent, AgentAddress, Params, RoundId, Value};

/// A value computed from an agent, typically from its attributes.
///
/// `None` means the agent cannot provide it, which fails the log call.
pub type Derived = fn(&dyn Agent) -> Option<Value>;

/// Attributes to record from each agent.
#[derive(Clone, Default)]
pub struct LogRequest {
    /// Names of agent variables.
    pub variables: Vec<String>,
    /// Names of agent possessions.
    pub possessions: Vec<String>,
    /// List or map attributes recorded by length, under `len_<name>`.
    pub lengths: Vec<String>,
    /// Values computed per agent, recorded under their name.
    pub derived: IndexMap<String, Derived>,
}

impl LogRequest {
    /// An empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add variable names.
    pub fn variables<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variables.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add possession names.
    pub fn possessions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.possessions.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add attribute names whose length to record.
    pub fn lengths<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lengths.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add a derived value under `name`.
    pub fn derived(mut self, name: impl Into<String>, derive: Derived) -> Self {
        self.derived.insert(name.into(), derive);
        self
    }

    /// Whether nothing is requested.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
            && self.possessions.is_empty()
            && self.lengths.is_empty()
            && self.derived.is_empty()
    }

    /// Command arguments: the variable, possession and length lists.
    pub(crate) fn to_args(&self) -> [Value; 3] {
        let list = |names: &[String]| {
            Value::List(names.iter().map(|n| Value::Text(n.clone())).collect())
        };
        [
            list(&self.variables),
            list(&self.possessions),
            list(&self.lengths),
        ]
    }
}

impl fmt::Debug for LogRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogRequest")
            .field("variables", &self.variables)
            .field("possessions", &self.possessions)
            .field("lengths", &self.lengths)
            .field("derived", &self.derived.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// One agent's answer to a panel log.
#[derive(Clone, Debug, PartialEq)]
pub struct PanelRecord {
    /// The agent that answered.
    pub address: AgentAddress,
    /// The last user command the group dispatched before logging.
    pub context: String,
    /// The round the group last advanced to.
    pub round: RoundId,
    /// Requested attributes, in request order.
    pub values: Params,
}

/// Running sum and count of one numeric attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aggregate {
    /// Sum of every numeric value seen.
    pub sum: f64,
    /// Number of numeric values seen.
    pub count: usize,
}

impl Aggregate {
    /// Arithmetic mean, or `None` when nothing was counted.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    fn add(&mut self, v: f64) {
        self.sum += v;
        self.count += 1;
    }
}

/// Group-wide fold of an aggregate log.
///
/// Only values with a numeric view (ints, floats, bools) contribute.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AggregateRecord {
    /// The last user command the group dispatched before logging.
    pub context: String,
    /// The round the group last advanced to.
    pub round: RoundId,
    /// Number of agents that answered.
    pub agents: usize,
    /// Per-attribute totals, in first-seen order.
    pub fields: IndexMap<String, Aggregate>,
}

impl AggregateRecord {
    pub(crate) fn new(context: String, round: RoundId) -> Self {
        Self {
            context,
            round,
            ..Self::default()
        }
    }

    /// Fold one agent's attribute map.
    pub(crate) fn absorb(&mut self, values: &Params) {
        self.agents += 1;
        for (name, value) in values {
            if let Some(v) = value.as_f64() {
                self.fields.entry(name.clone()).or_default().add(v);
            }
        }
    }

    /// Totals for one attribute.
    pub fn get(&self, name: &str) -> Option<&Aggregate> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builds_three_lists() {
        let req = LogRequest::new()
            .variables(["wealth"])
            .possessions(["money", "input"])
            .lengths(["orders"]);
        let [vars, poss, lens] = req.to_args();
        assert_eq!(vars.as_list().map(<[Value]>::len), Some(1));
        assert_eq!(poss.as_list().map(<[Value]>::len), Some(2));
        assert_eq!(lens.as_list().map(<[Value]>::len), Some(1));
    }

    #[test]
    fn derived_values_are_kept_by_name() {
        let req = LogRequest::new()
            .derived("net", |a| a.attribute("wealth"))
            .derived("unit", |_| Some(Value::Int(1)));
        assert!(!req.is_empty());
        assert_eq!(req.derived.keys().collect::<Vec<_>>(), ["net", "unit"]);
        assert!(req.to_args().iter().all(|l| l.as_list().is_some_and(<[Value]>::is_empty)));
    }

    #[test]
    fn aggregate_skips_non_numeric() {
        let mut record = AggregateRecord::new("produce".into(), RoundId(2));
        for w in [1.0, 3.0] {
            let mut values = Params::new();
            values.insert("wealth".into(), Value::Float(w));
            values.insert("name".into(), Value::Text("x".into()));
            record.absorb(&values);
        }
        let wealth = record.get("wealth").unwrap();
        assert_eq!(wealth.sum, 4.0);
        assert_eq!(wealth.mean(), Some(2.0));
        assert_eq!(record.agents, 2);
        assert!(record.get("name").is_none());
    }

    #[test]
    fn empty_aggregate_has_no_mean() {
        assert_eq!(Aggregate::default().mean(), None);
    }
}
