use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::collections::{HashMap, HashSet};

/// Activity in a directly-follows graph.
pub type Activity = String;

/// A directly-follows graph of [`Activity`]s.
///
/// Graph containing a set of activities, a set of directly-follows relations, and the
/// activities cases start and end with.
/// Activities, directly-follows relations, start and end activities are all annotated
/// with their frequency.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DirectlyFollowsGraph {
    /// Activities with their number of occurrences
    pub activities: HashMap<Activity, u64>,
    /// Directly-follows relations with their number of occurrences
    #[serde_as(as = "Vec<(_, _)>")]
    pub directly_follows_relations: HashMap<(Activity, Activity), u64>,
    /// Start activities with the number of cases starting with them
    pub start_activities: HashMap<Activity, u64>,
    /// End activities with the number of cases ending with them
    pub end_activities: HashMap<Activity, u64>,
}

impl DirectlyFollowsGraph {
    /// Create new [`DirectlyFollowsGraph`] with no activities and directly-follows relations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Add an activity with a frequency.
    ///
    /// If the activity already exists, the frequency count is added to the existing activity.
    pub fn add_activity(&mut self, activity: Activity, frequency: u64) {
        *self.activities.entry(activity).or_default() += frequency;
    }

    /// Count `frequency` cases starting with `activity`.
    pub fn add_start_activity(&mut self, activity: Activity, frequency: u64) {
        *self.start_activities.entry(activity).or_default() += frequency;
    }

    /// Count `frequency` cases ending with `activity`.
    pub fn add_end_activity(&mut self, activity: Activity, frequency: u64) {
        *self.end_activities.entry(activity).or_default() += frequency;
    }

    /// Add a directly-follows relation with a frequency.
    ///
    /// If the directly-follows relation already exists, the frequency count is added to the
    /// existing directly-follows relation.
    pub fn add_df_relation(&mut self, from: Activity, to: Activity, frequency: u64) {
        *self
            .directly_follows_relations
            .entry((from, to))
            .or_default() += frequency;
    }

    /// Checks if an activity is already contained in the directly-follows graph.
    pub fn contains_activity<S: AsRef<str>>(&self, activity: S) -> bool {
        self.activities.contains_key(activity.as_ref())
    }

    /// Checks if an activity is a start activity in the directly-follows graph.
    pub fn is_start_activity<S: AsRef<str>>(&self, activity: S) -> bool {
        self.start_activities.contains_key(activity.as_ref())
    }

    /// Checks if an activity is an end activity in the directly-follows graph.
    pub fn is_end_activity<S: AsRef<str>>(&self, activity: S) -> bool {
        self.end_activities.contains_key(activity.as_ref())
    }

    /// Number of occurrences of an activity (`0` if absent).
    pub fn activity_frequency<S: AsRef<str>>(&self, activity: S) -> u64 {
        self.activities
            .get(activity.as_ref())
            .copied()
            .unwrap_or_default()
    }

    /// Number of occurrences of a directly-follows relation (`0` if absent).
    pub fn df_frequency<S: AsRef<str>>(&self, from: S, to: S) -> u64 {
        self.directly_follows_relations
            .get(&(from.as_ref().to_string(), to.as_ref().to_string()))
            .copied()
            .unwrap_or_default()
    }

    /// The activity most cases start with.
    ///
    /// Ties are broken by activity name (lexicographically smallest wins).
    /// Returns `None` for an empty graph.
    pub fn most_frequent_start_activity(&self) -> Option<&str> {
        self.start_activities
            .iter()
            .max_by(|(a_act, a_freq), (b_act, b_freq)| {
                a_freq.cmp(b_freq).then_with(|| b_act.cmp(a_act))
            })
            .map(|(act, _)| act.as_str())
    }

    /// Removes an activity (and all relations involving it) from the directly-follows graph.
    pub fn remove_activity<S: AsRef<str>>(&mut self, activity: S) {
        let is_present = self.activities.remove(activity.as_ref()).is_some();

        if is_present {
            self.start_activities.remove(activity.as_ref());
            self.end_activities.remove(activity.as_ref());

            self.directly_follows_relations
                .retain(|(from, to), _| from != activity.as_ref() && to != activity.as_ref());
        }
    }

    /// Checks if a directly-follows relation is already contained in the directly-follows graph.
    pub fn contains_df_relation<S: AsRef<str>>(&self, (a, b): (S, S)) -> bool {
        self.directly_follows_relations
            .contains_key(&(a.as_ref().to_string(), b.as_ref().to_string()))
    }

    /// Returns the ingoing activities of an activity in the directly-follows graph.
    pub fn ingoing_activities<S: AsRef<str>>(&self, activity: S) -> HashSet<&str> {
        self.directly_follows_relations
            .keys()
            .filter_map(|(x, y)| (y == activity.as_ref()).then_some(x.as_str()))
            .collect()
    }

    /// Returns the outgoing activities of an activity in the directly-follows graph.
    pub fn outgoing_activities<S: AsRef<str>>(&self, activity: S) -> HashSet<&str> {
        self.directly_follows_relations
            .keys()
            .filter_map(|(x, y)| (x == activity.as_ref()).then_some(y.as_str()))
            .collect()
    }
}
