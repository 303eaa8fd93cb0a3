use crate::subject::Subject;
use crate::timetable::TimetableEntry;
use chrono::NaiveDate;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Subjects that share students: same department and same year. Built for
/// reporting only; the scheduler does not consult it.
pub struct ConflictGraph {
    pub graph: UnGraph<String, ()>,
    pub code_to_index: HashMap<String, NodeIndex>,
}

/// Two conflicting subjects scheduled on the same date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clash {
    pub date: NaiveDate,
    pub first: String,
    pub second: String,
}

impl ConflictGraph {
    pub fn build(subjects: &[Subject]) -> Self {
        let mut graph: UnGraph<String, ()> = UnGraph::new_undirected();
        let mut code_to_index: HashMap<String, NodeIndex> = HashMap::new();

        for subject in subjects {
            if !code_to_index.contains_key(&subject.code) {
                let ix = graph.add_node(subject.code.clone());
                code_to_index.insert(subject.code.clone(), ix);
            }
        }

        let mut cohorts: HashMap<(&str, u8), Vec<NodeIndex>> = HashMap::new();
        for subject in subjects {
            if let Some(&ix) = code_to_index.get(&subject.code) {
                let members = cohorts
                    .entry((subject.department.as_str(), subject.year))
                    .or_default();
                if !members.contains(&ix) {
                    members.push(ix);
                }
            }
        }

        for members in cohorts.values() {
            for (i, &u) in members.iter().enumerate() {
                for &v in &members[i + 1..] {
                    graph.update_edge(u, v, ());
                }
            }
        }

        Self {
            graph,
            code_to_index,
        }
    }

    pub fn subject_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn conflict_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn conflicts_with(&self, a: &str, b: &str) -> bool {
        match (self.code_to_index.get(a), self.code_to_index.get(b)) {
            (Some(&u), Some(&v)) => self.graph.find_edge(u, v).is_some(),
            _ => false,
        }
    }

    /// Codes of every subject sharing students with `code`, sorted.
    pub fn neighbours(&self, code: &str) -> Vec<String> {
        let Some(&ix) = self.code_to_index.get(code) else {
            return Vec::new();
        };
        let mut codes: Vec<String> = self
            .graph
            .neighbors(ix)
            .map(|n| self.graph[n].clone())
            .collect();
        codes.sort();
        codes
    }

    /// Conflicting pairs that landed on the same date, ordered by date then
    /// subject codes.
    pub fn clashes(&self, entries: &[TimetableEntry]) -> Vec<Clash> {
        let dates: HashMap<&str, NaiveDate> = entries
            .iter()
            .map(|e| (e.subject_code.as_str(), e.date))
            .collect();

        let mut clashes: Vec<Clash> = self
            .graph
            .edge_references()
            .filter_map(|edge| {
                let a = self.graph[edge.source()].as_str();
                let b = self.graph[edge.target()].as_str();
                let (da, db) = (dates.get(a)?, dates.get(b)?);
                if da != db {
                    return None;
                }
                let (first, second) = if a <= b { (a, b) } else { (b, a) };
                Some(Clash {
                    date: *da,
                    first: first.to_string(),
                    second: second.to_string(),
                })
            })
            .collect();
        clashes.sort_by(|x, y| {
            (x.date, &x.first, &x.second).cmp(&(y.date, &y.first, &y.second))
        });
        clashes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exam::Session;

    #[test]
    fn edges_join_same_department_and_year_only() {
        let subjects = vec![
            Subject::new("CS301", "Data Structures", "CSE", 2),
            Subject::new("CS302", "Computer Organization", "CSE", 2),
            Subject::new("CS401", "Compilers", "CSE", 3),
            Subject::new("EC201", "Signals", "ECE", 2),
        ];
        let graph = ConflictGraph::build(&subjects);
        assert_eq!(graph.subject_count(), 4);
        assert_eq!(graph.conflict_count(), 1);
        assert!(graph.conflicts_with("CS301", "CS302"));
        assert!(!graph.conflicts_with("CS301", "EC201"));
        assert!(!graph.conflicts_with("CS301", "CS401"));
        assert_eq!(graph.neighbours("CS302"), vec!["CS301".to_string()]);
    }

    #[test]
    fn same_day_sessions_of_one_department_are_reported() {
        let subjects = vec![
            Subject::new("CS301", "Data Structures", "CSE", 2),
            Subject::new("CS302", "Computer Organization", "CSE", 2),
        ];
        let date = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let entries: Vec<TimetableEntry> = [("CS301", Session::Fn), ("CS302", Session::An)]
            .into_iter()
            .map(|(code, session)| TimetableEntry {
                cycle_id: 1,
                subject_code: code.to_string(),
                subject_name: String::new(),
                department: "CSE".to_string(),
                date,
                session,
            })
            .collect();
        let clashes = ConflictGraph::build(&subjects).clashes(&entries);
        assert_eq!(
            clashes,
            vec![Clash {
                date,
                first: "CS301".to_string(),
                second: "CS302".to_string(),
            }]
        );
    }
}
