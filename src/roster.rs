use std::collections::HashSet;

const EXAMPLE_NAMES: [&str; 22] = [
    "Ava Chen",
    "Ben Ortiz",
    "Chloe Park",
    "Daniel Novak",
    "Ella Fischer",
    "Finn Walsh",
    "Grace Liu",
    "Henry Adams",
    "Isla Moreno",
    "Jack Turner",
    "Kira Singh",
    "Liam Brooks",
    "Mia Rossi",
    "Noah Kim",
    "Olivia Grant",
    "Peter Haas",
    "Quinn Murphy",
    "Ruby Patel",
    "Sam Lindqvist",
    "Tara Okafor",
    "Umar Farouk",
    "Vera Ivanova",
];

#[derive(Debug, Clone, Default)]
pub struct RosterStore {
    names: Vec<String>,
}

impl RosterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the roster wholesale. Names are trimmed and blanks dropped;
    /// with `dedupe` later repeats of a name are dropped.
    pub fn import_roster<I, S>(&mut self, names: I, dedupe: bool) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: HashSet<String> = HashSet::new();
        let mut out: Vec<String> = Vec::new();
        for raw in names {
            let name = raw.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            if dedupe && !seen.insert(name.to_string()) {
                continue;
            }
            out.push(name.to_string());
        }
        self.names = out;
        self.names.len()
    }

    pub fn list(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

pub fn example_roster() -> Vec<String> {
    EXAMPLE_NAMES.iter().map(|s| s.to_string()).collect()
}
