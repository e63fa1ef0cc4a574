//! Response envelope schema per API resource
//!
//! Every response is wrapped in `MRData`, which holds a named table object
//! (`RaceTable`, `StandingsTable`, ...) containing a named list. Race-level
//! resources nest one more list inside each race (`Races[i].Results`), and lap
//! timings nest once more (`Laps[i].Timings`).

use serde_json::{Map, Value};

/// Key of the outer wrapper object in every response
pub const ROOT_KEY: &str = "MRData";

/// Key holding the total number of entries available for the query
pub const TOTAL_KEY: &str = "total";

/// Envelope lookup errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    /// A key on the path is absent
    #[error("missing key '{key}' at {path}")]
    Missing {
        /// The key that was not found
        key: &'static str,
        /// Path walked so far
        path: String,
    },

    /// A key is present but holds the wrong JSON type
    #[error("expected {expected} at {path}")]
    Shape {
        /// Path of the offending value
        path: String,
        /// Expected JSON type
        expected: &'static str,
    },
}

/// Explodes a child list into one entry per child, carrying a parent field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Explode {
    /// Child list key (e.g. "Timings")
    pub list: &'static str,
    /// Parent field copied onto every child (e.g. "number")
    pub parent_field: &'static str,
    /// Column name for the copied field (e.g. "lap")
    pub as_column: &'static str,
}

/// Where the entries of a resource live inside a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    /// Table object key under `MRData`
    pub table: &'static str,
    /// List key inside the table
    pub list: &'static str,
    /// Per-item nested list key (e.g. "Results" inside each race)
    pub nested: Option<&'static str>,
    /// Optional explode step applied to each nested item
    pub explode: Option<Explode>,
}

/// API resources with a known envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// `/seasons.json`
    Seasons,
    /// `/drivers.json`
    Drivers,
    /// `/constructors.json`
    Constructors,
    /// `/circuits.json`
    Circuits,
    /// `/{year}.json` race calendar
    Schedule,
    /// `/{year}/{round}/results.json`
    Results,
    /// `/{year}/{round}/qualifying.json`
    Qualifying,
    /// `/{year}/{round}/sprint.json`
    Sprint,
    /// `/{year}/{round}/pitstops.json`
    PitStops,
    /// `/{year}/{round}/laps.json`
    Laps,
    /// `/{year}/{round}/driverStandings.json`
    DriverStandings,
    /// `/{year}/{round}/constructorStandings.json`
    ConstructorStandings,
}

impl Resource {
    /// Envelope for this resource
    pub fn envelope(&self) -> Envelope {
        let plain = |table, list| Envelope {
            table,
            list,
            nested: None,
            explode: None,
        };
        let per_race = |nested| Envelope {
            table: "RaceTable",
            list: "Races",
            nested: Some(nested),
            explode: None,
        };
        let standings = |nested| Envelope {
            table: "StandingsTable",
            list: "StandingsLists",
            nested: Some(nested),
            explode: None,
        };

        match self {
            Resource::Seasons => plain("SeasonTable", "Seasons"),
            Resource::Drivers => plain("DriverTable", "Drivers"),
            Resource::Constructors => plain("ConstructorTable", "Constructors"),
            Resource::Circuits => plain("CircuitTable", "Circuits"),
            Resource::Schedule => plain("RaceTable", "Races"),
            Resource::Results => per_race("Results"),
            Resource::Qualifying => per_race("QualifyingResults"),
            Resource::Sprint => per_race("SprintResults"),
            Resource::PitStops => per_race("PitStops"),
            Resource::Laps => Envelope {
                explode: Some(Explode {
                    list: "Timings",
                    parent_field: "number",
                    as_column: "lap",
                }),
                ..per_race("Laps")
            },
            Resource::DriverStandings => standings("DriverStandings"),
            Resource::ConstructorStandings => standings("ConstructorStandings"),
        }
    }

    /// Key path from `MRData` down to the entry list, for display
    pub fn key_path(&self) -> Vec<&'static str> {
        let envelope = self.envelope();
        let mut path = vec![ROOT_KEY, envelope.table, envelope.list];
        path.extend(envelope.nested);
        path.extend(envelope.explode.map(|explode| explode.list));
        path
    }
}

impl Envelope {
    /// Extract the entries of one page.
    ///
    /// A missing table or list is an error; a parent item lacking its nested
    /// list contributes no entries.
    pub fn entries(&self, page: &Value) -> Result<Vec<Value>, EnvelopeError> {
        let root = lookup(page, ROOT_KEY, "$")?;
        let table = lookup(root, self.table, ROOT_KEY)?;
        let table_path = format!("{ROOT_KEY}.{}", self.table);
        let list = lookup(table, self.list, &table_path)?;
        let list_path = format!("{table_path}.{}", self.list);
        let items = as_array(list, &list_path)?;

        let Some(nested) = self.nested else {
            return Ok(items.to_vec());
        };

        let mut entries = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let Some(children) = item.get(nested) else {
                continue;
            };
            let children_path = format!("{list_path}[{index}].{nested}");
            let children = as_array(children, &children_path)?;
            match self.explode {
                Some(explode) => {
                    for child in children {
                        entries.extend(explode.apply(child));
                    }
                }
                None => entries.extend(children.iter().cloned()),
            }
        }
        Ok(entries)
    }

    /// Total number of entries the API reports for the query, if present
    pub fn total(page: &Value) -> Option<u64> {
        match page.get(ROOT_KEY)?.get(TOTAL_KEY)? {
            Value::String(s) => s.trim().parse().ok(),
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }
}

impl Explode {
    fn apply(&self, parent: &Value) -> Vec<Value> {
        let carried = parent.get(self.parent_field).cloned().unwrap_or(Value::Null);
        let Some(Value::Array(children)) = parent.get(self.list) else {
            return Vec::new();
        };

        children
            .iter()
            .map(|child| {
                let mut entry = Map::new();
                entry.insert(self.as_column.to_string(), carried.clone());
                match child {
                    Value::Object(fields) => {
                        for (key, value) in fields {
                            entry.insert(key.clone(), value.clone());
                        }
                    }
                    other => {
                        entry.insert("value".to_string(), other.clone());
                    }
                }
                Value::Object(entry)
            })
            .collect()
    }
}

fn lookup<'a>(value: &'a Value, key: &'static str, path: &str) -> Result<&'a Value, EnvelopeError> {
    value.get(key).ok_or_else(|| EnvelopeError::Missing {
        key,
        path: path.to_string(),
    })
}

fn as_array<'a>(value: &'a Value, path: &str) -> Result<&'a [Value], EnvelopeError> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| EnvelopeError::Shape {
            path: path.to_string(),
            expected: "array",
        })
}
